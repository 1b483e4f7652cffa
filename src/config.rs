use crate::generation::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_SERVER_COMMAND: &str = "rmcp-weather";

/// Console settings, read from the environment (and an optional `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Program spawned as the capability provider.
    pub server_command: String,
    pub server_args: Vec<String>,
    /// Not checked here; generation fails on first use without it.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            server_command: non_empty("MCP_SERVER_COMMAND")
                .unwrap_or_else(|| DEFAULT_SERVER_COMMAND.to_string()),
            server_args: non_empty("MCP_SERVER_ARGS")
                .map(|args| args.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.server_command, "rmcp-weather");
        assert!(config.server_args.is_empty());
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
    }

    #[test]
    fn reads_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MCP_SERVER_COMMAND", "node"),
            ("MCP_SERVER_ARGS", "build/server.js  --verbose"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", ""),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server_command, "node");
        assert_eq!(config.server_args, vec!["build/server.js", "--verbose"]);
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
    }
}
