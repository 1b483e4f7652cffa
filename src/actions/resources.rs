use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::operator::Operator;
use crate::provider::CapabilityProvider;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Every `{name}` occurrence in `uri`, left to right, as `(literal, name)`.
/// Repeated names are listed once per occurrence.
pub fn placeholders(uri: &str) -> Vec<(String, String)> {
    PLACEHOLDER
        .captures_iter(uri)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
        .collect()
}

/// Ask for a value for every placeholder occurrence and substitute it into
/// the first remaining occurrence of the same literal.
pub async fn resolve_uri(operator: &dyn Operator, uri: &str) -> Result<String> {
    let mut resolved = uri.to_string();
    for (literal, name) in placeholders(uri) {
        let value = operator.input(&format!("Enter value for {}:", name)).await?;
        resolved = resolved.replacen(&literal, &value, 1);
    }
    Ok(resolved)
}

/// Read a resource (resolving template placeholders first) and print its
/// first content entry as indented JSON.
pub async fn read_resource(
    provider: &dyn CapabilityProvider,
    operator: &dyn Operator,
    uri: &str,
) -> Result<()> {
    let uri = resolve_uri(operator, uri).await?;
    let contents = provider.read_resource(&uri).await?;

    let text = contents
        .first()
        .and_then(|c| c.text.as_deref())
        .ok_or(ClientError::MissingText("resource contents"))?;
    let value: Value = serde_json::from_str(text).map_err(ClientError::InvalidJson)?;
    let pretty = serde_json::to_string_pretty(&value).map_err(ClientError::InvalidJson)?;

    operator.show(&pretty);
    Ok(())
}
