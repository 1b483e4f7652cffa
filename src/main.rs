//! mcp-console - interactive MCP client
//!
//! Spawns the configured MCP server (default: `rmcp-weather`) and presents a
//! menu on stdin/stdout. Exit with Ctrl-D or Ctrl-C.

use std::sync::Arc;

use mcp_console::{
    CapabilityProvider, Config, ConsoleClient, GeminiGenerator, Generator, McpProvider, Operator,
    Session, TerminalOperator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the menu
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::info!(command = %config.server_command, "starting mcp-console");

    let operator: Arc<dyn Operator> = Arc::new(TerminalOperator::new());
    let generator: Arc<dyn Generator> = Arc::new(
        GeminiGenerator::new(config.gemini_api_key.clone())
            .with_base_url(&config.gemini_base_url)
            .with_model(&config.gemini_model),
    );

    let client = ConsoleClient::new(operator.clone(), generator.clone());
    let provider = Arc::new(
        McpProvider::spawn(&config.server_command, &config.server_args, client).await?,
    );

    let session = Session::start(
        provider.clone() as Arc<dyn CapabilityProvider>,
        operator,
        generator,
    )
    .await?;
    session.run().await?;
    drop(session);

    if let Ok(provider) = Arc::try_unwrap(provider) {
        provider.shutdown().await?;
    }

    tracing::info!("mcp-console stopped");
    Ok(())
}
