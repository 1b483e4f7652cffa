//! rmcp-weather: MCP server for US weather alerts and forecasts
//!
//! Run with: `rmcp-weather` (serves on stdio). Set `NWS_API_BASE` to use a
//! different endpoint.

use rmcp::ServiceExt;
use rmcp_weather::{WeatherServer, NWS_API_BASE};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (to stderr so it doesn't interfere with stdio transport)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let base_url = std::env::var("NWS_API_BASE").unwrap_or_else(|_| NWS_API_BASE.to_string());
    tracing::info!(%base_url, "Starting rmcp-weather server");

    let server = WeatherServer::with_base_url(base_url);
    let service = server.serve(rmcp::transport::stdio()).await?;

    // Wait for shutdown
    service.waiting().await?;

    tracing::info!("rmcp-weather server stopped");
    Ok(())
}
