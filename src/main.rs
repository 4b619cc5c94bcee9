use facet_mcp::config::Config;
use facet_mcp::server::FacetServer;
use rmcp::{ServiceExt, transport::stdio};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the MCP protocol
    facet_mcp::tracing::init();

    let config = Config::load()?;
    tracing::info!(
        "Starting facet-mcp MCP server (collection: {})",
        config.search.collection
    );

    let server = FacetServer::new(config);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}
