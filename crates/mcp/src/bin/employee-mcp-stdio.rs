// Standalone MCP server binary speaking JSON-RPC over stdin/stdout

use anyhow::Result;
use employee_mcp_core::Directory;
use employee_mcp_protocol::server::{serve_stdio, McpHandler};
use employee_mcp_protocol::tools::directory_registry;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol messages, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "employee_mcp=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Employee MCP stdio server starting...");

    let registry = directory_registry(Arc::new(Directory::fixture()));
    for tool in registry.list_schemas() {
        tracing::info!(tool = %tool.name, "Registered tool");
    }

    serve_stdio(McpHandler::new(Arc::new(registry))).await
}
