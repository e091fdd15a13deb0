use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod middleware;

use config::{ConfigOverrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "employee-mcp")]
#[command(about = "Employee directory MCP server with OAuth bearer token validation", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "employee-mcp.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "employee_mcp=info,tower_http=info".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Employee Directory MCP server");

    // Load configuration
    let mut config = ServerConfig::load(&args.config)?;
    config.apply(args.overrides);

    let addr = config.bind_address();
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, config).await?;

    Ok(())
}
