mod adapter;
mod agent;
mod cli;
mod config;
mod error;
mod llm;
mod lore;
mod mcp;
mod models;
mod parser;
mod server;
mod tools;
mod types;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::AppConfig;
use llm::create_llm_provider;
use mcp::StdioConnector;
use tools::create_default_router;

/// Logs go to stderr; in `mcp-server` mode stdout carries the protocol.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(cli: &Cli, config: AppConfig) -> Result<()> {
    let llm = create_llm_provider(&config)?;
    info!(
        "Provider: {}, Model: {}, API: {}",
        llm.name(),
        config.llm.model,
        config.llm.api_base.as_deref().unwrap_or("(default)")
    );

    let args = config.mcp.child_args(cli.config_args());
    let connector = Arc::new(StdioConnector::new(config.mcp.resolve_command()?, args));

    let state = Arc::new(server::AppState::new(&config, llm, connector));
    server::run(&config, state).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command() == Command::InitConfig {
        let path = AppConfig::save_default(cli.config.as_deref())?;
        println!("Created default config: {}", path.display());
        println!("Edit it to set your api_key, model, etc.");
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    match cli.command() {
        Command::McpServer => {
            info!("Starting MCP tool server on stdio");
            mcp::server::serve_stdio(create_default_router(&config.tools)).await
        }
        _ => serve(&cli, config).await,
    }
}
