use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Worldbuilding lore generation API powered by LLMs and MCP tools.
#[derive(Parser, Debug)]
#[command(name = "lore-engine", version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.lore-engine/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Run the content tool server over stdio
    McpServer,
    /// Write the default config file
    InitConfig,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Arguments that make a child process read the same config file.
    pub fn config_args(&self) -> Vec<String> {
        match &self.config {
            Some(path) => vec!["--config".to_string(), path.display().to_string()],
            None => Vec::new(),
        }
    }
}
