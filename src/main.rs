//! Lexi - Legal AI assistant CLI
//!
#![doc = "Lexi - Legal AI assistant CLI"]
#![doc = "Main entry point for the Lexi chat client."]

use anyhow::Result;

use lexi::cli::{Cli, Commands};
use lexi::commands;
use lexi::config::{Config, DEFAULT_CONFIG_PATH};
use lexi::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_logging(cli.verbose, cli.json_logs)?;

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Ask { question, json } => {
            tracing::debug!("Asking: {}", question);
            commands::ask::run_ask(config, question, json).await?;
            Ok(())
        }
        Commands::Health => {
            tracing::info!("Checking answering service health");
            commands::health::run_health(config).await?;
            Ok(())
        }
    }
}
