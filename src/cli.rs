//! Command-line interface definition for Lexi
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, and
//! backend health checks.

use clap::{Parser, Subcommand};

/// Lexi - Legal AI assistant in your terminal
///
/// Ask legal questions, read the answer, and inspect the supporting
/// citations on demand.
#[derive(Parser, Debug, Clone)]
#[command(name = "lexi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the answering service base URL
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Lexi
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive legal Q&A session
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// Print the conversation as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Check whether the answering service is up and its resources are loaded
    Health,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
