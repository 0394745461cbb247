//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Send command arguments.
#[derive(Debug, Args)]
pub struct SendCommand {
    /// Sender name
    #[arg(short, long)]
    pub name: String,

    /// Sender email address
    #[arg(short, long)]
    pub email: String,

    /// Optional subject line
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Message body; read from stdin when omitted
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Quota command arguments.
#[derive(Debug, Args)]
pub struct QuotaCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
