//! Command-line interface for formcourier.
//!
//! This module provides the CLI structure for the `fcourier` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, QuotaCommand, ResetCommand, SendCommand};

use crate::logging::Verbosity;

/// fcourier - Send contact form messages through a form-relay endpoint
///
/// Validates the message, enforces a locally persisted rate limit, and
/// delivers the message to the configured hosted form processor.
#[derive(Debug, Parser)]
#[command(name = "fcourier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a message to the configured relay endpoint
    Send(SendCommand),

    /// Show remaining send allowance
    Quota(QuotaCommand),

    /// Clear persisted rate-limit state
    Reset(ResetCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
