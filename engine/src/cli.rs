//! CLI interface for Valet
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for driving the assistant.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Valet Assistant Engine
///
/// A conversational work-life assistant that turns free-text requests into
/// scheduled meetings, dinner bookings, availability checks, and emails,
/// with a confirmation step in front of every side effect.
#[derive(Parser, Debug)]
#[command(name = "valet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process one request and print the response
    Ask {
        /// The request, e.g. "Setup a meeting for Arnav and Yash on August 10"
        query: String,

        /// Requester email, used for sessions and as the organizer identity
        #[arg(long, value_name = "EMAIL")]
        from: Option<String>,
    },

    /// Interactive conversation: selections and confirmations included
    Chat {
        /// Requester email, used for sessions and as the organizer identity
        #[arg(long, value_name = "EMAIL")]
        from: Option<String>,
    },

    /// Show engine status and capability summary
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Print the configuration file path
    Path,
}
