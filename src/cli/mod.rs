//! Command-line interface for shelfsync.

mod commands;

use clap::{Parser, Subcommand};

use crate::constants::limits::DEFAULT_HISTORY_LIMIT;

/// shelfsync - keeps a media catalog in sync with directories on disk
#[derive(Parser)]
#[command(name = "shelfsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with scheduler
    Daemon,

    /// Create default config file
    Init,

    /// Manage library sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Scan a source, or every source with --all
    Scan {
        /// Source ID
        #[arg(required_unless_present = "all")]
        id: Option<i32>,

        /// Scan every source in turn
        #[arg(long, conflicts_with_all = ["id", "background"])]
        all: bool,

        /// Return as soon as the scan has started
        #[arg(long)]
        background: bool,
    },

    /// Show scan history of a source
    #[command(alias = "h")]
    History {
        /// Source ID
        id: i32,

        /// Number of entries to show
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u64,
    },

    /// Show whether a scan is running
    Status {
        /// Optional source ID to filter
        id: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum SourceCommands {
    /// Register a directory as a source
    Add {
        /// Display name
        name: String,
        /// Root directory
        path: std::path::PathBuf,
        /// Owning user reference
        #[arg(long, default_value_t = 1)]
        owner: i32,
    },
    /// List sources
    #[command(alias = "ls")]
    List,
    /// Remove a source with its media and scan history
    #[command(alias = "rm")]
    Remove {
        /// Source ID
        id: i32,
    },
}

pub use commands::*;
