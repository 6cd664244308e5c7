//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extension Updater - Keep locally installed extensions current
#[derive(Parser, Debug)]
#[command(name = "extup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config.toml (defaults to ./config.toml when present)
    #[arg(short, long, global = true, env = "EXTUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extensions root directory (overrides the configured root)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Identity checked against the admin allow-list
    #[arg(short, long, global = true, env = "EXTUP_USER")]
    pub user: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List installed extensions with their local versions
    List,

    /// Compare local versions against the remote source
    ///
    /// Examples:
    ///   extup check              # Check every extension
    ///   extup check alpha beta   # Check a named subset
    Check {
        /// Extension names to check (all when omitted)
        names: Vec<String>,
    },

    /// Update one extension, or everything that is stale
    ///
    /// Examples:
    ///   extup update alpha       # Update one extension by name
    ///   extup update --all       # Update every stale extension
    Update {
        /// Name of the extension to update, or the literal ALL
        #[arg(required_unless_present = "all")]
        name: Option<String>,

        /// Update every extension with a newer remote version
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },

    /// Show one extension's manifest details and remote version
    Info {
        /// Name of the extension (case-insensitive)
        name: String,
    },

    /// Show or change per-extension auto-update preferences
    ///
    /// Examples:
    ///   extup settings                 # Show every stored preference
    ///   extup settings alpha on        # Enable auto-update for alpha
    Settings {
        /// Name of the extension
        name: Option<String>,

        /// New state: "on" or "off"
        #[arg(requires = "name")]
        state: Option<String>,
    },

    /// Show the effective configuration and credential state
    Status,
}
