//! CLI definitions for PagePilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PagePilot CLI.
#[derive(Parser)]
#[command(name = "pagepilot")]
#[command(about = "Drive a chat web app through Chrome and keep its projects in order")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.pagepilot/config.toml)
    #[arg(short, long, env = "PAGEPILOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Attach to Chrome and serve JSON-line envelopes on stdin/stdout (default)
    Run {
        /// Chrome remote debugging endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Attach to the first tab whose URL starts with this
        #[arg(long)]
        target: Option<String>,
    },

    /// Validate the configuration and report problems
    CheckConfig,

    /// Print persisted projects, chats, messages and images as JSON
    Snapshot {
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}
