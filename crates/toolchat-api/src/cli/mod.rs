//! CLI command definitions for the `toolchat` binary.

pub mod chat;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Chat with a tool-using assistant from the terminal.
#[derive(Parser)]
#[command(name = "toolchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a conversation, or resume one with --session.
    Chat {
        /// First message of a new conversation.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,

        /// Resume an existing session by ID.
        #[arg(long, short)]
        session: Option<Uuid>,
    },

    /// List your sessions, most recently active first.
    #[command(alias = "ls")]
    Sessions,

    /// Show a session's messages.
    Show {
        /// Session ID.
        id: Uuid,
    },

    /// Delete a session and its messages.
    #[command(alias = "rm")]
    Delete {
        /// Session ID.
        id: Uuid,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}
