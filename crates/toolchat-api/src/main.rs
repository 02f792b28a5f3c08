//! toolchat CLI entry point.
//!
//! Binary name: `toolchat`
//!
//! Parses CLI arguments, initializes logging, the database and services,
//! then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,toolchat_core=debug,toolchat_infra=debug",
        _ => "trace",
    };

    // RUST_LOG wins over the flags when set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "toolchat", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Chat { text, session } => {
            let text = text.join(" ");
            cli::chat::loop_runner::run_chat(&state, session, &text).await?;
        }

        Commands::Sessions => {
            cli::session::list_sessions(&state, cli.json).await?;
        }

        Commands::Show { id } => {
            cli::session::show_session(&state, id, cli.json).await?;
        }

        Commands::Delete { id, force } => {
            cli::session::delete_session(&state, id, force, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
