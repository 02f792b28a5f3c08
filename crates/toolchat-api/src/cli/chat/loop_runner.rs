//! Chat loop orchestration.
//!
//! Resolves the launch context into a conversation (or the landing prompt),
//! then reads input and submits turns until the user leaves. A Ctrl+C while
//! a reply streams cancels the conversation; it is then re-opened from
//! storage, so only persisted turns reappear.

use console::style;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use toolchat_core::session::controller::{ConversationController, ConversationDeps, Mounted, SessionEvent};
use toolchat_core::session::launch::{LaunchContext, PendingFirstMessage};
use toolchat_core::stream::driver::StreamEnd;
use toolchat_infra::sqlite::session::SqliteSessionStore;
use toolchat_types::error::ChatError;

use crate::state::AppState;

use super::banner::{print_landing_banner, print_session_banner};
use super::commands::{self, ChatCommand};
use super::input::{InputEvent, read_line};
use super::renderer::{GENERIC_ERROR, TerminalRenderer, print_message};

type Controller = ConversationController<SqliteSessionStore>;

/// How a conversation loop ended.
enum Exit {
    Quit,
    NewChat,
    /// Re-open this session (after a cancelled reply).
    Reattach(Uuid),
}

enum Turn<'a> {
    Pending,
    Text(&'a str),
}

/// Run the interactive chat.
///
/// `session` resumes an existing conversation. Otherwise `text`, when not
/// blank, becomes the first message of a new one; with neither, the landing
/// prompt asks for it.
pub async fn run_chat(state: &AppState, session: Option<Uuid>, text: &str) -> anyhow::Result<()> {
    let deps = state.conversation_deps()?;

    let mut ctx = match session {
        Some(id) => {
            let mut ctx = LaunchContext::resume(id);
            // Sent as the first turn once the history is shown.
            if let Some(pending) = PendingFirstMessage::new(text) {
                ctx.stash(pending);
            }
            ctx
        }
        None => PendingFirstMessage::new(text)
            .map(LaunchContext::with_pending)
            .unwrap_or_else(LaunchContext::empty),
    };
    let mut quiet_resume = false;

    loop {
        let requested = ctx.session_id();
        match ConversationController::mount(deps.clone(), &mut ctx).await {
            Mounted::RedirectHome => {
                if let Some(id) = requested {
                    println!(
                        "\n  {} Session {} is not available.",
                        style("!").yellow().bold(),
                        style(id).dim()
                    );
                }
                match landing_prompt(&state.config.model.model).await? {
                    Some(first) => ctx = LaunchContext::with_pending(first),
                    None => return Ok(()),
                }
                quiet_resume = false;
            }
            Mounted::Conversation(controller) => {
                let follow_up = ctx.take_pending();
                match run_conversation(controller, follow_up, quiet_resume, &deps).await? {
                    Exit::Quit => return Ok(()),
                    Exit::NewChat => {
                        ctx = LaunchContext::empty();
                        quiet_resume = false;
                    }
                    Exit::Reattach(id) => {
                        ctx = LaunchContext::resume(id);
                        quiet_resume = true;
                    }
                }
            }
        }
    }
}

/// Ask for a first message. `None` when the user leaves instead.
async fn landing_prompt(model: &str) -> anyhow::Result<Option<PendingFirstMessage>> {
    print_landing_banner(model);
    let prompt = format!("  {} ", style("You >").green().bold());

    loop {
        let event = read_line(&prompt)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;
        match event {
            InputEvent::Eof | InputEvent::Interrupted => return Ok(None),
            InputEvent::Message(text) => match commands::parse(&text) {
                Some(ChatCommand::Exit) => return Ok(None),
                Some(ChatCommand::Help) => commands::print_help(),
                Some(_) => println!(
                    "  {}",
                    style("Start a conversation first by typing a message.").dim()
                ),
                None => {
                    if let Some(pending) = PendingFirstMessage::new(text) {
                        return Ok(Some(pending));
                    }
                }
            },
        }
    }
}

async fn run_conversation(
    controller: Controller,
    follow_up: Option<PendingFirstMessage>,
    quiet_resume: bool,
    deps: &ConversationDeps<SqliteSessionStore>,
) -> anyhow::Result<Exit> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut controller = controller.with_session_events(events_tx);

    if let Some(session) = controller.session() {
        if !quiet_resume {
            print_session_banner(session);
            for message in controller.messages() {
                print_message(message);
            }
            println!();
        }
    }

    if controller.has_pending_first_message() {
        println!();
        if let Some(exit) = run_turn(&mut controller, Turn::Pending, &mut events_rx).await {
            return Ok(exit);
        }
    }
    if let Some(pending) = follow_up {
        if let Some(exit) = run_turn(&mut controller, Turn::Text(pending.text()), &mut events_rx).await {
            return Ok(exit);
        }
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    loop {
        let event = read_line(&prompt)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

        let text = match event {
            InputEvent::Eof => {
                println!("\n  {}", style("Chat ended.").dim());
                return Ok(Exit::Quit);
            }
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Exit => {
                    println!("\n  {}", style("Chat ended.").dim());
                    return Ok(Exit::Quit);
                }
                ChatCommand::New => return Ok(Exit::NewChat),
                ChatCommand::History => {
                    println!();
                    for message in controller.messages() {
                        print_message(message);
                    }
                    println!();
                }
                ChatCommand::Retry => {
                    if controller.has_pending_first_message() && controller.rearm_first_message() {
                        if let Some(exit) = run_turn(&mut controller, Turn::Pending, &mut events_rx).await {
                            return Ok(exit);
                        }
                    } else {
                        println!("  {}", style("Nothing to retry.").dim());
                    }
                }
                ChatCommand::Unknown(name) => println!(
                    "  {} Unknown command: {}. Type /help for available commands.",
                    style("?").yellow().bold(),
                    style(name).dim()
                ),
            }
            continue;
        }

        if let Some(exit) = run_turn(&mut controller, Turn::Text(&text), &mut events_rx).await {
            return Ok(exit);
        }
        debug!(provider = deps.provider.name(), status = %controller.status(), "Turn done");
    }
}

/// Submit one turn while Ctrl+C is routed to the conversation's
/// cancellation token.
///
/// `Some` when the conversation has to be left.
async fn run_turn(
    controller: &mut Controller,
    turn: Turn<'_>,
    events_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Option<Exit> {
    let token = controller.cancellation_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut renderer = TerminalRenderer::start();
    let result = match turn {
        Turn::Pending => controller.submit_pending(&mut renderer).await,
        Turn::Text(text) => controller.submit(text, &mut renderer).await.map(Some),
    };
    renderer.finish();
    drop(renderer);
    watcher.abort();

    while let Ok(SessionEvent::Created { session_id, title }) = events_rx.try_recv() {
        info!(session_id = %session_id, "Session started");
        let id = session_id.to_string();
        println!(
            "  {} {} {}",
            style("+").green().bold(),
            style(title).bold(),
            style(format!("({})", &id[..8.min(id.len())])).dim()
        );
    }

    match result {
        Ok(Some(outcome)) => match outcome.end {
            StreamEnd::Completed => {
                println!();
                None
            }
            StreamEnd::Cancelled => {
                println!("\n  {}", style("Reply stopped.").dim());
                Some(Exit::Reattach(outcome.session_id))
            }
            StreamEnd::Failed(reason) => {
                debug!(%reason, "Reply failed");
                print_error(None);
                None
            }
            StreamEnd::TimedOut => {
                print_error(Some("the reply took too long"));
                None
            }
        },
        Ok(None) | Err(ChatError::EmptyInput) => None,
        Err(ChatError::Detached) => Some(match controller.session_id() {
            Some(id) => Exit::Reattach(id),
            None => Exit::NewChat,
        }),
        Err(e) => {
            print_error(Some(&e.to_string()));
            if controller.has_pending_first_message() {
                println!("  {}", style("Type /retry to send your first message again.").dim());
            }
            None
        }
    }
}

fn print_error(detail: Option<&str>) {
    println!("\n  {} {}", style("!").red().bold(), style(GENERIC_ERROR).red());
    if let Some(detail) = detail {
        println!("    {}", style(detail).dim());
    }
    println!();
}
