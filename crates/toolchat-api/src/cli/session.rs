//! Session management commands: list, show, delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use toolchat_core::convert::to_rich_all;
use toolchat_types::error::RepositoryError;

use crate::cli::chat::renderer::print_message;
use crate::state::AppState;

/// List the owner's sessions, most recently active first.
///
/// ```bash
/// toolchat sessions
/// toolchat sessions --json
/// ```
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state
        .chat_service
        .list_sessions(&state.config.owner_id)
        .await
        .context("Failed to list sessions")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("toolchat chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Last active").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for session in &sessions {
        table.add_row(vec![
            Cell::new(truncate_title(&session.title, 40)).fg(Color::Cyan),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
            Cell::new(session.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print a session with its messages as the conversation would show them.
///
/// ```bash
/// toolchat show <session-id>
/// toolchat show <session-id> --json
/// ```
pub async fn show_session(state: &AppState, session_id: Uuid, json: bool) -> Result<()> {
    let conversation = state
        .chat_service
        .load_conversation(&state.config.owner_id, &session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;

    let messages = to_rich_all(&conversation.messages);

    if json {
        let export = serde_json::json!({
            "session": conversation.session,
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    let session = &conversation.session;
    println!();
    println!("  {}", style(&session.title).cyan().bold());
    println!(
        "  {}",
        style(format!(
            "{} \u{00b7} created {} \u{00b7} last active {}",
            session.id,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.updated_at.format("%Y-%m-%d %H:%M"),
        ))
        .dim()
    );
    println!();
    for message in &messages {
        print_message(message);
    }
    println!();

    Ok(())
}

/// Delete a session and its messages, asking first unless `force`.
///
/// ```bash
/// toolchat delete <session-id>
/// toolchat delete <session-id> --force
/// ```
pub async fn delete_session(state: &AppState, session_id: Uuid, force: bool, json: bool) -> Result<()> {
    let owner_id = &state.config.owner_id;
    let conversation = state
        .chat_service
        .load_conversation(owner_id, &session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;
    let title = conversation.session.title;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' ({} messages)?",
                style(&title).red().bold(),
                conversation.messages.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    match state.chat_service.delete_session(owner_id, &session_id).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => anyhow::bail!("Session '{session_id}' not found"),
        Err(e) => return Err(e).context("Failed to delete session"),
    }

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": session_id.to_string()})
        );
    } else {
        println!("  {} Session '{}' deleted.", style("x").red().bold(), title);
    }

    Ok(())
}

/// Cut to `max` characters on a char boundary, marking the cut.
fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let kept: String = title.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
