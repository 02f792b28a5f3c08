//! Async readline input for the chat loop.
//!
//! A `Readline` puts the terminal in raw mode for as long as it lives, so
//! one is opened per prompt and dropped before a reply streams. That keeps
//! Ctrl+C delivering SIGINT while a response is being printed.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent};

/// What the user did at the prompt.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// A submitted line, trimmed.
    Message(String),
    /// Ctrl+D.
    Eof,
    /// Ctrl+C at the prompt.
    Interrupted,
}

/// Prompt once and read a line.
pub async fn read_line(prompt: &str) -> Result<InputEvent, ReadlineError> {
    let (mut rl, _writer) = Readline::new(prompt.to_string())?;
    let event = match rl.readline().await {
        Ok(ReadlineEvent::Line(line)) => InputEvent::Message(line.trim().to_string()),
        Ok(ReadlineEvent::Eof) => InputEvent::Eof,
        Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
        Err(e) => {
            tracing::debug!(error = %e, "Readline failed, treating as end of input");
            InputEvent::Eof
        }
    };
    Ok(event)
}
