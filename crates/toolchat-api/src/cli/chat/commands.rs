//! Slash commands available inside a conversation.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Exit,
    /// Leave this conversation and start another from the landing prompt.
    New,
    /// Reprint this conversation's messages.
    History,
    /// Send the first message again after it failed.
    Retry,
    Unknown(String),
}

/// Parse input as a slash command; `None` for ordinary messages.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/retry" => Some(ChatCommand::Retry),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}     Show this help message", style("/help").cyan());
    println!("  {}     End the chat", style("/exit").cyan());
    println!("  {}      Start a new conversation", style("/new").cyan());
    println!("  {}  Show this conversation", style("/history").cyan());
    println!("  {}    Resend a first message that failed", style("/retry").cyan());
    println!();
    println!(
        "  {}",
        style("Ctrl+D to exit, Ctrl+C stops a reply in progress").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse("What's the weather in Tokyo?"), None);
        assert_eq!(parse("  hello /help"), None);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/QUIT"), Some(ChatCommand::Exit));
        assert_eq!(parse("  /new  "), Some(ChatCommand::New));
        assert_eq!(parse("/history now"), Some(ChatCommand::History));
        assert_eq!(parse("/retry"), Some(ChatCommand::Retry));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse("/remember x"), Some(ChatCommand::Unknown("/remember".to_string())));
    }
}
