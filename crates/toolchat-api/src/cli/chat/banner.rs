//! Banners for the landing prompt and conversation start.

use console::style;
use toolchat_types::chat::ChatSession;

const SUGGESTIONS: [&str; 3] = [
    "What's the weather in Tokyo?",
    "When is the next F1 race?",
    "What's Apple's stock price?",
];

/// Landing surface: shown when there is no conversation to open.
pub fn print_landing_banner(model: &str) {
    println!();
    println!("  {} {}", style("*").cyan().bold(), style("toolchat").cyan().bold());
    println!(
        "  {}",
        style("I can check the weather, upcoming F1 races, and stock prices. Ask me anything!").dim()
    );
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());
    println!();
    for suggestion in SUGGESTIONS {
        println!("    {} {}", style("-").dim(), suggestion);
    }
    println!();
    println!("  {}", style("Type a message to start, Ctrl+D to exit").dim());
    println!();
}

/// Printed when a resumed conversation opens.
pub fn print_session_banner(session: &ChatSession) {
    let id = session.id.to_string();
    println!();
    println!("  {} {}", style("*").cyan().bold(), style(&session.title).cyan().bold());
    println!(
        "  {}  {}   {}  {}",
        style("Session:").bold(),
        style(&id[..8.min(id.len())]).dim(),
        style("Updated:").bold(),
        style(session.updated_at.format("%Y-%m-%d %H:%M")).dim()
    );
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
