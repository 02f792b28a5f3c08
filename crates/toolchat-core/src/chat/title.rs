//! Session title derivation.

use toolchat_types::chat::DEFAULT_SESSION_TITLE;

/// Derive a session title from the first user message.
///
/// Keeps at most `max_chars` characters (not bytes) of the trimmed text.
/// Blank input falls back to [`DEFAULT_SESSION_TITLE`].
pub fn title_from_message(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DEFAULT_SESSION_TITLE.to_string();
    }
    trimmed.chars().take(max_chars).collect()
}
