//! Chat service scoping session access to an owner and stamping messages.
//!
//! ChatService wraps a `SessionStore` with the rules every caller needs:
//! sessions are only visible to their owner, appending a message refreshes
//! the session's `updated_at`, and titles are derived and truncated here.

use chrono::Utc;
use toolchat_types::chat::{ChatSession, DEFAULT_SESSION_TITLE, MessageRole, StoredMessage};
use toolchat_types::error::RepositoryError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::SessionStore;
use crate::chat::title::title_from_message;

/// A session together with its messages in creation order.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub session: ChatSession,
    pub messages: Vec<StoredMessage>,
}

/// Owner-scoped session and message operations.
///
/// Generic over `SessionStore` so toolchat-core never depends on toolchat-infra.
pub struct ChatService<S: SessionStore> {
    store: S,
    title_max_chars: usize,
}

impl<S: SessionStore> ChatService<S> {
    pub fn new(store: S, title_max_chars: usize) -> Self {
        Self {
            store,
            title_max_chars,
        }
    }

    // --- Sessions ---

    /// Create a session for `owner_id`.
    ///
    /// The title hint is truncated like any other title; without one the
    /// session is called "New Chat".
    pub async fn create_session(
        &self,
        owner_id: &str,
        title_hint: Option<&str>,
    ) -> Result<ChatSession, RepositoryError> {
        let now = Utc::now();
        let title = match title_hint {
            Some(hint) => title_from_message(hint, self.title_max_chars),
            None => DEFAULT_SESSION_TITLE.to_string(),
        };
        let session = ChatSession {
            id: Uuid::now_v7(),
            owner_id: owner_id.to_string(),
            title,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create_session(&session).await?;
        info!(session_id = %created.id, owner_id, "Session created");
        Ok(created)
    }

    /// List the owner's sessions, most recently updated first.
    pub async fn list_sessions(&self, owner_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        self.store.list_sessions(owner_id).await
    }

    /// Load a session and its messages.
    ///
    /// Returns `Ok(None)` both when the session does not exist and when it
    /// belongs to someone else, so foreign sessions look the same as missing ones.
    pub async fn load_conversation(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let Some(session) = self.store.get_session(session_id).await? else {
            debug!(session_id = %session_id, "Session not found");
            return Ok(None);
        };
        if !session.is_owned_by(owner_id) {
            warn!(session_id = %session_id, owner_id, "Session requested by non-owner");
            return Ok(None);
        }

        let messages = self.store.get_messages(session_id).await?;
        Ok(Some(Conversation { session, messages }))
    }

    /// Delete one of the owner's sessions together with its messages.
    pub async fn delete_session(&self, owner_id: &str, session_id: &Uuid) -> Result<(), RepositoryError> {
        match self.store.get_session(session_id).await? {
            Some(session) if session.is_owned_by(owner_id) => {
                self.store.delete_session(session_id).await?;
                info!(session_id = %session_id, "Session deleted");
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    // --- Messages ---

    /// Append a message and refresh the session's `updated_at`.
    ///
    /// Once the message row is written the call succeeds; a failed refresh
    /// only leaves `updated_at` stale and is logged.
    pub async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: String,
        tool_invocations: Option<String>,
    ) -> Result<StoredMessage, RepositoryError> {
        let message = StoredMessage {
            id: Uuid::now_v7(),
            session_id,
            role,
            content,
            tool_invocations,
            created_at: Utc::now(),
        };

        self.store.append_message(&message).await?;
        if let Err(e) = self.store.touch_session(&session_id, message.created_at).await {
            warn!(session_id = %session_id, error = %e, "Failed to refresh session activity");
        }
        debug!(
            session_id = %session_id,
            message_id = %message.id,
            role = %role,
            has_tools = message.tool_invocations.is_some(),
            "Message appended"
        );
        Ok(message)
    }

    /// Title a session from a message, truncated to the configured length.
    ///
    /// Returns the title that was stored.
    pub async fn set_title_from(&self, session_id: &Uuid, text: &str) -> Result<String, RepositoryError> {
        let title = title_from_message(text, self.title_max_chars);
        self.store.set_title(session_id, &title).await?;
        info!(session_id = %session_id, "Session title updated");
        Ok(title)
    }
}
