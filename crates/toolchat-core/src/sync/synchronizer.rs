//! PersistenceSynchronizer: writes each conversation turn to the store once.
//!
//! User turns are written when submitted. Assistant turns are written when
//! their exchange reaches `Ready`, guarded by the [`FlushLedger`] so that
//! repeated completion signals and already-hydrated messages produce no
//! writes.

use std::sync::Arc;

use toolchat_types::chat::{MessageRole, StoredMessage};
use toolchat_types::error::ChatError;
use toolchat_types::message::RichMessage;
use toolchat_types::stream::StreamStatus;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::SessionStore;
use crate::chat::service::ChatService;
use crate::convert::to_persisted;
use crate::stream::aggregator::StreamAggregator;
use crate::sync::ledger::FlushLedger;

/// Result of an assistant flush attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    Written(StoredMessage),
    /// The message was already written (or its write already attempted).
    AlreadyFlushed,
    /// The exchange is not in `Ready`.
    NotReady,
    /// The last message is not an assistant reply.
    NothingToFlush,
}

pub struct PersistenceSynchronizer<S: SessionStore> {
    service: Arc<ChatService<S>>,
    ledger: FlushLedger,
    session_id: Option<Uuid>,
    titled: bool,
}

impl<S: SessionStore> PersistenceSynchronizer<S> {
    /// For a conversation whose session does not exist yet.
    pub fn new(service: Arc<ChatService<S>>) -> Self {
        Self {
            service,
            ledger: FlushLedger::new(),
            session_id: None,
            titled: false,
        }
    }

    /// For a resumed session. `hydrated` is marked flushed up front.
    pub fn resume(service: Arc<ChatService<S>>, session_id: Uuid, hydrated: &[RichMessage]) -> Self {
        let mut ledger = FlushLedger::new();
        ledger.mark_flushed(hydrated.iter().map(|m| &m.id));
        Self {
            service,
            ledger,
            session_id: Some(session_id),
            // A session with history was titled by its first message.
            titled: !hydrated.is_empty(),
        }
    }

    pub fn ledger(&self) -> &FlushLedger {
        &self.ledger
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn attach(&mut self, session_id: Uuid) {
        self.session_id = Some(session_id);
    }

    /// Write a user turn, then title the session if it has no title yet.
    ///
    /// Returns `None` if this message was already written. Titling happens
    /// once per session; a failed title write is logged and not retried
    /// since the message itself is already stored.
    pub async fn persist_user(&mut self, message: &RichMessage) -> Result<Option<StoredMessage>, ChatError> {
        let session_id = self.session_id.ok_or(ChatError::NoSession)?;
        if !self.ledger.claim(&message.id) {
            debug!(message_id = %message.id, "User message already persisted");
            return Ok(None);
        }

        let body = to_persisted(&message.parts)?;
        let stored = self
            .service
            .append_message(session_id, MessageRole::User, body.content, body.tool_invocations)
            .await?;

        if !self.titled {
            self.titled = true;
            if let Err(e) = self.service.set_title_from(&session_id, &message.text()).await {
                warn!(session_id = %session_id, error = %e, "Failed to set session title");
            }
        }
        Ok(Some(stored))
    }

    /// Write the finished assistant reply held by `state`, at most once.
    pub async fn flush_assistant(&mut self, state: &StreamAggregator) -> Result<FlushOutcome, ChatError> {
        if state.status() != StreamStatus::Ready {
            return Ok(FlushOutcome::NotReady);
        }
        if !state.has_completed_reply() {
            return Ok(FlushOutcome::NothingToFlush);
        }
        let Some(message) = state.last_message() else {
            return Ok(FlushOutcome::NothingToFlush);
        };
        if self.ledger.is_flushed(&message.id) {
            return Ok(FlushOutcome::AlreadyFlushed);
        }
        let session_id = self.session_id.ok_or(ChatError::NoSession)?;

        if !self.ledger.claim(&message.id) {
            debug!(message_id = %message.id, "Duplicate completion absorbed");
            return Ok(FlushOutcome::AlreadyFlushed);
        }

        let body = to_persisted(&message.parts)?;
        match self
            .service
            .append_message(
                session_id,
                MessageRole::Assistant,
                body.content,
                body.tool_invocations,
            )
            .await
        {
            Ok(stored) => {
                info!(
                    session_id = %session_id,
                    message_id = %message.id,
                    stored_id = %stored.id,
                    "Assistant message persisted"
                );
                Ok(FlushOutcome::Written(stored))
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    message_id = %message.id,
                    error = %e,
                    "Failed to persist assistant message; it will not be retried"
                );
                Err(e.into())
            }
        }
    }
}
