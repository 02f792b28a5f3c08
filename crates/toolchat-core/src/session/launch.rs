//! Launch context and session mode resolution.
//!
//! The landing surface stashes the first message here before the
//! conversation surface opens; the conversation surface takes it exactly once.

use toolchat_types::chat::{ChatSession, StoredMessage};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::SessionStore;
use crate::chat::service::ChatService;

/// A first message typed on the landing surface, not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFirstMessage(String);

impl PendingFirstMessage {
    /// `None` for blank text.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// Navigation state handed to the conversation surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchContext {
    session_id: Option<Uuid>,
    pending: Option<PendingFirstMessage>,
}

impl LaunchContext {
    /// Nothing to resume and nothing to send.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Open an existing session.
    pub fn resume(session_id: Uuid) -> Self {
        Self {
            session_id: Some(session_id),
            pending: None,
        }
    }

    /// Open a new conversation that will send `message` first.
    pub fn with_pending(message: PendingFirstMessage) -> Self {
        Self {
            session_id: None,
            pending: Some(message),
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace the pending message. At most one is ever held; the previous
    /// one, if any, is returned.
    pub fn stash(&mut self, message: PendingFirstMessage) -> Option<PendingFirstMessage> {
        self.pending.replace(message)
    }

    /// Hand off the pending message, clearing it.
    pub fn take_pending(&mut self) -> Option<PendingFirstMessage> {
        self.pending.take()
    }
}

/// How the conversation surface should start.
#[derive(Debug)]
pub enum SessionMode {
    /// Show an existing session's history.
    Resume {
        session: ChatSession,
        messages: Vec<StoredMessage>,
    },
    /// Start a new conversation by submitting the pending message.
    NewFromPending(PendingFirstMessage),
    /// Nothing to show; go back to the landing surface.
    RedirectHome,
}

/// Decide the mode for `ctx`.
///
/// A session id takes precedence and leaves any pending message in place.
/// Otherwise the pending message is taken. A missing, foreign, or
/// unreadable session redirects home rather than failing.
pub async fn resolve_mode<S: SessionStore>(
    service: &ChatService<S>,
    owner_id: &str,
    ctx: &mut LaunchContext,
) -> SessionMode {
    if let Some(session_id) = ctx.session_id() {
        return match service.load_conversation(owner_id, &session_id).await {
            Ok(Some(conversation)) => {
                debug!(
                    session_id = %session_id,
                    messages = conversation.messages.len(),
                    "Resuming session"
                );
                SessionMode::Resume {
                    session: conversation.session,
                    messages: conversation.messages,
                }
            }
            Ok(None) => {
                info!(session_id = %session_id, "Session not available, redirecting home");
                SessionMode::RedirectHome
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to load session, redirecting home");
                SessionMode::RedirectHome
            }
        };
    }

    match ctx.take_pending() {
        Some(pending) => SessionMode::NewFromPending(pending),
        None => SessionMode::RedirectHome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_types::chat::MessageRole;

    use crate::testing::InMemorySessionStore;

    fn service() -> (InMemorySessionStore, ChatService<InMemorySessionStore>) {
        let store = InMemorySessionStore::default();
        (store.clone(), ChatService::new(store, 100))
    }

    #[test]
    fn test_blank_pending_rejected() {
        assert!(PendingFirstMessage::new("  ").is_none());
        assert_eq!(PendingFirstMessage::new("hi").unwrap().text(), "hi");
    }

    #[test]
    fn test_stash_keeps_one() {
        let mut ctx = LaunchContext::empty();
        assert!(ctx.stash(PendingFirstMessage::new("a").unwrap()).is_none());
        let previous = ctx.stash(PendingFirstMessage::new("b").unwrap());
        assert_eq!(previous.unwrap().text(), "a");
        assert_eq!(ctx.take_pending().unwrap().text(), "b");
        assert!(ctx.take_pending().is_none());
    }

    #[tokio::test]
    async fn test_resume_existing_session() {
        let (_, svc) = service();
        let session = svc.create_session("alice", Some("hi")).await.unwrap();
        svc.append_message(session.id, MessageRole::User, "hi".to_string(), None)
            .await
            .unwrap();

        let mut ctx = LaunchContext::resume(session.id);
        match resolve_mode(&svc, "alice", &mut ctx).await {
            SessionMode::Resume { session: s, messages } => {
                assert_eq!(s.id, session.id);
                assert_eq!(messages.len(), 1);
            }
            other => panic!("expected resume, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_session_redirects_home() {
        let (_, svc) = service();
        let mut ctx = LaunchContext::resume(Uuid::now_v7());
        assert!(matches!(
            resolve_mode(&svc, "alice", &mut ctx).await,
            SessionMode::RedirectHome
        ));
    }

    #[tokio::test]
    async fn test_foreign_session_redirects_home() {
        let (_, svc) = service();
        let session = svc.create_session("bob", None).await.unwrap();
        let mut ctx = LaunchContext::resume(session.id);
        assert!(matches!(
            resolve_mode(&svc, "alice", &mut ctx).await,
            SessionMode::RedirectHome
        ));
    }

    #[tokio::test]
    async fn test_read_failure_redirects_home() {
        let (store, svc) = service();
        let session = svc.create_session("alice", None).await.unwrap();
        store.fail_reads(true);
        let mut ctx = LaunchContext::resume(session.id);
        assert!(matches!(
            resolve_mode(&svc, "alice", &mut ctx).await,
            SessionMode::RedirectHome
        ));
    }

    #[tokio::test]
    async fn test_pending_is_taken_once() {
        let (_, svc) = service();
        let mut ctx = LaunchContext::with_pending(PendingFirstMessage::new("hello").unwrap());

        assert!(matches!(
            resolve_mode(&svc, "alice", &mut ctx).await,
            SessionMode::NewFromPending(p) if p.text() == "hello"
        ));
        assert!(!ctx.has_pending());
        assert!(matches!(
            resolve_mode(&svc, "alice", &mut ctx).await,
            SessionMode::RedirectHome
        ));
    }

    #[tokio::test]
    async fn test_empty_context_redirects_home() {
        let (_, svc) = service();
        let mut ctx = LaunchContext::empty();
        assert!(matches!(
            resolve_mode(&svc, "alice", &mut ctx).await,
            SessionMode::RedirectHome
        ));
    }
}
