//! Test doubles shared by the core unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures_util::stream;
use tokio::sync::mpsc;
use toolchat_types::chat::{ChatSession, StoredMessage};
use toolchat_types::error::{InferenceError, RepositoryError};
use toolchat_types::llm::ChatRequest;
use toolchat_types::stream::InferenceEvent;
use uuid::Uuid;

use crate::chat::repository::SessionStore;
use crate::llm::provider::{InferenceProvider, InferenceStream};

#[derive(Default)]
struct MemoryState {
    sessions: Vec<ChatSession>,
    messages: Vec<StoredMessage>,
}

/// `SessionStore` over a shared vector, with switches to inject failures.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    state: Arc<Mutex<MemoryState>>,
    fail_creates: Arc<AtomicBool>,
    fail_appends: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    fail_touches: Arc<AtomicBool>,
    appends: Arc<AtomicUsize>,
}

impl InMemorySessionStore {
    pub fn fail_creates(&self, on: bool) {
        self.fail_creates.store(on, Ordering::SeqCst);
    }

    pub fn fail_appends(&self, on: bool) {
        self.fail_appends.store(on, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_touches(&self, on: bool) {
        self.fail_touches.store(on, Ordering::SeqCst);
    }

    /// Number of successful appends.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.state.lock().unwrap().sessions.clone()
    }

    pub fn messages_of(&self, session_id: Uuid) -> Vec<StoredMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect()
    }

    fn check(flag: &AtomicBool) -> Result<(), RepositoryError> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("injected failure".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        Self::check(&self.fail_creates)?;
        self.state.lock().unwrap().sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        Self::check(&self.fail_reads)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == *session_id)
            .cloned())
    }

    async fn list_sessions(&self, owner_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        Self::check(&self.fail_reads)?;
        let mut sessions: Vec<ChatSession> = self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.retain(|s| s.id != *session_id);
        state.messages.retain(|m| m.session_id != *session_id);
        Ok(())
    }

    async fn append_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
        Self::check(&self.fail_appends)?;
        let mut state = self.state.lock().unwrap();
        if !state.sessions.iter().any(|s| s.id == message.session_id) {
            return Err(RepositoryError::NotFound);
        }
        state.messages.push(message.clone());
        self.appends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_messages(&self, session_id: &Uuid) -> Result<Vec<StoredMessage>, RepositoryError> {
        Self::check(&self.fail_reads)?;
        Ok(self.messages_of(*session_id))
    }

    async fn touch_session(&self, session_id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        Self::check(&self.fail_touches)?;
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == *session_id) {
            session.updated_at = at;
        }
        Ok(())
    }

    async fn set_title(&self, session_id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        match state.sessions.iter_mut().find(|s| s.id == *session_id) {
            Some(session) => {
                session.title = title.to_string();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

pub type Script = Vec<Result<InferenceEvent, InferenceError>>;

/// Replays one script per `stream` call and records each request.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl InferenceProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: ChatRequest) -> InferenceStream {
        self.requests.lock().unwrap().push(request);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        Box::pin(stream::iter(script))
    }
}

/// Hands out a stream fed by a channel the test keeps the sender of.
pub struct ChannelProvider {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Result<InferenceEvent, InferenceError>>>>,
}

impl ChannelProvider {
    pub fn new() -> (Self, mpsc::UnboundedSender<Result<InferenceEvent, InferenceError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                receiver: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl InferenceProvider for ChannelProvider {
    fn name(&self) -> &str {
        "channel"
    }

    fn stream(&self, _request: ChatRequest) -> InferenceStream {
        let receiver = self.receiver.lock().unwrap().take();
        Box::pin(async_stream::stream! {
            if let Some(mut rx) = receiver {
                while let Some(item) = rx.recv().await {
                    yield item;
                }
            }
        })
    }
}
