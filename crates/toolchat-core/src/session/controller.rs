//! ConversationController: one mounted conversation surface.
//!
//! Owns the aggregator and synchronizer for a session, runs submissions in
//! the order create session -> persist user turn -> title -> stream -> flush,
//! and cancels any open stream when dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use toolchat_types::chat::{ChatSession, StoredMessage};
use toolchat_types::error::ChatError;
use toolchat_types::llm::ChatRequest;
use toolchat_types::message::RichMessage;
use toolchat_types::stream::StreamStatus;
use toolchat_types::tool::ToolDefinition;

use crate::chat::repository::SessionStore;
use crate::chat::service::ChatService;
use crate::convert::to_rich_all;
use crate::llm::provider::InferenceProvider;
use crate::session::launch::{LaunchContext, PendingFirstMessage, SessionMode, resolve_mode};
use crate::session::oneshot::OneShot;
use crate::stream::aggregator::StreamAggregator;
use crate::stream::driver::{StreamEnd, StreamObserver, drive};
use crate::sync::synchronizer::{FlushOutcome, PersistenceSynchronizer};

/// Per-conversation settings.
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub owner_id: String,
    pub system_prompt: Option<String>,
    pub tools: Vec<ToolDefinition>,
    pub stream_timeout: Duration,
}

/// What a conversation needs from the application.
pub struct ConversationDeps<S: SessionStore> {
    pub service: Arc<ChatService<S>>,
    pub provider: Arc<dyn InferenceProvider>,
    pub settings: ConversationSettings,
}

impl<S: SessionStore> Clone for ConversationDeps<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            provider: Arc::clone(&self.provider),
            settings: self.settings.clone(),
        }
    }
}

/// Reported to the shell (e.g. to refresh a session list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Created { session_id: Uuid, title: String },
}

/// Outcome of one submitted turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: Uuid,
    pub end: StreamEnd,
    pub status: StreamStatus,
    pub user_message: Option<StoredMessage>,
    pub assistant_message: Option<StoredMessage>,
}

pub enum Mounted<S: SessionStore> {
    Conversation(ConversationController<S>),
    RedirectHome,
}

pub struct ConversationController<S: SessionStore> {
    deps: ConversationDeps<S>,
    aggregator: StreamAggregator,
    synchronizer: PersistenceSynchronizer<S>,
    session: OneShot<ChatSession>,
    auto_submit: OneShot<()>,
    pending: Option<PendingFirstMessage>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    cancel: CancellationToken,
}

impl<S: SessionStore> ConversationController<S> {
    /// Open the conversation surface for `ctx`.
    pub async fn mount(deps: ConversationDeps<S>, ctx: &mut LaunchContext) -> Mounted<S> {
        match resolve_mode(&deps.service, &deps.settings.owner_id, ctx).await {
            SessionMode::RedirectHome => Mounted::RedirectHome,
            SessionMode::Resume { session, messages } => {
                let hydrated = to_rich_all(&messages);
                let synchronizer =
                    PersistenceSynchronizer::resume(Arc::clone(&deps.service), session.id, &hydrated);
                info!(session_id = %session.id, messages = hydrated.len(), "Conversation resumed");
                Mounted::Conversation(Self {
                    aggregator: StreamAggregator::hydrate(hydrated),
                    synchronizer,
                    session: OneShot::done(session),
                    auto_submit: OneShot::default(),
                    pending: None,
                    events: None,
                    cancel: CancellationToken::new(),
                    deps,
                })
            }
            SessionMode::NewFromPending(pending) => Mounted::Conversation(Self {
                aggregator: StreamAggregator::new(),
                synchronizer: PersistenceSynchronizer::new(Arc::clone(&deps.service)),
                session: OneShot::default(),
                auto_submit: OneShot::default(),
                pending: Some(pending),
                events: None,
                cancel: CancellationToken::new(),
                deps,
            }),
        }
    }

    /// Report session creation on `sender`.
    pub fn with_session_events(mut self, sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.value()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.value().map(|s| s.id)
    }

    pub fn status(&self) -> StreamStatus {
        self.aggregator.status()
    }

    pub fn messages(&self) -> &[RichMessage] {
        self.aggregator.messages()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.aggregator.last_error()
    }

    /// Cancelling this token tears the conversation down: an open stream is
    /// aborted and its partial reply is never persisted.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn has_pending_first_message(&self) -> bool {
        self.pending.is_some()
    }

    /// Submit the first message handed over by the landing surface.
    ///
    /// Runs at most once. Returns `Ok(None)` if there is nothing to send or
    /// it already ran. On failure the message is kept and
    /// [`rearm_first_message`](Self::rearm_first_message) allows one more try.
    pub async fn submit_pending<O: StreamObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<Option<TurnOutcome>, ChatError> {
        let Some(text) = self.pending.as_ref().map(|p| p.text().to_string()) else {
            return Ok(None);
        };
        if !self.auto_submit.begin() {
            return Ok(None);
        }

        match self.submit(&text, observer).await {
            Ok(outcome) => {
                self.auto_submit.finish(());
                self.pending = None;
                Ok(Some(outcome))
            }
            Err(e) => {
                warn!(error = %e, "First message submission failed");
                self.auto_submit.fail();
                Err(e)
            }
        }
    }

    /// Allow the first message to be submitted again after a failure.
    pub fn rearm_first_message(&mut self) -> bool {
        self.auto_submit.rearm()
    }

    /// Submit a user turn and stream the reply.
    pub async fn submit<O: StreamObserver + ?Sized>(
        &mut self,
        text: &str,
        observer: &mut O,
    ) -> Result<TurnOutcome, ChatError> {
        if self.cancel.is_cancelled() {
            return Err(ChatError::Detached);
        }
        if self.aggregator.status().is_busy() {
            return Err(ChatError::StreamBusy(self.aggregator.status()));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let session_id = self.ensure_session(text).await?;

        let user = self.aggregator.submit(text).clone();
        let user_message = match self.synchronizer.persist_user(&user).await {
            Ok(stored) => stored,
            Err(e) => {
                self.aggregator.retract_unsent(&user.id, e.to_string());
                return Err(e);
            }
        };

        let request = ChatRequest {
            system: self.deps.settings.system_prompt.clone(),
            messages: self.aggregator.messages().to_vec(),
            tools: self.deps.settings.tools.clone(),
        };
        let stream = self.deps.provider.stream(request);
        let span = info_span!(
            "chat.stream",
            session_id = %session_id,
            provider = self.deps.provider.name()
        );
        let end = drive(
            &mut self.aggregator,
            stream,
            &self.cancel,
            self.deps.settings.stream_timeout,
            observer,
        )
        .instrument(span)
        .await;

        let assistant_message = match end {
            StreamEnd::Completed => match self.synchronizer.flush_assistant(&self.aggregator).await? {
                FlushOutcome::Written(stored) => Some(stored),
                FlushOutcome::AlreadyFlushed | FlushOutcome::NotReady | FlushOutcome::NothingToFlush => {
                    None
                }
            },
            StreamEnd::Failed(_) | StreamEnd::TimedOut | StreamEnd::Cancelled => None,
        };

        Ok(TurnOutcome {
            session_id,
            end,
            status: self.aggregator.status(),
            user_message,
            assistant_message,
        })
    }

    /// Create the session on first use. A failed attempt may be retried by
    /// the next submission.
    async fn ensure_session(&mut self, first_text: &str) -> Result<Uuid, ChatError> {
        if let Some(session) = self.session.value() {
            return Ok(session.id);
        }
        if !self.session.begin() {
            return Err(ChatError::NoSession);
        }

        match self
            .deps
            .service
            .create_session(&self.deps.settings.owner_id, Some(first_text))
            .await
        {
            Ok(session) => {
                let session_id = session.id;
                self.synchronizer.attach(session_id);
                if let Some(events) = &self.events {
                    let _ = events.send(SessionEvent::Created {
                        session_id,
                        title: session.title.clone(),
                    });
                }
                self.session.finish(session);
                Ok(session_id)
            }
            Err(e) => {
                warn!(error = %e, "Session creation failed");
                self.session.abort();
                Err(e.into())
            }
        }
    }
}

impl<S: SessionStore> Drop for ConversationController<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
