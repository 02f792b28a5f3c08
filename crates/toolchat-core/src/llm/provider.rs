//! InferenceProvider and ModelClient trait definitions.
//!
//! Both return `Pin<Box<dyn Stream>>` so they stay object-safe and can be
//! held as `Arc<dyn ...>` and selected at runtime.

use std::pin::Pin;

use futures_util::Stream;

use toolchat_types::error::InferenceError;
use toolchat_types::llm::{ChatRequest, ModelEvent, ModelRequest};
use toolchat_types::stream::InferenceEvent;

/// Stream of events for one assistant response.
pub type InferenceStream =
    Pin<Box<dyn Stream<Item = Result<InferenceEvent, InferenceError>> + Send + 'static>>;

/// Stream of events for one raw model turn.
pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ModelEvent, InferenceError>> + Send + 'static>>;

/// Produces an incremental assistant response for a full history.
///
/// A well-formed stream ends with exactly one `Finish` or `Error` event.
/// Dropping the stream aborts the underlying work.
pub trait InferenceProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini-2.5-flash via tool-loop").
    fn name(&self) -> &str;

    fn stream(&self, request: ChatRequest) -> InferenceStream;
}

/// One streamed completion against a chat model, with no tool execution.
///
/// Implementations live in toolchat-infra (e.g., `OpenAiCompatClient`).
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    fn stream_turn(&self, request: ModelRequest) -> ModelStream;
}
