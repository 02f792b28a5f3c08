use thiserror::Error;

use crate::stream::StreamStatus;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the inference boundary (model client or step loop).
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("stream exceeded {secs}s wall-clock limit")]
    Timeout { secs: u64 },

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors from resolving or running a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

/// Errors surfaced by conversation operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("a response is still in progress (status: {0})")]
    StreamBusy(StreamStatus),

    #[error("message is empty")]
    EmptyInput,

    #[error("no session is attached to this conversation")]
    NoSession,

    #[error("message serialization failed: {0}")]
    Serialization(String),

    #[error("conversation was torn down")]
    Detached,
}
