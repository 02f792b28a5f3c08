//! Events crossing the inference stream boundary and the aggregator status.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::message::MessageId;

/// One incremental unit delivered by an open inference stream.
///
/// A well-formed stream ends with exactly one `Finish` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InferenceEvent {
    /// The stream announces the identity of the assistant message it builds.
    MessageStart { message_id: MessageId },

    /// A chunk of assistant text.
    TextDelta { text: String },

    /// The model asked for a tool to run.
    ToolCallStart {
        call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// A tool finished and produced a result (possibly error-shaped).
    ToolCallResult {
        call_id: String,
        tool_name: String,
        result: serde_json::Value,
    },

    /// Normal completion marker.
    Finish,

    /// Abnormal completion marker.
    Error { message: String },
}

impl InferenceEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InferenceEvent::Finish | InferenceEvent::Error { .. })
    }
}

/// Status of the live exchange owned by one aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Idle,
    Submitted,
    Streaming,
    Ready,
    Errored,
}

impl StreamStatus {
    /// A stream is open; callers must not submit again.
    pub fn is_busy(self) -> bool {
        matches!(self, StreamStatus::Submitted | StreamStatus::Streaming)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStatus::Ready | StreamStatus::Errored)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamStatus::Idle => write!(f, "idle"),
            StreamStatus::Submitted => write!(f, "submitted"),
            StreamStatus::Streaming => write!(f, "streaming"),
            StreamStatus::Ready => write!(f, "ready"),
            StreamStatus::Errored => write!(f, "errored"),
        }
    }
}
