//! Request and event types for the model and inference boundaries.
//!
//! Two levels exist:
//! - [`ChatRequest`] is what the conversation hands to an inference provider:
//!   the full rich history plus the tool catalog.
//! - [`ModelRequest`] / [`ModelEvent`] describe one raw model turn, below the
//!   tool-calling step loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::message::RichMessage;
use crate::tool::ToolDefinition;

/// Full history plus tool catalog for one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<RichMessage>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// A message in the model's own conversation format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ModelMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ModelToolCall>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

/// Request for a single streamed model turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub messages: Vec<ModelMessage>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

/// Why the model stopped generating a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::ToolCalls => write!(f, "tool_calls"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::ContentFilter => write!(f, "content_filter"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stop" | "end_turn" => Ok(FinishReason::Stop),
            "tool_calls" | "function_call" | "tool_use" => Ok(FinishReason::ToolCalls),
            "length" | "max_tokens" => Ok(FinishReason::Length),
            "content_filter" => Ok(FinishReason::ContentFilter),
            other => Err(format!("invalid finish reason: '{other}'")),
        }
    }
}

/// Events of one streamed model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    TextDelta { text: String },
    /// Emitted once the call's argument JSON is fully assembled.
    ToolCallRequested(ModelToolCall),
    Finished { reason: FinishReason },
}
