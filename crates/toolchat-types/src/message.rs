//! Rich message representation used while a conversation is live.
//!
//! A [`RichMessage`] is an ordered list of [`Part`]s in emission order. Parts
//! form a closed set of variants so that downstream code matches on a type,
//! never on a string prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::chat::MessageRole;

/// Identity of a message, either assigned by the inference stream or taken
/// from the stored row it was hydrated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh, time-sortable identity.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle of a tool call inside a message. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Pending,
    Completed,
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolCallStatus::Pending => write!(f, "pending"),
            ToolCallStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One tool invocation and, once completed, its result.
///
/// Field order here is the field order of the persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPart {
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(rename = "toolCallId")]
    pub call_id: String,
    #[serde(rename = "args", default)]
    pub arguments: serde_json::Value,
    #[serde(rename = "state")]
    pub status: ToolCallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ToolCallPart {
    /// A call that has started but not produced a result yet.
    pub fn pending(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            arguments,
            status: ToolCallStatus::Pending,
            result: None,
        }
    }

    /// Move to `Completed` and attach the result.
    ///
    /// Returns `false` (and leaves the part untouched) if the call was
    /// already completed.
    pub fn complete(&mut self, result: serde_json::Value) -> bool {
        if self.status == ToolCallStatus::Completed {
            return false;
        }
        self.status = ToolCallStatus::Completed;
        self.result = Some(result);
        true
    }

    pub fn is_completed(&self) -> bool {
        self.status == ToolCallStatus::Completed
    }
}

/// One fragment of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    Text { text: String },
    Reasoning { text: String },
    ToolCall(ToolCallPart),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCallPart> {
        match self {
            Part::ToolCall(call) => Some(call),
            _ => None,
        }
    }
}

/// A message as the live conversation sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RichMessage {
    /// A user message holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: MessageRole::User,
            parts: vec![Part::text(text)],
            created_at: Some(Utc::now()),
        }
    }

    /// An assistant message with no parts yet.
    pub fn assistant(id: MessageId) -> Self {
        Self {
            id,
            role: MessageRole::Assistant,
            parts: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Ordered concatenation of every text part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallPart> {
        self.parts.iter().filter_map(Part::as_tool_call)
    }

    pub fn tool_call_mut(&mut self, call_id: &str) -> Option<&mut ToolCallPart> {
        self.parts.iter_mut().find_map(|p| match p {
            Part::ToolCall(call) if call.call_id == call_id => Some(call),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_part_serialized_shape() {
        let part = Part::ToolCall(ToolCallPart::pending(
            "call_1",
            "getWeather",
            json!({"location": "Tokyo"}),
        ));
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(
            json,
            r#"{"type":"tool-call","toolName":"getWeather","toolCallId":"call_1","args":{"location":"Tokyo"},"state":"pending"}"#
        );
    }

    #[test]
    fn test_complete_is_one_way() {
        let mut call = ToolCallPart::pending("c", "getF1Matches", json!({}));
        assert!(call.complete(json!({"error": false})));
        assert!(!call.complete(json!({"error": true})));
        assert_eq!(call.result, Some(json!({"error": false})));
        assert!(call.is_completed());
    }

    #[test]
    fn test_text_skips_tool_and_reasoning_parts() {
        let mut msg = RichMessage::assistant(MessageId::from("m1"));
        msg.parts.push(Part::text("It is "));
        msg.parts.push(Part::Reasoning {
            text: "look it up".to_string(),
        });
        msg.parts
            .push(Part::ToolCall(ToolCallPart::pending("c", "getWeather", json!({}))));
        msg.parts.push(Part::text("sunny."));
        assert_eq!(msg.text(), "It is sunny.");
        assert_eq!(msg.tool_calls().count(), 1);
    }

    #[test]
    fn test_message_id_from_uuid() {
        let id = Uuid::now_v7();
        assert_eq!(MessageId::from(id).as_str(), id.to_string());
    }
}
