//! Conversion between stored messages and rich messages.
//!
//! A stored message is flat text plus an optional JSON array of tool parts.
//! Reading is fail-soft: a malformed payload costs the tool parts of that one
//! message, never the conversation. Writing the result of a read back out
//! reproduces the same stored form for canonical payloads.

use serde_json::{Value, json};
use toolchat_types::chat::StoredMessage;
use toolchat_types::error::ChatError;
use toolchat_types::message::{MessageId, Part, RichMessage, ToolCallPart, ToolCallStatus};
use tracing::warn;

/// Content some writers stored for assistant turns that only used tools.
/// It is not real text and is dropped on read.
pub const TOOL_ONLY_PLACEHOLDER: &str = "[tool-only]";

/// Stored form of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBody {
    pub content: String,
    pub tool_invocations: Option<String>,
}

/// Build the rich form of one stored message.
///
/// The stored row id becomes the message identity. Non-empty content becomes
/// a leading text part; the payload's tool parts follow in stored order.
pub fn to_rich(message: &StoredMessage) -> RichMessage {
    let mut parts = Vec::new();
    if !message.content.is_empty() && message.content != TOOL_ONLY_PLACEHOLDER {
        parts.push(Part::text(message.content.clone()));
    }
    if let Some(payload) = &message.tool_invocations {
        parts.extend(parse_tool_invocations(&message.id.to_string(), payload));
    }

    RichMessage {
        id: MessageId::from(message.id),
        role: message.role,
        parts,
        created_at: Some(message.created_at),
    }
}

/// Build rich messages for a whole conversation, preserving order.
pub fn to_rich_all(messages: &[StoredMessage]) -> Vec<RichMessage> {
    messages.iter().map(to_rich).collect()
}

/// Parse a stored tool payload into parts.
///
/// Accepts the canonical `tool-call` shape and the older `tool-<name>` /
/// `tool-invocation` shapes. Unparseable payloads and elements are skipped
/// with a warning. A call id seen twice keeps its first occurrence.
pub fn parse_tool_invocations(message_id: &str, payload: &str) -> Vec<Part> {
    let elements = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(elements)) => elements,
        Ok(other) => {
            warn!(message_id, kind = json_kind(&other), "Tool payload is not an array, ignoring");
            return Vec::new();
        }
        Err(e) => {
            warn!(message_id, error = %e, "Tool payload is not valid JSON, ignoring");
            return Vec::new();
        }
    };

    let mut calls: Vec<ToolCallPart> = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        let Some(call) = tool_part_from_value(message_id, element) else {
            warn!(message_id, index, "Skipping unreadable tool payload element");
            continue;
        };
        if calls.iter().any(|c| c.call_id == call.call_id) {
            warn!(message_id, call_id = %call.call_id, "Duplicate tool call id in payload, keeping first");
            continue;
        }
        calls.push(call);
    }
    calls.into_iter().map(Part::ToolCall).collect()
}

/// Build the stored form of a message's parts.
///
/// Text parts are concatenated in order. Tool parts are serialized in order;
/// reasoning parts are not persisted. A message without tool parts has no
/// payload at all.
pub fn to_persisted(parts: &[Part]) -> Result<PersistedBody, ChatError> {
    let content: String = parts
        .iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    let tool_parts: Vec<&Part> = parts
        .iter()
        .filter(|p| matches!(p, Part::ToolCall(_)))
        .collect();
    let tool_invocations = if tool_parts.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&tool_parts).map_err(|e| ChatError::Serialization(e.to_string()))?)
    };

    Ok(PersistedBody {
        content,
        tool_invocations,
    })
}

fn tool_part_from_value(message_id: &str, value: Value) -> Option<ToolCallPart> {
    let kind = value.get("type")?.as_str()?.to_string();
    if kind == "tool-call" {
        let mut call: ToolCallPart = serde_json::from_value(value).ok()?;
        if call.status == ToolCallStatus::Pending && call.result.take().is_some() {
            warn!(message_id, call_id = %call.call_id, "Pending tool call carried a result, dropping it");
        }
        return Some(call);
    }
    if kind.starts_with("tool-") {
        return legacy_tool_part(&kind, &value);
    }
    None
}

/// Older payloads: `{"type":"tool-getWeather","toolCallId","state","input","output"}`
/// or `{"type":"tool-invocation","toolName","toolCallId","state","args","result"}`.
fn legacy_tool_part(kind: &str, value: &Value) -> Option<ToolCallPart> {
    let call_id = value.get("toolCallId")?.as_str()?;
    let tool_name = value
        .get("toolName")
        .and_then(Value::as_str)
        .or_else(|| kind.strip_prefix("tool-").filter(|name| *name != "invocation"))?;
    let arguments = value
        .get("input")
        .or_else(|| value.get("args"))
        .cloned()
        .unwrap_or_else(|| json!({}));

    let mut call = ToolCallPart::pending(call_id, tool_name, arguments);
    match value.get("state").and_then(Value::as_str) {
        Some("output-available" | "result") => {
            let result = value
                .get("output")
                .or_else(|| value.get("result"))
                .cloned()
                .unwrap_or(Value::Null);
            call.complete(result);
        }
        Some("output-error") => {
            let message = value
                .get("errorText")
                .and_then(Value::as_str)
                .unwrap_or("Tool execution failed");
            call.complete(json!({ "error": true, "message": message }));
        }
        _ => {}
    }
    Some(call)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_types::chat::MessageRole;
    use chrono::Utc;
    use uuid::Uuid;

    fn stored(role: MessageRole, content: &str, payload: Option<&str>) -> StoredMessage {
        StoredMessage {
            id: Uuid::now_v7(),
            session_id: Uuid::now_v7(),
            role,
            content: content.to_string(),
            tool_invocations: payload.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    const WEATHER_PAYLOAD: &str = r#"[{"type":"tool-call","toolName":"getWeather","toolCallId":"call_1","args":{"location":"Tokyo"},"state":"completed","result":{"location":"Tokyo","temperature":18,"description":"clear sky"}}]"#;

    #[test]
    fn test_text_only_message() {
        let msg = stored(MessageRole::User, "hello", None);
        let rich = to_rich(&msg);
        assert_eq!(rich.id, MessageId::from(msg.id));
        assert_eq!(rich.role, MessageRole::User);
        assert_eq!(rich.parts, vec![Part::text("hello")]);
    }

    #[test]
    fn test_empty_content_yields_no_text_part() {
        let msg = stored(MessageRole::Assistant, "", Some(WEATHER_PAYLOAD));
        let rich = to_rich(&msg);
        assert_eq!(rich.parts.len(), 1);
        assert!(rich.parts[0].as_tool_call().is_some());
    }

    #[test]
    fn test_placeholder_content_is_dropped() {
        let msg = stored(MessageRole::Assistant, TOOL_ONLY_PLACEHOLDER, Some(WEATHER_PAYLOAD));
        let rich = to_rich(&msg);
        assert_eq!(rich.text(), "");
        assert_eq!(rich.tool_calls().count(), 1);
    }

    #[test]
    fn test_text_then_tool_parts() {
        let msg = stored(MessageRole::Assistant, "It's 18°C.", Some(WEATHER_PAYLOAD));
        let rich = to_rich(&msg);
        assert_eq!(rich.parts[0], Part::text("It's 18°C."));
        let call = rich.parts[1].as_tool_call().unwrap();
        assert_eq!(call.tool_name, "getWeather");
        assert!(call.is_completed());
        assert_eq!(call.result.as_ref().unwrap()["temperature"], 18);
    }

    #[test]
    fn test_malformed_payload_keeps_text() {
        let msg = stored(MessageRole::Assistant, "Partial answer", Some("{not json"));
        let rich = to_rich(&msg);
        assert_eq!(rich.parts, vec![Part::text("Partial answer")]);
    }

    #[test]
    fn test_non_array_payload_is_ignored() {
        let parts = parse_tool_invocations("m", r#"{"type":"tool-call"}"#);
        assert!(parts.is_empty());
    }

    #[test]
    fn test_bad_element_skipped_others_kept() {
        let payload = r#"[42,{"type":"tool-call","toolName":"getF1Matches","toolCallId":"c2","args":{},"state":"pending"}]"#;
        let parts = parse_tool_invocations("m", payload);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].as_tool_call().unwrap().call_id, "c2");
    }

    #[test]
    fn test_duplicate_call_ids_keep_first() {
        let payload = r#"[
            {"type":"tool-call","toolName":"getWeather","toolCallId":"c1","args":{},"state":"completed","result":1},
            {"type":"tool-call","toolName":"getWeather","toolCallId":"c1","args":{},"state":"completed","result":2}
        ]"#;
        let parts = parse_tool_invocations("m", payload);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].as_tool_call().unwrap().result, Some(json!(1)));
    }

    #[test]
    fn test_pending_result_is_dropped() {
        let payload = r#"[{"type":"tool-call","toolName":"getWeather","toolCallId":"c1","args":{},"state":"pending","result":{"x":1}}]"#;
        let parts = parse_tool_invocations("m", payload);
        let call = parts[0].as_tool_call().unwrap();
        assert_eq!(call.status, ToolCallStatus::Pending);
        assert!(call.result.is_none());
    }

    #[test]
    fn test_legacy_named_tool_shape() {
        let payload = r#"[{"type":"tool-getStockPrice","toolCallId":"c9","state":"output-available","input":{"symbol":"AAPL"},"output":{"price":"189.84"}}]"#;
        let parts = parse_tool_invocations("m", payload);
        let call = parts[0].as_tool_call().unwrap();
        assert_eq!(call.tool_name, "getStockPrice");
        assert_eq!(call.arguments, json!({"symbol": "AAPL"}));
        assert_eq!(call.result, Some(json!({"price": "189.84"})));
    }

    #[test]
    fn test_legacy_invocation_shape() {
        let payload = r#"[{"type":"tool-invocation","toolName":"getWeather","toolCallId":"c3","state":"result","args":{"location":"Oslo"},"result":{"temperature":-2}}]"#;
        let parts = parse_tool_invocations("m", payload);
        let call = parts[0].as_tool_call().unwrap();
        assert_eq!(call.tool_name, "getWeather");
        assert!(call.is_completed());
    }

    #[test]
    fn test_legacy_error_state_becomes_error_result() {
        let payload = r#"[{"type":"tool-getWeather","toolCallId":"c4","state":"output-error","input":{},"errorText":"boom"}]"#;
        let parts = parse_tool_invocations("m", payload);
        let call = parts[0].as_tool_call().unwrap();
        assert_eq!(call.result, Some(json!({"error": true, "message": "boom"})));
    }

    #[test]
    fn test_to_persisted_text_only_has_no_payload() {
        let body = to_persisted(&[Part::text("Hello "), Part::text("world")]).unwrap();
        assert_eq!(body.content, "Hello world");
        assert!(body.tool_invocations.is_none());
    }

    #[test]
    fn test_to_persisted_skips_reasoning() {
        let body = to_persisted(&[
            Part::Reasoning {
                text: "hmm".to_string(),
            },
            Part::text("Answer"),
        ])
        .unwrap();
        assert_eq!(body.content, "Answer");
        assert!(body.tool_invocations.is_none());
    }

    #[test]
    fn test_stored_form_survives_read_and_write() {
        let cases = [
            ("hello", None),
            ("", Some(WEATHER_PAYLOAD)),
            ("It's 18°C in Tokyo.", Some(WEATHER_PAYLOAD)),
            (
                "Two lookups",
                Some(
                    r#"[{"type":"tool-call","toolName":"getWeather","toolCallId":"a","args":{"location":"Paris"},"state":"completed","result":{"error":true,"message":"City not found"}},{"type":"tool-call","toolName":"getStockPrice","toolCallId":"b","args":{"symbol":"MSFT"},"state":"pending"}]"#,
                ),
            ),
        ];

        for (content, payload) in cases {
            let msg = stored(MessageRole::Assistant, content, payload);
            let body = to_persisted(&to_rich(&msg).parts).unwrap();
            assert_eq!(body.content, content);
            assert_eq!(body.tool_invocations.as_deref(), payload);
        }
    }
}
