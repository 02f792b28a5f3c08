//! Rich conversation history to model message conversion.

use toolchat_types::chat::MessageRole;
use toolchat_types::llm::{ModelMessage, ModelToolCall};
use toolchat_types::message::{Part, RichMessage};

/// Flatten rich messages into the model's message list.
///
/// An assistant message that used tools becomes an assistant turn carrying
/// the calls, followed by one tool message per result, followed by any
/// text that came after. Calls without a result are left out since chat
/// APIs reject a call that is never answered. Reasoning parts are dropped.
pub fn to_model_messages(system: Option<&str>, messages: &[RichMessage]) -> Vec<ModelMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        out.push(ModelMessage::System {
            content: system.to_string(),
        });
    }

    for message in messages {
        match message.role {
            MessageRole::User => out.push(ModelMessage::User {
                content: message.text(),
            }),
            MessageRole::Assistant => push_assistant(&mut out, message),
        }
    }
    out
}

fn push_assistant(out: &mut Vec<ModelMessage>, message: &RichMessage) {
    let mut text = String::new();
    let mut calls: Vec<ModelToolCall> = Vec::new();
    let mut results: Vec<ModelMessage> = Vec::new();

    for part in &message.parts {
        match part {
            Part::Text { text: chunk } => {
                if !calls.is_empty() {
                    flush_step(out, &mut text, &mut calls, &mut results);
                }
                text.push_str(chunk);
            }
            Part::Reasoning { .. } => {}
            Part::ToolCall(call) => {
                let Some(result) = &call.result else {
                    continue;
                };
                calls.push(ModelToolCall {
                    call_id: call.call_id.clone(),
                    tool_name: call.tool_name.clone(),
                    arguments: call.arguments.clone(),
                });
                results.push(ModelMessage::Tool {
                    call_id: call.call_id.clone(),
                    content: result.to_string(),
                });
            }
        }
    }

    if !calls.is_empty() {
        flush_step(out, &mut text, &mut calls, &mut results);
    }
    if !text.is_empty() {
        out.push(ModelMessage::Assistant {
            content: text,
            tool_calls: Vec::new(),
        });
    }
}

fn flush_step(
    out: &mut Vec<ModelMessage>,
    text: &mut String,
    calls: &mut Vec<ModelToolCall>,
    results: &mut Vec<ModelMessage>,
) {
    out.push(ModelMessage::Assistant {
        content: std::mem::take(text),
        tool_calls: std::mem::take(calls),
    });
    out.append(results);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolchat_types::message::{MessageId, ToolCallPart};

    fn assistant(parts: Vec<Part>) -> RichMessage {
        let mut msg = RichMessage::assistant(MessageId::from("a1"));
        msg.parts = parts;
        msg
    }

    fn completed(call_id: &str, name: &str, result: serde_json::Value) -> Part {
        let mut call = ToolCallPart::pending(call_id, name, json!({"location": "Tokyo"}));
        call.complete(result);
        Part::ToolCall(call)
    }

    #[test]
    fn test_system_prompt_leads() {
        let out = to_model_messages(Some("be nice"), &[RichMessage::user("hi")]);
        assert_eq!(
            out,
            vec![
                ModelMessage::System {
                    content: "be nice".to_string()
                },
                ModelMessage::User {
                    content: "hi".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_tool_step_expands_to_call_and_result() {
        let msg = assistant(vec![
            completed("c1", "getWeather", json!({"temperature": 18})),
            Part::text("It's 18°C in Tokyo."),
        ]);
        let out = to_model_messages(None, &[msg]);

        assert_eq!(out.len(), 3);
        match &out[0] {
            ModelMessage::Assistant { content, tool_calls } => {
                assert!(content.is_empty());
                assert_eq!(tool_calls[0].tool_name, "getWeather");
            }
            other => panic!("expected assistant turn, got {other:?}"),
        }
        assert_eq!(
            out[1],
            ModelMessage::Tool {
                call_id: "c1".to_string(),
                content: r#"{"temperature":18}"#.to_string()
            }
        );
        assert_eq!(
            out[2],
            ModelMessage::Assistant {
                content: "It's 18°C in Tokyo.".to_string(),
                tool_calls: vec![]
            }
        );
    }

    #[test]
    fn test_pending_calls_are_skipped() {
        let msg = assistant(vec![
            Part::text("Checking"),
            Part::ToolCall(ToolCallPart::pending("c1", "getWeather", json!({}))),
        ]);
        let out = to_model_messages(None, &[msg]);
        assert_eq!(
            out,
            vec![ModelMessage::Assistant {
                content: "Checking".to_string(),
                tool_calls: vec![]
            }]
        );
    }
}
