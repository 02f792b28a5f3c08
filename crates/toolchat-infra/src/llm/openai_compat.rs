//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint speaking the `/chat/completions` streaming
//! protocol (Gemini's OpenAI endpoint, OpenAI, OpenRouter, local servers).
//! Each SSE `data:` line is a JSON chunk; `[DONE]` ends the stream. Tool
//! call arguments arrive as string fragments keyed by call index and are
//! assembled before the call is reported.

use std::collections::BTreeMap;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolchat_core::llm::provider::{ModelClient, ModelStream};
use toolchat_types::config::ModelConfig;
use toolchat_types::error::InferenceError;
use toolchat_types::llm::{FinishReason, ModelEvent, ModelMessage, ModelRequest, ModelToolCall};
use toolchat_types::tool::ToolDefinition;
use uuid::Uuid;

/// Connect timeout; the overall stream deadline is enforced by the caller.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    name: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &ModelConfig, api_key: SecretString) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| InferenceError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            name: config.model.clone(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl ModelClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream_turn(&self, request: ModelRequest) -> ModelStream {
        let client = self.client.clone();
        let url = self.completions_url();
        let body = build_request_body(&self.model, &request);
        let auth = format!("Bearer {}", self.api_key.expose_secret());

        Box::pin(async_stream::try_stream! {
            tracing::debug!(url = %url, messages = request.messages.len(), "Sending chat completion request");

            let response = client
                .post(&url)
                .header(reqwest::header::AUTHORIZATION, auth)
                .json(&body)
                .send()
                .await
                .map_err(|e| InferenceError::Provider { message: format!("request failed: {e}") })?;

            let status = response.status();
            if !status.is_success() {
                let retry_after_ms = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|secs| secs * 1000);
                let text = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "Chat completion request rejected");
                Err::<(), _>(map_http_error(status.as_u16(), &text, retry_after_ms))?;
                return;
            }

            let mut events = response.bytes_stream().eventsource();
            let mut assembler = TurnAssembler::default();

            while let Some(event) = events.next().await {
                let event = event.map_err(|e| InferenceError::Stream(e.to_string()))?;
                if event.data.trim() == "[DONE]" {
                    break;
                }
                let chunk: ChatChunk = serde_json::from_str(&event.data)
                    .map_err(|e| InferenceError::Deserialization(format!("{e}: {}", event.data)))?;
                for model_event in assembler.push(chunk)? {
                    yield model_event;
                }
            }

            for model_event in assembler.finish()? {
                yield model_event;
            }
        })
    }
}

fn map_http_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> InferenceError {
    match status {
        401 | 403 => InferenceError::AuthenticationFailed,
        429 => InferenceError::RateLimited { retry_after_ms },
        400 | 404 | 422 => InferenceError::InvalidRequest(format!("HTTP {status}: {body}")),
        _ => InferenceError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Request wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    stream: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum WireMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<WireToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

fn build_request_body(model: &str, request: &ModelRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: request.messages.iter().map(to_wire_message).collect(),
        tools: request.tools.iter().map(to_wire_tool).collect(),
        stream: true,
    }
}

fn to_wire_message(message: &ModelMessage) -> WireMessage {
    match message {
        ModelMessage::System { content } => WireMessage::System {
            content: content.clone(),
        },
        ModelMessage::User { content } => WireMessage::User {
            content: content.clone(),
        },
        ModelMessage::Assistant {
            content,
            tool_calls,
        } => WireMessage::Assistant {
            content: (!content.is_empty()).then(|| content.clone()),
            tool_calls: tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.call_id.clone(),
                    kind: "function",
                    function: WireFunctionCall {
                        name: call.tool_name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect(),
        },
        ModelMessage::Tool { call_id, content } => WireMessage::Tool {
            tool_call_id: call_id.clone(),
            content: content.clone(),
        },
    }
}

fn to_wire_tool(tool: &ToolDefinition) -> WireTool {
    WireTool {
        kind: "function",
        function: WireFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

// ---------------------------------------------------------------------------
// Response wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallDelta>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

// ---------------------------------------------------------------------------
// Turn assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Folds chunks of one turn into model events.
///
/// Text is passed through as it arrives. Tool calls are held until the turn
/// ends, since their arguments are only valid JSON once complete.
#[derive(Debug, Default)]
struct TurnAssembler {
    calls: BTreeMap<usize, PartialCall>,
    finish_reason: Option<FinishReason>,
}

impl TurnAssembler {
    fn push(&mut self, chunk: ChatChunk) -> Result<Vec<ModelEvent>, InferenceError> {
        if let Some(error) = chunk.error {
            return Err(InferenceError::Provider {
                message: error.message,
            });
        }

        let mut events = Vec::new();
        for choice in chunk.choices {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                events.push(ModelEvent::TextDelta { text });
            }
            for (position, delta) in choice.delta.tool_calls.into_iter().enumerate() {
                let index = delta.index.unwrap_or(position);
                let call = self.calls.entry(index).or_default();
                if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
                    call.id = Some(id);
                }
                if let Some(function) = delta.function {
                    if let Some(name) = function.name {
                        call.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        call.arguments.push_str(&arguments);
                    }
                }
            }
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = Some(reason.parse().unwrap_or_else(|e: String| {
                    tracing::debug!(error = %e, "Unrecognized finish reason, treating as stop");
                    FinishReason::Stop
                }));
            }
        }
        Ok(events)
    }

    fn finish(self) -> Result<Vec<ModelEvent>, InferenceError> {
        let mut events = Vec::with_capacity(self.calls.len() + 1);
        let has_calls = !self.calls.is_empty();

        for call in self.calls.into_values() {
            let arguments = if call.arguments.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(&call.arguments).map_err(|e| {
                    InferenceError::Deserialization(format!(
                        "tool call '{}' arguments: {e}",
                        call.name
                    ))
                })?
            };
            events.push(ModelEvent::ToolCallRequested(ModelToolCall {
                call_id: call.id.unwrap_or_else(fallback_call_id),
                tool_name: call.name,
                arguments,
            }));
        }

        let reason = match self.finish_reason {
            Some(reason) => reason,
            None if has_calls => FinishReason::ToolCalls,
            None => FinishReason::Stop,
        };
        events.push(ModelEvent::Finished { reason });
        Ok(events)
    }
}

/// Id for a call the server sent without one. Must stay unique across the
/// turns of one reply, so it is not derived from the call index.
fn fallback_call_id() -> String {
    format!("call_{}", Uuid::now_v7().simple())
}
