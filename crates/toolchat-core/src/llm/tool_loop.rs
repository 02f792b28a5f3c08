//! ToolLoopProvider: a multi-step tool-calling loop over a `ModelClient`.
//!
//! Each step streams one model turn. If the turn requested tools, they run
//! through the catalog, their results are appended to the model history, and
//! the next step begins. The loop stops when a turn requests no tools or the
//! step limit is reached, then emits `Finish`.

use std::sync::Arc;

use futures_util::StreamExt;
use toolchat_types::llm::{ModelEvent, ModelMessage, ModelRequest};
use toolchat_types::message::MessageId;
use toolchat_types::stream::InferenceEvent;
use tracing::debug;

use crate::llm::history::to_model_messages;
use crate::llm::provider::{InferenceProvider, InferenceStream, ModelClient};
use crate::tool::catalog::ToolCatalog;

pub struct ToolLoopProvider {
    client: Arc<dyn ModelClient>,
    catalog: Arc<ToolCatalog>,
    max_steps: u32,
    name: String,
}

impl ToolLoopProvider {
    pub fn new(client: Arc<dyn ModelClient>, catalog: Arc<ToolCatalog>, max_steps: u32) -> Self {
        let name = format!("{} (tools: {})", client.name(), catalog.len());
        Self {
            client,
            catalog,
            max_steps: max_steps.max(1),
            name,
        }
    }
}

impl InferenceProvider for ToolLoopProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream(&self, request: toolchat_types::llm::ChatRequest) -> InferenceStream {
        let client = Arc::clone(&self.client);
        let catalog = Arc::clone(&self.catalog);
        let max_steps = self.max_steps;

        Box::pin(async_stream::try_stream! {
            yield InferenceEvent::MessageStart { message_id: MessageId::generate() };

            let mut history = to_model_messages(request.system.as_deref(), &request.messages);

            for step in 1..=max_steps {
                let mut turn = client.stream_turn(ModelRequest {
                    messages: history.clone(),
                    tools: request.tools.clone(),
                });

                let mut text = String::new();
                let mut calls = Vec::new();
                while let Some(event) = turn.next().await {
                    match event? {
                        ModelEvent::TextDelta { text: delta } => {
                            text.push_str(&delta);
                            yield InferenceEvent::TextDelta { text: delta };
                        }
                        ModelEvent::ToolCallRequested(call) => {
                            yield InferenceEvent::ToolCallStart {
                                call_id: call.call_id.clone(),
                                tool_name: call.tool_name.clone(),
                                arguments: call.arguments.clone(),
                            };
                            calls.push(call);
                        }
                        ModelEvent::Finished { reason } => {
                            debug!(step, %reason, "Model turn finished");
                        }
                    }
                }

                if calls.is_empty() {
                    break;
                }

                history.push(ModelMessage::Assistant {
                    content: text,
                    tool_calls: calls.clone(),
                });
                for call in calls {
                    let result = catalog.execute(&call.tool_name, call.arguments).await.into_value();
                    history.push(ModelMessage::Tool {
                        call_id: call.call_id.clone(),
                        content: result.to_string(),
                    });
                    yield InferenceEvent::ToolCallResult {
                        call_id: call.call_id,
                        tool_name: call.tool_name,
                        result,
                    };
                }

                if step == max_steps {
                    debug!(max_steps, "Step limit reached with tool results pending a reply");
                }
            }

            yield InferenceEvent::Finish;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use futures_util::stream;
    use serde_json::{Value, json};
    use toolchat_types::error::{InferenceError, ToolError};
    use toolchat_types::llm::{ChatRequest, FinishReason, ModelToolCall};
    use toolchat_types::message::RichMessage;
    use toolchat_types::tool::{ToolDefinition, ToolOutput};

    use crate::llm::provider::ModelStream;
    use crate::tool::catalog::Tool;

    /// Replays one scripted turn per call and records the requests.
    struct ScriptedModel {
        turns: Mutex<Vec<Vec<Result<ModelEvent, InferenceError>>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(mut turns: Vec<Vec<Result<ModelEvent, InferenceError>>>) -> Self {
            turns.reverse();
            Self {
                turns: Mutex::new(turns),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ModelClient for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        fn stream_turn(&self, request: ModelRequest) -> ModelStream {
            self.requests.lock().unwrap().push(request);
            let turn = self.turns.lock().unwrap().pop().unwrap_or_default();
            Box::pin(stream::iter(turn))
        }
    }

    struct FixedWeather {
        def: ToolDefinition,
    }

    impl Tool for FixedWeather {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _arguments: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::Success(json!({"temperature": 18})))
        }
    }

    fn catalog() -> Arc<ToolCatalog> {
        Arc::new(ToolCatalog::new().with(FixedWeather {
            def: ToolDefinition {
                name: "getWeather".to_string(),
                description: "weather".to_string(),
                parameters: json!({"type": "object"}),
            },
        }))
    }

    fn weather_call() -> ModelEvent {
        ModelEvent::ToolCallRequested(ModelToolCall {
            call_id: "call_1".to_string(),
            tool_name: "getWeather".to_string(),
            arguments: json!({"location": "Tokyo"}),
        })
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system: Some("sys".to_string()),
            messages: vec![RichMessage::user("What's the weather in Tokyo?")],
            tools: catalog().definitions(),
        }
    }

    async fn collect(provider: &ToolLoopProvider) -> Vec<Result<InferenceEvent, InferenceError>> {
        provider.stream(request()).collect().await
    }

    #[tokio::test]
    async fn test_tool_round_then_answer() {
        let model = Arc::new(ScriptedModel::new(vec![
            vec![
                Ok(weather_call()),
                Ok(ModelEvent::Finished {
                    reason: FinishReason::ToolCalls,
                }),
            ],
            vec![
                Ok(ModelEvent::TextDelta {
                    text: "It's 18°C.".to_string(),
                }),
                Ok(ModelEvent::Finished {
                    reason: FinishReason::Stop,
                }),
            ],
        ]));
        let provider = ToolLoopProvider::new(model.clone(), catalog(), 3);

        let events: Vec<InferenceEvent> = collect(&provider)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert!(matches!(events[0], InferenceEvent::MessageStart { .. }));
        assert!(matches!(
            &events[1],
            InferenceEvent::ToolCallStart { call_id, .. } if call_id == "call_1"
        ));
        assert_eq!(
            events[2],
            InferenceEvent::ToolCallResult {
                call_id: "call_1".to_string(),
                tool_name: "getWeather".to_string(),
                result: json!({"temperature": 18}),
            }
        );
        assert_eq!(
            events[3],
            InferenceEvent::TextDelta {
                text: "It's 18°C.".to_string()
            }
        );
        assert_eq!(events[4], InferenceEvent::Finish);
        assert_eq!(events.len(), 5);

        // Second turn sees the call and its result.
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(matches!(
            requests[1].messages.last(),
            Some(ModelMessage::Tool { call_id, .. }) if call_id == "call_1"
        ));
    }

    #[tokio::test]
    async fn test_step_limit_stops_loop() {
        let turns = (0..5)
            .map(|_| {
                vec![
                    Ok(weather_call()),
                    Ok(ModelEvent::Finished {
                        reason: FinishReason::ToolCalls,
                    }),
                ]
            })
            .collect();
        let model = Arc::new(ScriptedModel::new(turns));
        let provider = ToolLoopProvider::new(model.clone(), catalog(), 2);

        let events = collect(&provider).await;
        assert_eq!(model.requests.lock().unwrap().len(), 2);
        assert!(matches!(events.last(), Some(Ok(InferenceEvent::Finish))));
    }

    #[tokio::test]
    async fn test_model_error_ends_stream_with_error() {
        let model = Arc::new(ScriptedModel::new(vec![vec![
            Ok(ModelEvent::TextDelta {
                text: "Hel".to_string(),
            }),
            Err(InferenceError::Stream("connection reset".to_string())),
        ]]));
        let provider = ToolLoopProvider::new(model, catalog(), 3);

        let events = collect(&provider).await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], Err(InferenceError::Stream(_))));
    }
}
