//! StreamAggregator: the live message list and the exchange status.
//!
//! Events are folded into the in-flight assistant message by append or
//! merge only. Nothing already applied is deleted or reordered, and once the
//! exchange reaches `Ready` or `Errored` every further event is ignored.

use toolchat_types::chat::MessageRole;
use toolchat_types::message::{MessageId, Part, RichMessage, ToolCallPart};
use toolchat_types::stream::{InferenceEvent, StreamStatus};
use tracing::debug;

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The message list or status changed.
    Changed,
    /// The event was a no-op (late, duplicate, or redundant).
    Ignored,
    /// The exchange completed normally; status is now `Ready`.
    Completed,
    /// The exchange failed; status is now `Errored`.
    Failed,
}

#[derive(Debug, Default)]
pub struct StreamAggregator {
    messages: Vec<RichMessage>,
    status: StreamStatus,
    /// Index of the assistant message being built by the open exchange.
    in_flight: Option<usize>,
    last_error: Option<String>,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted history.
    pub fn hydrate(messages: Vec<RichMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[RichMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&RichMessage> {
        self.messages.last()
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The assistant message of the current exchange, if one has started.
    pub fn in_flight(&self) -> Option<&RichMessage> {
        self.in_flight.and_then(|i| self.messages.get(i))
    }

    /// Append a user message and open a new exchange.
    pub fn submit(&mut self, text: impl Into<String>) -> &RichMessage {
        self.in_flight = None;
        self.last_error = None;
        self.status = StreamStatus::Submitted;
        self.messages.push(RichMessage::user(text));
        let index = self.messages.len() - 1;
        &self.messages[index]
    }

    /// Fold one event into the live state.
    pub fn apply(&mut self, event: &InferenceEvent) -> Applied {
        if !self.status.is_busy() {
            debug!(status = %self.status, "Ignoring event outside an open exchange");
            return Applied::Ignored;
        }
        if self.status == StreamStatus::Submitted {
            self.status = StreamStatus::Streaming;
        }

        match event {
            InferenceEvent::MessageStart { message_id } => self.start_message(message_id),
            InferenceEvent::TextDelta { text } => {
                let message = self.assistant_mut();
                match message.parts.last_mut() {
                    Some(Part::Text { text: current }) => current.push_str(text),
                    _ => message.parts.push(Part::text(text.clone())),
                }
                Applied::Changed
            }
            InferenceEvent::ToolCallStart {
                call_id,
                tool_name,
                arguments,
            } => {
                let message = self.assistant_mut();
                match message.tool_call_mut(call_id) {
                    Some(existing) if existing.is_completed() => Applied::Ignored,
                    Some(existing) => {
                        existing.arguments = arguments.clone();
                        Applied::Changed
                    }
                    None => {
                        message.parts.push(Part::ToolCall(ToolCallPart::pending(
                            call_id.clone(),
                            tool_name.clone(),
                            arguments.clone(),
                        )));
                        Applied::Changed
                    }
                }
            }
            InferenceEvent::ToolCallResult {
                call_id,
                tool_name,
                result,
            } => {
                let message = self.assistant_mut();
                if let Some(existing) = message.tool_call_mut(call_id) {
                    if existing.complete(result.clone()) {
                        Applied::Changed
                    } else {
                        debug!(call_id, "Duplicate tool result ignored");
                        Applied::Ignored
                    }
                } else {
                    let mut call = ToolCallPart::pending(
                        call_id.clone(),
                        tool_name.clone(),
                        serde_json::Value::Object(Default::default()),
                    );
                    call.complete(result.clone());
                    message.parts.push(Part::ToolCall(call));
                    Applied::Changed
                }
            }
            InferenceEvent::Finish => {
                self.status = StreamStatus::Ready;
                Applied::Completed
            }
            InferenceEvent::Error { message } => {
                self.status = StreamStatus::Errored;
                self.last_error = Some(message.clone());
                Applied::Failed
            }
        }
    }

    /// Mark the open exchange as failed. No-op once terminal.
    ///
    /// Parts already received stay in place.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = StreamStatus::Errored;
        self.last_error = Some(reason.into());
        true
    }

    /// Take back a submitted user message that never reached storage, and
    /// mark the exchange failed.
    ///
    /// Only the message just added by [`submit`](Self::submit) qualifies, and
    /// only before any event for it was applied. Returns whether it was removed.
    pub fn retract_unsent(&mut self, message_id: &MessageId, reason: impl Into<String>) -> bool {
        let unsent = self.status == StreamStatus::Submitted
            && self.in_flight.is_none()
            && self
                .last_message()
                .is_some_and(|m| m.role == MessageRole::User && &m.id == message_id);
        if !unsent {
            return false;
        }
        self.messages.pop();
        self.status = StreamStatus::Errored;
        self.last_error = Some(reason.into());
        true
    }

    fn start_message(&mut self, message_id: &MessageId) -> Applied {
        match self.in_flight {
            None => {
                self.messages.push(RichMessage::assistant(message_id.clone()));
                self.in_flight = Some(self.messages.len() - 1);
                Applied::Changed
            }
            // Adopt the announced identity while nothing has been built yet.
            Some(index) if self.messages[index].parts.is_empty() => {
                self.messages[index].id = message_id.clone();
                Applied::Changed
            }
            Some(_) => Applied::Ignored,
        }
    }

    fn assistant_mut(&mut self) -> &mut RichMessage {
        let index = match self.in_flight {
            Some(index) => index,
            None => {
                self.messages.push(RichMessage::assistant(MessageId::generate()));
                let index = self.messages.len() - 1;
                self.in_flight = Some(index);
                index
            }
        };
        &mut self.messages[index]
    }
}

impl StreamAggregator {
    /// Whether the last message is a finished assistant reply.
    pub fn has_completed_reply(&self) -> bool {
        self.status == StreamStatus::Ready
            && self
                .last_message()
                .is_some_and(|m| m.role == MessageRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(t: &str) -> InferenceEvent {
        InferenceEvent::TextDelta {
            text: t.to_string(),
        }
    }

    fn start(id: &str) -> InferenceEvent {
        InferenceEvent::MessageStart {
            message_id: MessageId::from(id),
        }
    }

    fn open() -> StreamAggregator {
        let mut agg = StreamAggregator::new();
        agg.submit("What's the weather in Tokyo?");
        agg
    }

    #[test]
    fn test_submit_opens_exchange() {
        let agg = open();
        assert_eq!(agg.status(), StreamStatus::Submitted);
        assert_eq!(agg.messages().len(), 1);
        assert_eq!(agg.messages()[0].role, MessageRole::User);
    }

    #[test]
    fn test_first_event_moves_to_streaming() {
        let mut agg = open();
        agg.apply(&start("a1"));
        assert_eq!(agg.status(), StreamStatus::Streaming);
        assert_eq!(agg.in_flight().unwrap().id, MessageId::from("a1"));
    }

    #[test]
    fn test_text_deltas_merge_into_one_part() {
        let mut agg = open();
        agg.apply(&start("a1"));
        agg.apply(&text("It's "));
        agg.apply(&text("sunny."));
        let msg = agg.in_flight().unwrap();
        assert_eq!(msg.parts, vec![Part::text("It's sunny.")]);
    }

    #[test]
    fn test_text_without_message_start_creates_message() {
        let mut agg = open();
        agg.apply(&text("Hi"));
        let msg = agg.in_flight().unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.text(), "Hi");
    }

    #[test]
    fn test_tool_lifecycle_keeps_part_order() {
        let mut agg = open();
        agg.apply(&start("a1"));
        agg.apply(&text("Let me check. "));
        agg.apply(&InferenceEvent::ToolCallStart {
            call_id: "c1".to_string(),
            tool_name: "getWeather".to_string(),
            arguments: json!({"location": "Tokyo"}),
        });
        agg.apply(&InferenceEvent::ToolCallResult {
            call_id: "c1".to_string(),
            tool_name: "getWeather".to_string(),
            result: json!({"temperature": 18}),
        });
        agg.apply(&text("It's 18°C."));

        let parts = &agg.in_flight().unwrap().parts;
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], Part::text("Let me check. "));
        let call = parts[1].as_tool_call().unwrap();
        assert!(call.is_completed());
        assert_eq!(call.arguments, json!({"location": "Tokyo"}));
        assert_eq!(parts[2], Part::text("It's 18°C."));
    }

    #[test]
    fn test_duplicate_tool_result_ignored() {
        let mut agg = open();
        let result = |v| InferenceEvent::ToolCallResult {
            call_id: "c1".to_string(),
            tool_name: "getWeather".to_string(),
            result: json!(v),
        };
        assert_eq!(agg.apply(&result(1)), Applied::Changed);
        assert_eq!(agg.apply(&result(2)), Applied::Ignored);
        let call = agg.in_flight().unwrap().tool_calls().next().unwrap().clone();
        assert_eq!(call.result, Some(json!(1)));
    }

    #[test]
    fn test_finish_then_late_events_ignored() {
        let mut agg = open();
        agg.apply(&text("Done"));
        assert_eq!(agg.apply(&InferenceEvent::Finish), Applied::Completed);
        assert_eq!(agg.status(), StreamStatus::Ready);

        assert_eq!(agg.apply(&text(" and more")), Applied::Ignored);
        assert_eq!(agg.apply(&InferenceEvent::Finish), Applied::Ignored);
        assert_eq!(agg.last_message().unwrap().text(), "Done");
        assert!(agg.has_completed_reply());
    }

    #[test]
    fn test_error_keeps_partial_parts() {
        let mut agg = open();
        agg.apply(&text("Partial"));
        let outcome = agg.apply(&InferenceEvent::Error {
            message: "upstream closed".to_string(),
        });
        assert_eq!(outcome, Applied::Failed);
        assert_eq!(agg.status(), StreamStatus::Errored);
        assert_eq!(agg.last_error(), Some("upstream closed"));
        assert_eq!(agg.last_message().unwrap().text(), "Partial");
        assert!(!agg.has_completed_reply());
    }

    #[test]
    fn test_fail_is_noop_when_terminal() {
        let mut agg = open();
        agg.apply(&InferenceEvent::Finish);
        assert!(!agg.fail("late timeout"));
        assert_eq!(agg.status(), StreamStatus::Ready);
    }

    #[test]
    fn test_events_before_submit_ignored() {
        let mut agg = StreamAggregator::new();
        assert_eq!(agg.apply(&text("stray")), Applied::Ignored);
        assert!(agg.messages().is_empty());
    }

    #[test]
    fn test_retract_unsent_removes_only_the_new_user_message() {
        let mut agg = StreamAggregator::new();
        agg.submit("first");
        agg.apply(&text("answer"));
        agg.apply(&InferenceEvent::Finish);

        let id = agg.submit("second").id.clone();
        assert!(agg.retract_unsent(&id, "write failed"));
        assert_eq!(agg.messages().len(), 2);
        assert_eq!(agg.last_message().unwrap().text(), "answer");
        assert_eq!(agg.status(), StreamStatus::Errored);
        assert_eq!(agg.last_error(), Some("write failed"));
    }

    #[test]
    fn test_retract_unsent_refuses_once_streaming() {
        let mut agg = StreamAggregator::new();
        let id = agg.submit("hello").id.clone();
        agg.apply(&text("Hi"));
        assert!(!agg.retract_unsent(&id, "too late"));
        assert_eq!(agg.messages().len(), 2);
        assert_eq!(agg.status(), StreamStatus::Streaming);
    }

    #[test]
    fn test_late_message_start_does_not_rename_started_message() {
        let mut agg = open();
        agg.apply(&text("Hi"));
        let id = agg.in_flight().unwrap().id.clone();
        assert_eq!(agg.apply(&start("other")), Applied::Ignored);
        assert_eq!(agg.in_flight().unwrap().id, id);
    }
}
