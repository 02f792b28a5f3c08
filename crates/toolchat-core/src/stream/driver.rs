//! Pumping an inference stream into an aggregator.
//!
//! The pump races three things: teardown (the cancellation token), the
//! wall-clock deadline, and the next event. Returning drops the stream,
//! which aborts the underlying read.

use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use toolchat_types::error::InferenceError;
use toolchat_types::stream::InferenceEvent;
use tracing::{debug, info, warn};

use crate::llm::provider::InferenceStream;
use crate::stream::aggregator::{Applied, StreamAggregator};

/// How a driven stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// A `Finish` event arrived; status is `Ready`.
    Completed,
    /// An `Error` event, a transport error, or an early end of stream.
    Failed(String),
    /// The wall-clock limit elapsed before a terminal event.
    TimedOut,
    /// The owning conversation was torn down.
    Cancelled,
}

/// Receives every event after it has been applied.
///
/// Renderers implement this to draw incrementally.
pub trait StreamObserver {
    fn on_event(&mut self, _event: &InferenceEvent, _state: &StreamAggregator) {}
}

impl StreamObserver for () {}

/// Feed `stream` into `aggregator` until it ends, fails, times out, or is
/// cancelled.
pub async fn drive<O: StreamObserver + ?Sized>(
    aggregator: &mut StreamAggregator,
    mut stream: InferenceStream,
    cancel: &CancellationToken,
    limit: Duration,
    observer: &mut O,
) -> StreamEnd {
    let deadline = tokio::time::sleep(limit);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Stream cancelled by teardown");
                aggregator.fail("cancelled");
                return StreamEnd::Cancelled;
            }
            _ = &mut deadline => {
                let err = InferenceError::Timeout { secs: limit.as_secs() };
                warn!(error = %err, "Stream timed out");
                aggregator.fail(err.to_string());
                return StreamEnd::TimedOut;
            }
            next = stream.next() => match next {
                Some(Ok(event)) => {
                    let applied = aggregator.apply(&event);
                    observer.on_event(&event, aggregator);
                    match applied {
                        Applied::Completed => {
                            debug!("Stream finished");
                            return StreamEnd::Completed;
                        }
                        Applied::Failed => {
                            let reason = aggregator.last_error().unwrap_or_default().to_string();
                            warn!(error = %reason, "Stream reported an error");
                            return StreamEnd::Failed(reason);
                        }
                        Applied::Changed | Applied::Ignored => {}
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Stream transport error");
                    aggregator.fail(e.to_string());
                    return StreamEnd::Failed(e.to_string());
                }
                None => {
                    let reason = "stream ended without a completion marker".to_string();
                    warn!("{reason}");
                    aggregator.fail(reason.clone());
                    return StreamEnd::Failed(reason);
                }
            }
        }
    }
}
