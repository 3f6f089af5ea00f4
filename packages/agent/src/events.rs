//! Agent event stream and the diagnostic observer.
//!
//! Every inbound message the agent processes is published on a broadcast
//! bus. The lifecycle attaches one observer at Ready that forwards each
//! event's serialized payload to a debug-level [`MessageSink`]. Delivery is
//! asynchronous: an observer may still be handling one event while the
//! next inbound message is being processed. Observers never mutate agent
//! state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use tessera::AgentMessage;

use crate::modules::Capability;

/// Bounded capacity of the event bus. A slow observer past this many
/// undelivered events starts losing the oldest ones (diagnostics are
/// best-effort; protocol processing is never back-pressured by them).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// An event published by the agent.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// An inbound message made it through dispatch.
    MessageProcessed {
        message: AgentMessage,
        /// The capability whose handlers matched the message type, when any.
        handled_by: Option<Capability>,
        received_at: DateTime<Utc>,
    },
}

/// The agent's broadcast event bus.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: AgentEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    /// Subscribe as a `Stream`, for consumers that compose with other
    /// stream combinators.
    pub fn stream(&self) -> BroadcastStream<AgentEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// MessageSink
// ---------------------------------------------------------------------------

/// Where the observer forwards processed-message payloads.
///
/// Injected explicitly by the caller of `create_agent` rather than read
/// from process-global logging state. Implementations must not block and
/// must not panic; the observer offers no recovery path for a sink that
/// does.
pub trait MessageSink: Send + Sync + 'static {
    fn message_processed(&self, payload: &str);
}

/// Default sink: forwards payloads to the `tracing` subscriber at debug
/// level.
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn message_processed(&self, payload: &str) {
        tracing::debug!("processed inbound message: {payload}");
    }
}

/// Spawn the observer task: drains the bus and forwards each event to the
/// sink. Lagged gaps are skipped — diagnostics never abort the stream.
/// Returns the task handle so the agent can stop it at shutdown.
pub fn spawn_observer(
    bus: &EventBus,
    sink: Arc<dyn MessageSink>,
) -> tokio::task::JoinHandle<()> {
    use tokio_stream::StreamExt;

    let mut stream = bus.stream();
    tokio::spawn(async move {
        // The stream ends when the bus (and with it the agent) is dropped.
        while let Some(item) = stream.next().await {
            match item {
                Ok(AgentEvent::MessageProcessed { message, .. }) => {
                    match serde_json::to_string(&message) {
                        Ok(payload) => sink.message_processed(&payload),
                        Err(e) => tracing::warn!("could not serialize processed message: {e}"),
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event observer lagged; skipping");
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records payloads for assertions.
    struct RecordingSink(Mutex<Vec<String>>);

    impl MessageSink for RecordingSink {
        fn message_processed(&self, payload: &str) {
            self.0.lock().unwrap().push(payload.to_string());
        }
    }

    fn event(msg_type: &str) -> AgentEvent {
        AgentEvent::MessageProcessed {
            message: AgentMessage::new(msg_type),
            handled_by: Some(Capability::Credentials),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn observer_forwards_serialized_payloads_in_order() {
        let bus = EventBus::new();
        let sink = Arc::new(RecordingSink(Mutex::new(vec![])));
        let handle = spawn_observer(&bus, Arc::clone(&sink) as Arc<dyn MessageSink>);

        bus.publish(event("https://didcomm.org/issue-credential/1.0/offer-credential"));
        bus.publish(event("https://didcomm.org/issue-credential/2.0/offer-credential"));

        // Give the observer task a turn to drain.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let seen = sink.0.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("issue-credential/1.0"));
        assert!(seen[1].contains("issue-credential/2.0"));

        handle.abort();
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_error() {
        let bus = EventBus::new();
        bus.publish(event("https://didcomm.org/trust-ping/1.0/ping"));
    }

    #[tokio::test]
    async fn observer_exits_when_bus_is_dropped() {
        let bus = EventBus::new();
        let sink = Arc::new(RecordingSink(Mutex::new(vec![])));
        let handle = spawn_observer(&bus, sink as Arc<dyn MessageSink>);

        drop(bus);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("observer task should finish")
            .unwrap();
    }
}
