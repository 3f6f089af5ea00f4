//! Transport seams and inbound message dispatch.
//!
//! Transports are opaque collaborators: the agent registers them, starts
//! inbound ones during initialize, and hands each a [`MessageDispatcher`]
//! to deliver received messages through. The dispatcher is the only way
//! into the agent from a transport, which is what guarantees no message
//! reaches protocol handlers before initialize has wired them up.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use tessera::AgentMessage;

use crate::events::{AgentEvent, EventBus};
use crate::modules::{Capability, ModuleSet};

/// Errors transports can return from their lifecycle hooks.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind inbound transport: {0}")]
    Bind(String),

    #[error("failed to deliver outbound message: {0}")]
    Send(String),
}

/// Transport endpoints plus the transport instances to register.
pub struct TransportConfig {
    /// Endpoint URLs advertised to peers, in preference order.
    pub endpoints: Vec<String>,
    pub inbound: Vec<Box<dyn InboundTransport>>,
    pub outbound: Vec<Box<dyn OutboundTransport>>,
}

impl TransportConfig {
    /// No transports; endpoints only. Useful for composition-level tests.
    pub fn none() -> Self {
        Self {
            endpoints: vec![],
            inbound: vec![],
            outbound: vec![],
        }
    }
}

/// A listener that receives protocol messages from peers.
#[async_trait]
pub trait InboundTransport: Send + Sync {
    /// Begin accepting messages, delivering each through `dispatcher`.
    /// Called once, during agent initialize.
    async fn start(&mut self, dispatcher: MessageDispatcher) -> Result<(), TransportError>;

    /// Stop accepting messages. Called at agent shutdown.
    async fn stop(&mut self) -> Result<(), TransportError>;
}

/// A sender that delivers protocol messages to peer endpoints.
#[async_trait]
pub trait OutboundTransport: Send + Sync {
    /// URL schemes this transport can deliver to, e.g. `["http", "https"]`.
    fn supported_schemes(&self) -> &'static [&'static str];

    async fn send(&self, endpoint: &str, message: &AgentMessage) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// MessageDispatcher
// ---------------------------------------------------------------------------

/// Routes an inbound message to the capability whose protocol handlers
/// recognize its type, then publishes the processed event.
///
/// Cheap to clone: after Ready the module set is a read-mostly set of
/// capability handles, so transports share it through an `Arc`.
#[derive(Clone)]
pub struct MessageDispatcher {
    modules: Arc<ModuleSet>,
    events: EventBus,
}

impl MessageDispatcher {
    pub fn new(modules: Arc<ModuleSet>, events: EventBus) -> Self {
        Self { modules, events }
    }

    /// Deliver one inbound message. Returns the capability that handled
    /// it, or `None` for message types outside every registered protocol
    /// (still published, so the harness can observe unexpected traffic).
    pub fn dispatch(&self, message: AgentMessage) -> Option<Capability> {
        let message_type = message.message_type.as_str();
        let handled_by = if self.modules.mediator.handles(message_type) {
            Some(Capability::Mediator)
        } else if self.modules.credentials.handles(message_type) {
            Some(Capability::Credentials)
        } else if self.modules.proofs.handles(message_type) {
            Some(Capability::Proofs)
        } else {
            None
        };

        match handled_by {
            Some(capability) => {
                tracing::debug!(%capability, msg_type = %message_type, "dispatched inbound message")
            }
            None => {
                tracing::warn!(msg_type = %message_type, "no handler for inbound message type")
            }
        }

        self.events.publish(AgentEvent::MessageProcessed {
            message,
            handled_by,
            received_at: Utc::now(),
        });
        handled_by
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::backend::compose;
    use crate::wallet::MemoryWallet;
    use tessera::NetworkConfig;

    fn dispatcher(events: EventBus) -> MessageDispatcher {
        let network = NetworkConfig::new(
            "main-pool",
            false,
            r#"{"txn":{"data":{"data":{"alias":"Node1"}},"type":"0"}}"#,
        );
        let modules = compose(false, &network, Arc::new(MemoryWallet::new()), "p").unwrap();
        MessageDispatcher::new(Arc::new(modules), events)
    }

    #[tokio::test]
    async fn routes_each_family_to_its_capability() {
        let d = dispatcher(EventBus::new());
        assert_eq!(
            d.dispatch(AgentMessage::new("https://didcomm.org/issue-credential/2.0/offer-credential")),
            Some(Capability::Credentials)
        );
        assert_eq!(
            d.dispatch(AgentMessage::new("https://didcomm.org/present-proof/1.0/request-presentation")),
            Some(Capability::Proofs)
        );
        assert_eq!(
            d.dispatch(AgentMessage::new("https://didcomm.org/coordinate-mediation/1.0/mediate-request")),
            Some(Capability::Mediator)
        );
    }

    #[tokio::test]
    async fn unknown_type_is_published_unhandled() {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let d = dispatcher(events);

        let handled = d.dispatch(AgentMessage::new("https://didcomm.org/basicmessage/1.0/message"));
        assert_eq!(handled, None);

        match rx.recv().await.unwrap() {
            AgentEvent::MessageProcessed { handled_by, .. } => assert_eq!(handled_by, None),
        }
    }

    #[tokio::test]
    async fn dispatch_publishes_events_in_processing_order() {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let d = dispatcher(events);

        d.dispatch(AgentMessage::new("https://didcomm.org/issue-credential/1.0/offer-credential"));
        d.dispatch(AgentMessage::new("https://didcomm.org/present-proof/2.0/request-presentation"));

        let AgentEvent::MessageProcessed { message: m1, .. } = rx.recv().await.unwrap();
        let AgentEvent::MessageProcessed { message: m2, .. } = rx.recv().await.unwrap();
        assert!(m1.message_type.contains("issue-credential"));
        assert!(m2.message_type.contains("present-proof"));
    }
}
