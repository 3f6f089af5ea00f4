//! The DIDComm-style message envelope.
//!
//! Transports hand the agent [`AgentMessage`] values; protocol handlers are
//! matched on [`AgentMessage::message_type`]. The protocol state machines
//! themselves live outside this workspace — the envelope is the boundary
//! type between transports, dispatch, and the external test harness.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single protocol message as carried on the wire.
///
/// Field names follow the DIDComm v1 plaintext convention: `@id` and
/// `@type` are the envelope header, `~thread` carries the protocol thread
/// identifier, and any remaining fields are collected into `body`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMessage {
    /// Unique message id. UUIDv7 so ids sort in creation order.
    #[serde(rename = "@id")]
    pub id: String,

    /// Protocol message type URI, e.g.
    /// `https://didcomm.org/issue-credential/2.0/offer-credential`.
    #[serde(rename = "@type")]
    pub message_type: String,

    /// Protocol thread id. Messages with the same thread id belong to the
    /// same protocol exchange, regardless of which protocol version the
    /// exchange was started under.
    #[serde(rename = "~thread", default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadDecorator>,

    /// Sender DID, when the transport layer could establish it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Recipient DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// All remaining message fields, preserved verbatim.
    #[serde(flatten)]
    pub body: HashMap<String, Value>,
}

/// The `~thread` decorator: ties a message to a protocol exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadDecorator {
    /// Id of the first message in the exchange.
    pub thid: String,
}

impl AgentMessage {
    /// Create a message with a fresh UUIDv7 id and an empty body.
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            message_type: message_type.into(),
            thread: None,
            from: None,
            to: None,
            body: HashMap::new(),
        }
    }

    /// The thread id, falling back to the message id for the first message
    /// of an exchange (DIDComm v1 threading rule).
    pub fn thread_id(&self) -> &str {
        self.thread.as_ref().map(|t| t.thid.as_str()).unwrap_or(&self.id)
    }

    /// The protocol family prefix of the type URI, without the version and
    /// message-name segments. `https://didcomm.org/issue-credential/2.0/offer`
    /// → `https://didcomm.org/issue-credential`.
    pub fn protocol_family(&self) -> &str {
        let uri = self.message_type.as_str();
        // Strip the trailing `/<version>/<name>` segments if present.
        match uri.rsplitn(3, '/').nth(2) {
            Some(head) => head,
            None => uri,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
