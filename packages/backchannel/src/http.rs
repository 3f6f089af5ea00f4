//! HTTP transports.
//!
//! The inbound transport is a small axum server accepting protocol
//! messages as JSON `POST` bodies on `/`; every accepted message goes
//! straight into the agent's [`MessageDispatcher`]. The outbound transport
//! posts messages to peer endpoints with a pooled `reqwest` client.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tower_http::trace::TraceLayer;

use tessera::AgentMessage;
use tessera_agent::{InboundTransport, MessageDispatcher, OutboundTransport, TransportError};

// ---------------------------------------------------------------------------
// HttpInboundTransport
// ---------------------------------------------------------------------------

/// Inbound DIDComm-over-HTTP listener.
pub struct HttpInboundTransport {
    port: u16,
    local_addr: Arc<OnceLock<SocketAddr>>,
    server: Option<tokio::task::JoinHandle<()>>,
}

impl HttpInboundTransport {
    /// Listen on `port`. Port `0` asks the OS for an ephemeral port;
    /// [`local_addr`](Self::local_addr) reports what was actually bound.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            local_addr: Arc::new(OnceLock::new()),
            server: None,
        }
    }

    /// The bound socket address. `None` until the transport is started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// A handle that yields the bound address once the transport has
    /// started — usable after the transport itself has been boxed and
    /// handed to the agent.
    pub fn addr_handle(&self) -> Arc<OnceLock<SocketAddr>> {
        Arc::clone(&self.local_addr)
    }
}

async fn receive(
    State(dispatcher): State<MessageDispatcher>,
    Json(message): Json<AgentMessage>,
) -> StatusCode {
    dispatcher.dispatch(message);
    StatusCode::ACCEPTED
}

#[async_trait]
impl InboundTransport for HttpInboundTransport {
    async fn start(&mut self, dispatcher: MessageDispatcher) -> Result<(), TransportError> {
        let app = Router::new()
            .route("/", post(receive))
            .with_state(dispatcher)
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port))
            .await
            .map_err(|e| TransportError::Bind(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TransportError::Bind(e.to_string()))?;
        let _ = self.local_addr.set(addr);
        tracing::info!(%addr, "inbound HTTP transport listening");

        self.server = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("inbound HTTP transport terminated: {e}");
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        if let Some(server) = self.server.take() {
            server.abort();
        }
        Ok(())
    }
}

impl Drop for HttpInboundTransport {
    fn drop(&mut self) {
        // The server task holds no reference back to the transport; abort
        // it so a dropped agent does not leave a listener running.
        if let Some(server) = &self.server {
            server.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// HttpOutboundTransport
// ---------------------------------------------------------------------------

/// Outbound DIDComm-over-HTTP sender.
pub struct HttpOutboundTransport {
    client: reqwest::Client,
}

impl HttpOutboundTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client for outbound transport");
        Self { client }
    }
}

impl Default for HttpOutboundTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutboundTransport for HttpOutboundTransport {
    fn supported_schemes(&self) -> &'static [&'static str] {
        &["http", "https"]
    }

    async fn send(&self, endpoint: &str, message: &AgentMessage) -> Result<(), TransportError> {
        let response = self
            .client
            .post(endpoint)
            .json(message)
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Send(format!(
                "peer {endpoint} returned status {status}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tessera::NetworkConfig;
    use tessera_agent::{compose, EventBus, MemoryWallet};

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
    async fn inbound_accepts_and_dispatches_messages() {
        let events = EventBus::new();
        let mut rx = events.subscribe();

        let mut transport = HttpInboundTransport::new(0);
        transport.start(dispatcher(events)).await.unwrap();
        let addr = transport.local_addr().unwrap();

        let message =
            AgentMessage::new("https://didcomm.org/issue-credential/2.0/offer-credential");
        let status = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{}/", addr.port()))
            .json(&message)
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 202);

        match rx.recv().await.unwrap() {
            tessera_agent::AgentEvent::MessageProcessed { message: got, .. } => {
                assert_eq!(got.id, message.id);
            }
        }

        transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn inbound_rejects_non_json_bodies() {
        let mut transport = HttpInboundTransport::new(0);
        transport.start(dispatcher(EventBus::new())).await.unwrap();
        let addr = transport.local_addr().unwrap();

        let status = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{}/", addr.port()))
            .header("content-type", "application/json")
            .body("not a message")
            .send()
            .await
            .unwrap()
            .status();
        assert!(status.is_client_error());

        transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn outbound_delivers_to_a_peer_endpoint() {
        // Loopback peer that accepts messages the same way our inbound does.
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let mut peer = HttpInboundTransport::new(0);
        peer.start(dispatcher(events)).await.unwrap();
        let addr = peer.local_addr().unwrap();

        let outbound = HttpOutboundTransport::new();
        let message =
            AgentMessage::new("https://didcomm.org/present-proof/1.0/request-presentation");
        outbound
            .send(&format!("http://127.0.0.1:{}/", addr.port()), &message)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            tessera_agent::AgentEvent::MessageProcessed { message: got, .. } => {
                assert_eq!(got.id, message.id);
            }
        }

        peer.stop().await.unwrap();
    }

    #[tokio::test]
    async fn outbound_reports_unreachable_peer() {
        let outbound = HttpOutboundTransport::new();
        let err = outbound
            .send(
                "http://127.0.0.1:1/",
                &AgentMessage::new("https://didcomm.org/trust-ping/1.0/ping"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Send(_)));
    }
}
