//! Shared helpers for the Tessera conformance test suite.
//!
//! Provides [`spawn_agent`] — runs the full `create_agent` sequence with
//! one real HTTP inbound and one HTTP outbound transport on an ephemeral
//! port — plus a genesis-fixture writer and a recording message sink.
//! Tests get back the live agent, the bound inbound address, and the
//! wallet store, so they can exercise the agent over real TCP and inspect
//! storage without going through the protocol layer.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tessera_agent::{
    create_agent, Agent, AgentError, CreateAgentOptions, MemoryWallet, MessageSink,
    TransportConfig, WalletStore,
};
use tessera_backchannel::{HttpInboundTransport, HttpOutboundTransport};

/// One live agent spawned for a conformance test.
pub struct SpawnedAgent {
    pub agent: Agent,
    /// Where the inbound HTTP transport ended up listening.
    pub inbound_addr: SocketAddr,
    /// The wallet store backing the agent, for direct inspection and for
    /// re-running `create_agent` against the same storage.
    pub store: Arc<dyn WalletStore>,
}

/// Write a genesis fixture with `lines` valid node transactions and return
/// its path. Files land in the OS temp directory under unique names; tests
/// clean up on a best-effort basis.
pub fn write_genesis_fixture(lines: usize) -> PathBuf {
    let blob: String = (1..=lines)
        .map(|i| {
            format!(
                r#"{{"reqSignature":{{}},"txn":{{"data":{{"data":{{"alias":"Node{i}","client_port":{}}}}},"type":"0"}},"ver":"1"}}"#,
                9700 + i
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let path = std::env::temp_dir().join(format!("tessera-genesis-{}.txn", uuid::Uuid::now_v7()));
    std::fs::write(&path, blob).expect("write genesis fixture");
    path
}

/// Write an empty genesis fixture (whitespace only).
pub fn write_empty_genesis_fixture() -> PathBuf {
    let path = std::env::temp_dir().join(format!("tessera-genesis-{}.txn", uuid::Uuid::now_v7()));
    std::fs::write(&path, "  \n").expect("write genesis fixture");
    path
}

/// Spawn a fully Ready agent for `agent_name`.
///
/// The transport config carries exactly one inbound and one outbound
/// entry, matching the harness's standard deployment. When `store` is
/// `None` a fresh in-memory wallet is created and returned in the result;
/// passing the same store again simulates a second run against
/// pre-populated storage.
pub async fn spawn_agent(
    agent_name: &str,
    use_legacy_backend: bool,
    store: Option<Arc<dyn WalletStore>>,
    sink: Option<Arc<dyn MessageSink>>,
) -> Result<SpawnedAgent, AgentError> {
    let genesis_path = write_genesis_fixture(10);
    let store: Arc<dyn WalletStore> = store.unwrap_or_else(|| Arc::new(MemoryWallet::new()));

    let inbound = HttpInboundTransport::new(0);
    let addr_handle = inbound.addr_handle();

    let transport = TransportConfig {
        endpoints: vec!["http://localhost:9021".into()],
        inbound: vec![Box::new(inbound)],
        outbound: vec![Box::new(HttpOutboundTransport::new())],
    };

    let mut options =
        CreateAgentOptions::new(&genesis_path, agent_name, transport, use_legacy_backend);
    options.storage = Some(Arc::clone(&store));
    options.message_sink = sink;

    let agent = create_agent(options).await;
    let _ = std::fs::remove_file(&genesis_path);
    let agent = agent?;

    let bound = addr_handle
        .get()
        .expect("inbound transport must be bound once the agent is ready");
    // The transport binds 0.0.0.0; tests talk to it over loopback.
    let inbound_addr = SocketAddr::from(([127, 0, 0, 1], bound.port()));

    Ok(SpawnedAgent {
        agent,
        inbound_addr,
        store,
    })
}

/// Message sink that records every payload it is handed.
pub struct RecordingSink {
    payloads: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            payloads: Mutex::new(vec![]),
        }
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for RecordingSink {
    fn message_processed(&self, payload: &str) {
        self.payloads.lock().unwrap().push(payload.to_string());
    }
}
