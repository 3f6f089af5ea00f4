//! End-to-end conformance tests for the Tessera agent bootstrap.
//!
//! Each scenario test spawns an ephemeral in-process agent (real TCP, real
//! HTTP inbound transport) via [`tessera_conformance::spawn_agent`] and
//! drives it the way the external harness would. Composition-level
//! properties use the composer directly.
//!
//! # Coverage
//!
//! | Test | Property |
//! |------|----------|
//! | `compose_exposes_identical_names_minus_secure_storage` | backend substitutability |
//! | `bundles_construct_each_capability_exactly_once` | capability multiplicity |
//! | `version_handlers_share_one_format_service` | shared format-service instance |
//! | `empty_genesis_fails_with_configuration_error` | fail-fast before construction |
//! | `unreadable_genesis_fails_with_io_error` | genesis read failure |
//! | `transports_register_strictly_before_initialize` | startup ordering |
//! | `alice_scenario_reaches_ready_with_seven_capabilities` | the Alice scenario |
//! | `second_run_against_same_storage_creates_no_second_link_secret` | idempotent provisioning |
//! | `legacy_backend_reaches_ready_with_six_capabilities` | legacy bundle parity |
//! | `inbound_message_reaches_the_debug_sink` | message-processed logging |
//! | `agents_exchange_messages_over_http_transports` | transport wiring |

use std::sync::Arc;

use tessera::{AgentMessage, NetworkConfig};
use tessera_agent::modules::CredentialRegistry;
use tessera_agent::{
    compose, create_agent, AgentError, CreateAgentOptions, MemoryWallet, Phase, StartupStep,
    TransportConfig, WalletStore,
};
use tessera_conformance::{spawn_agent, write_empty_genesis_fixture, RecordingSink, SpawnedAgent};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn network() -> NetworkConfig {
    NetworkConfig::new(
        "main-pool",
        false,
        r#"{"txn":{"data":{"data":{"alias":"Node1"}},"type":"0"}}"#,
    )
}

fn fresh_store() -> Arc<dyn WalletStore> {
    Arc::new(MemoryWallet::new())
}

async fn link_secret_ids(spawned: &SpawnedAgent) -> Vec<String> {
    spawned
        .agent
        .modules()
        .registry
        .registry()
        .list_link_secret_ids()
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Composition properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn compose_exposes_identical_names_minus_secure_storage() {
    let legacy = compose(true, &network(), fresh_store(), "profile").unwrap();
    let modern = compose(false, &network(), fresh_store(), "profile").unwrap();

    let legacy_names = legacy.capability_names();
    let modern_minus_storage: Vec<_> = modern
        .capability_names()
        .into_iter()
        .filter(|n| *n != "secureStorage")
        .collect();

    assert_eq!(legacy_names, modern_minus_storage);
}

#[tokio::test]
async fn bundles_construct_each_capability_exactly_once() {
    for use_legacy in [true, false] {
        let set = compose(use_legacy, &network(), fresh_store(), "profile").unwrap();
        let names = set.capability_names();

        for required in ["mediator", "credentials", "proofs", "credentialRegistry", "didResolution"] {
            let count = names.iter().filter(|n| **n == required).count();
            assert_eq!(count, 1, "{required} must appear exactly once (legacy={use_legacy})");
        }
    }
}

#[tokio::test]
async fn version_handlers_share_one_format_service() {
    for use_legacy in [true, false] {
        let set = compose(use_legacy, &network(), fresh_store(), "profile").unwrap();
        assert!(set.credentials.shares_format_service(), "legacy={use_legacy}");
        assert!(set.proofs.shares_format_service(), "legacy={use_legacy}");
    }
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_genesis_fails_with_configuration_error() {
    let genesis_path = write_empty_genesis_fixture();
    let options = CreateAgentOptions::new(&genesis_path, "Alice", TransportConfig::none(), false);

    let err = create_agent(options).await.unwrap_err();
    assert!(matches!(err, AgentError::Configuration(_)), "got {err:?}");

    let _ = std::fs::remove_file(&genesis_path);
}

#[tokio::test]
async fn unreadable_genesis_fails_with_io_error() {
    let missing = std::env::temp_dir().join("tessera-no-such-genesis.txn");
    let options = CreateAgentOptions::new(&missing, "Alice", TransportConfig::none(), false);

    let err = create_agent(options).await.unwrap_err();
    assert!(matches!(err, AgentError::Io(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Startup ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transports_register_strictly_before_initialize() {
    let spawned = spawn_agent("Alice", false, None, None).await.unwrap();
    let trace = spawned.agent.startup_trace();

    let position = |step: StartupStep| {
        trace
            .iter()
            .position(|s| *s == step)
            .unwrap_or_else(|| panic!("step {step:?} missing from trace {trace:?}"))
    };

    assert!(position(StartupStep::GenesisRead) < position(StartupStep::ModulesComposed));
    assert!(position(StartupStep::ModulesComposed) < position(StartupStep::AgentConstructed));
    assert!(
        position(StartupStep::InboundTransportRegistered)
            < position(StartupStep::InitializeStarted)
    );
    assert!(
        position(StartupStep::OutboundTransportRegistered)
            < position(StartupStep::InitializeStarted)
    );
    assert!(position(StartupStep::InitializeCompleted) < position(StartupStep::LinkSecretVerified));
}

// ---------------------------------------------------------------------------
// The Alice scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alice_scenario_reaches_ready_with_seven_capabilities() {
    // 10-line genesis, one inbound + one outbound transport, modern backend.
    let spawned = spawn_agent("Alice", false, None, None).await.unwrap();

    assert_eq!(*spawned.agent.phase(), Phase::Ready);

    let names = spawned.agent.modules().capability_names();
    assert_eq!(names.len(), 7);
    assert!(names.contains(&"secureStorage"));

    let ids = link_secret_ids(&spawned).await;
    assert_eq!(ids.len(), 1, "exactly one link secret after first startup");
}

#[tokio::test]
async fn second_run_against_same_storage_creates_no_second_link_secret() {
    let first = spawn_agent("Alice", false, None, None).await.unwrap();
    let ids_after_first = link_secret_ids(&first).await;
    assert_eq!(ids_after_first.len(), 1);

    let store = Arc::clone(&first.store);
    drop(first);

    let second = spawn_agent("Alice", false, Some(store), None).await.unwrap();
    assert_eq!(*second.agent.phase(), Phase::Ready);

    let ids_after_second = link_secret_ids(&second).await;
    assert_eq!(
        ids_after_second, ids_after_first,
        "link-secret id set must be unchanged after a re-run"
    );
}

#[tokio::test]
async fn legacy_backend_reaches_ready_with_six_capabilities() {
    let spawned = spawn_agent("Bob", true, None, None).await.unwrap();

    assert_eq!(*spawned.agent.phase(), Phase::Ready);
    let names = spawned.agent.modules().capability_names();
    assert_eq!(names.len(), 6);
    assert!(!names.contains(&"secureStorage"));
    assert_eq!(link_secret_ids(&spawned).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Transports and events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inbound_message_reaches_the_debug_sink() {
    let sink = Arc::new(RecordingSink::new());
    let spawned = spawn_agent("Alice", false, None, Some(Arc::clone(&sink) as _))
        .await
        .unwrap();

    let message = AgentMessage::new("https://didcomm.org/issue-credential/2.0/offer-credential");
    let status = reqwest::Client::new()
        .post(format!("http://{}/", spawned.inbound_addr))
        .json(&message)
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status.as_u16(), 202);

    // Observer delivery is concurrent with request handling; give it a turn.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let payloads = sink.payloads();
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].contains(&message.id));
}

#[tokio::test]
async fn agents_exchange_messages_over_http_transports() {
    let alice = spawn_agent("Alice", false, None, None).await.unwrap();
    let bob = spawn_agent("Bob", false, None, None).await.unwrap();

    let mut bob_events = bob.agent.events().subscribe();

    let ping = AgentMessage::new("https://didcomm.org/trust-ping/1.0/ping");
    alice
        .agent
        .send_message(&format!("http://{}/", bob.inbound_addr), &ping)
        .await
        .unwrap();

    let event = tokio::time::timeout(std::time::Duration::from_secs(2), bob_events.recv())
        .await
        .expect("Bob should observe the inbound message")
        .unwrap();
    let tessera_agent::AgentEvent::MessageProcessed { message, .. } = event;
    assert_eq!(message.id, ping.id);
}
