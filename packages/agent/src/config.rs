//! Per-run agent configuration.

/// Prefix for wallet/storage identifiers created by this backchannel.
pub const WALLET_ID_PREFIX: &str = "tessera-rust";

/// Fixed wallet key material used by conformance runs. Not a secret — the
/// harness recreates wallets on every run.
pub const TEST_WALLET_KEY: &str = "tessera-insecure-conformance-key-01";

/// Configuration for one agent instance. Created once per `create_agent`
/// call; immutable afterwards.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display label announced to protocol peers.
    pub label: String,

    /// Wallet/storage identifier. Unique per process run so a run never
    /// collides with a previous run's storage.
    pub wallet_id: String,

    /// Key material the secure-storage capability derives its cipher from.
    pub wallet_key: String,

    /// Endpoint URLs peers can reach this agent's inbound transports on.
    pub endpoints: Vec<String>,

    /// Use the legacy `did:sov` prefix where the peer allows it. Interop
    /// affordance for agents that predate the namespaced DID methods.
    pub use_legacy_did_prefix: bool,
}

impl AgentConfig {
    /// Build the config for this run. The wallet id is derived from the
    /// current time in milliseconds under a fixed prefix.
    pub fn for_run(label: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            label: label.into(),
            wallet_id: format!("{WALLET_ID_PREFIX}-{}", chrono::Utc::now().timestamp_millis()),
            wallet_key: TEST_WALLET_KEY.to_string(),
            endpoints,
            use_legacy_did_prefix: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_id_carries_prefix_and_timestamp() {
        let config = AgentConfig::for_run("Alice", vec![]);
        let suffix = config
            .wallet_id
            .strip_prefix(&format!("{WALLET_ID_PREFIX}-"))
            .expect("wallet id must start with the fixed prefix");
        assert!(suffix.parse::<i64>().is_ok(), "suffix must be millis: {suffix}");
    }

    #[test]
    fn wallet_ids_are_distinct_across_creations() {
        let a = AgentConfig::for_run("Alice", vec![]);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = AgentConfig::for_run("Alice", vec![]);
        assert_ne!(a.wallet_id, b.wallet_id);
    }
}
