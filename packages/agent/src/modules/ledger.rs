//! Ledger-network capability.
//!
//! Holds the validated [`NetworkConfig`] and brings up the pool connection
//! during agent initialize: the genesis transactions are parsed and the
//! participating node set extracted. A genesis blob that validated as
//! non-empty can still fail here — a malformed transaction is a
//! connectivity failure, surfaced as an initialization error.

use std::sync::RwLock;

use async_trait::async_trait;
use tessera::NetworkConfig;

use super::{Capability, CapabilityModule, ModuleError};

/// Pool state derived from the genesis transactions at initialize time.
#[derive(Debug, Clone)]
struct PoolState {
    transaction_count: usize,
    node_aliases: Vec<String>,
}

/// The ledger-network capability for one configured network.
pub struct LedgerNetworkModule {
    config: NetworkConfig,
    pool: RwLock<Option<PoolState>>,
}

impl LedgerNetworkModule {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// True once the pool has been brought up.
    pub fn is_connected(&self) -> bool {
        self.pool.read().unwrap().is_some()
    }

    /// Number of genesis transactions the pool was bootstrapped from.
    pub fn transaction_count(&self) -> Result<usize, ModuleError> {
        self.pool
            .read()
            .unwrap()
            .as_ref()
            .map(|p| p.transaction_count)
            .ok_or(ModuleError::NotReady("ledger network"))
    }

    /// Aliases of the validator nodes named in the genesis document.
    pub fn node_aliases(&self) -> Result<Vec<String>, ModuleError> {
        self.pool
            .read()
            .unwrap()
            .as_ref()
            .map(|p| p.node_aliases.clone())
            .ok_or(ModuleError::NotReady("ledger network"))
    }
}

#[async_trait]
impl CapabilityModule for LedgerNetworkModule {
    fn capability(&self) -> Capability {
        Capability::LedgerNetwork
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        let transactions = self
            .config
            .parse_genesis()
            .map_err(|e| ModuleError::Ledger(e.to_string()))?;

        let node_aliases: Vec<String> = transactions
            .iter()
            .filter_map(|t| t.alias.clone())
            .collect();

        tracing::info!(
            namespace = %self.config.namespace,
            transactions = transactions.len(),
            nodes = node_aliases.len(),
            "ledger pool up"
        );

        *self.pool.write().unwrap() = Some(PoolState {
            transaction_count: transactions.len(),
            node_aliases,
        });
        Ok(())
    }
}
