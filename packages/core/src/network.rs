//! Ledger network configuration and genesis-transaction parsing.
//!
//! A [`NetworkConfig`] names one ledger instance and carries the genesis
//! transaction blob that bootstraps connectivity to it. The config is
//! validated once, before any backend module is constructed; parsing the
//! individual transactions happens later, during agent initialization,
//! because a malformed transaction is a ledger-connectivity problem rather
//! than a configuration problem.

use serde_json::Value;
use thiserror::Error;

/// Errors produced while validating or parsing a network configuration.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkConfigError {
    /// The genesis blob was empty — nothing to bootstrap the pool from.
    #[error("genesis transactions must not be empty")]
    EmptyGenesis,

    /// A genesis line was not valid JSON.
    #[error("genesis line {line} is not a valid transaction: {reason}")]
    MalformedTransaction { line: usize, reason: String },
}

/// Configuration for one ledger network instance.
///
/// Immutable once handed to a backend bundle builder. The builder calls
/// [`NetworkConfig::validate`] before constructing any module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Identifier for the ledger instance, e.g. `"main-pool"`.
    pub namespace: String,

    /// Whether the network is a production ledger. Conformance runs use
    /// non-production pools.
    pub is_production: bool,

    /// The full genesis transaction set, one JSON transaction per line.
    pub genesis_transactions: String,
}

impl NetworkConfig {
    pub fn new(
        namespace: impl Into<String>,
        is_production: bool,
        genesis_transactions: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            is_production,
            genesis_transactions: genesis_transactions.into(),
        }
    }

    /// Check the invariant that must hold before any module is built:
    /// the genesis blob is non-empty (ignoring whitespace).
    pub fn validate(&self) -> Result<(), NetworkConfigError> {
        if self.genesis_transactions.trim().is_empty() {
            return Err(NetworkConfigError::EmptyGenesis);
        }
        Ok(())
    }

    /// Parse the genesis blob into its individual transactions.
    ///
    /// Blank lines are skipped. Returns [`NetworkConfigError::MalformedTransaction`]
    /// with a 1-based line number for the first line that is not valid JSON.
    pub fn parse_genesis(&self) -> Result<Vec<GenesisTransaction>, NetworkConfigError> {
        self.validate()?;

        let mut transactions = Vec::new();
        for (idx, line) in self.genesis_transactions.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let raw: Value = serde_json::from_str(line).map_err(|e| {
                NetworkConfigError::MalformedTransaction {
                    line: idx + 1,
                    reason: e.to_string(),
                }
            })?;
            let alias = raw
                .pointer("/txn/data/data/alias")
                .and_then(Value::as_str)
                .map(str::to_string);
            transactions.push(GenesisTransaction { alias, raw });
        }

        if transactions.is_empty() {
            return Err(NetworkConfigError::EmptyGenesis);
        }
        Ok(transactions)
    }
}

/// One parsed genesis transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct GenesisTransaction {
    /// The node alias, when the transaction is a node registration
    /// (`txn.data.data.alias` in the conventional genesis layout).
    pub alias: Option<String>,

    /// The full transaction, preserved verbatim.
    pub raw: Value,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis_line(alias: &str) -> String {
        format!(
            r#"{{"reqSignature":{{}},"txn":{{"data":{{"data":{{"alias":"{alias}","client_port":9702}}}},"type":"0"}},"ver":"1"}}"#
        )
    }

    #[test]
    fn validate_rejects_empty_genesis() {
        let cfg = NetworkConfig::new("main-pool", false, "   \n  ");
        assert_eq!(cfg.validate(), Err(NetworkConfigError::EmptyGenesis));
    }

    #[test]
    fn parse_extracts_aliases_and_skips_blank_lines() {
        let blob = format!("{}\n\n{}\n", genesis_line("Node1"), genesis_line("Node2"));
        let cfg = NetworkConfig::new("main-pool", false, blob);
        let txns = cfg.parse_genesis().unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].alias.as_deref(), Some("Node1"));
        assert_eq!(txns[1].alias.as_deref(), Some("Node2"));
    }

    #[test]
    fn parse_reports_line_number_of_malformed_transaction() {
        let blob = format!("{}\nnot-json\n", genesis_line("Node1"));
        let cfg = NetworkConfig::new("main-pool", false, blob);
        match cfg.parse_genesis().unwrap_err() {
            NetworkConfigError::MalformedTransaction { line, .. } => assert_eq!(line, 2),
            other => panic!("expected MalformedTransaction, got {other:?}"),
        }
    }

    #[test]
    fn transaction_without_alias_parses() {
        let cfg = NetworkConfig::new("main-pool", false, r#"{"txn":{"type":"1"}}"#);
        let txns = cfg.parse_genesis().unwrap();
        assert_eq!(txns[0].alias, None);
    }
}
