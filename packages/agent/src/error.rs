//! The error taxonomy every `create_agent` failure resolves to.
//!
//! Each variant marks which startup stage failed, so the harness can tell a
//! bad deployment (configuration) from a bad environment (I/O, ledger) from
//! a bad wallet (crypto provisioning). None of these are retried by this
//! layer; the caller decides whether to retry agent creation wholesale.

use thiserror::Error;

/// A failed outcome of agent creation or of a lifecycle operation.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Bad or missing network/agent configuration. Fails fast, before any
    /// resource is touched.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The genesis document could not be read.
    #[error("genesis read failed: {0}")]
    Io(#[from] std::io::Error),

    /// A backend module failed its initialize hook (e.g. the ledger pool
    /// could not be brought up from the genesis transactions).
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The link-secret check/create step failed. Fatal: without a link
    /// secret the agent cannot take part in any proof protocol.
    #[error("crypto provisioning failed: {0}")]
    CryptoProvisioning(String),
}
