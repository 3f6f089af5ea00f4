//! Protocol-capability modules.
//!
//! Each submodule provides one named protocol function; a [`ModuleSet`] is
//! the fixed-shape collection of them a backend bundle constructs. Both
//! backend bundles produce the same capability surface — the only shape
//! difference is that secure storage is a visible capability on the modern
//! bundle and an internal detail of the legacy one.
//!
//! | Capability | Module |
//! |------------|--------|
//! | `mediator` | [`MediatorModule`] |
//! | `credentials` | [`CredentialExchangeModule`] |
//! | `proofs` | [`ProofExchangeModule`] |
//! | `credentialRegistry` | [`RegistryModule`] |
//! | `ledgerNetwork` | [`LedgerNetworkModule`] |
//! | `didResolution` | [`DidResolutionModule`] |
//! | `secureStorage` | [`SecureStorageModule`] (modern only) |

pub mod exchange;
pub mod ledger;
pub mod mediator;
pub mod registry;
pub mod resolver;
pub mod storage;

use async_trait::async_trait;

pub use exchange::{AutoAccept, CredentialExchangeModule, ProofExchangeModule};
pub use ledger::LedgerNetworkModule;
pub use mediator::MediatorModule;
pub use registry::{CredentialRegistry, RegistryModule};
pub use resolver::{DidResolutionModule, DidResolver};
pub use storage::SecureStorageModule;

use crate::wallet::WalletError;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// The fixed set of capability names an agent composes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Mediator,
    Credentials,
    Proofs,
    CredentialRegistry,
    LedgerNetwork,
    DidResolution,
    SecureStorage,
}

impl Capability {
    /// The capability name as exposed to the harness.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Mediator => "mediator",
            Capability::Credentials => "credentials",
            Capability::Proofs => "proofs",
            Capability::CredentialRegistry => "credentialRegistry",
            Capability::LedgerNetwork => "ledgerNetwork",
            Capability::DidResolution => "didResolution",
            Capability::SecureStorage => "secureStorage",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ModuleError
// ---------------------------------------------------------------------------

/// Errors a capability module can return from its operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The module was used before its initialize hook ran. Backend APIs
    /// are only available once the agent is initialized.
    #[error("{0} used before initialize")]
    NotReady(&'static str),

    /// The ledger pool could not be brought up or queried.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// The requested DID could not be resolved.
    #[error("DID not resolvable: {0}")]
    DidNotFound(String),

    /// The DID method is not supported by this backend's resolver.
    #[error("unsupported DID method: {0}")]
    UnsupportedDid(String),

    /// A wallet operation failed.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Anything else (serialization, corrupt records).
    #[error("internal module error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// CapabilityModule trait
// ---------------------------------------------------------------------------

/// A named unit providing one protocol function.
///
/// Construction is cheap and side-effect free; anything that touches the
/// network, the wallet, or backend runtimes happens in [`initialize`],
/// which the agent lifecycle invokes exactly once per module.
///
/// [`initialize`]: CapabilityModule::initialize
#[async_trait]
pub trait CapabilityModule: Send + Sync {
    /// Which capability slot this module fills.
    fn capability(&self) -> Capability;

    /// Async initialize participation hook, run during agent initialize.
    async fn initialize(&self) -> Result<(), ModuleError>;
}

// ---------------------------------------------------------------------------
// ModuleSet
// ---------------------------------------------------------------------------

/// The composed module set for one agent.
///
/// Created fresh per agent-creation call by a backend bundle builder and
/// owned exclusively by the agent thereafter.
pub struct ModuleSet {
    pub mediator: MediatorModule,
    pub credentials: CredentialExchangeModule,
    pub proofs: ProofExchangeModule,
    pub registry: RegistryModule,
    pub ledger: LedgerNetworkModule,
    pub did_resolution: DidResolutionModule,

    /// Present only on the modern bundle; the legacy backend manages its
    /// storage internally.
    pub secure_storage: Option<SecureStorageModule>,
}

impl std::fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSet")
            .field("capabilities", &self.capability_names())
            .field("has_secure_storage", &self.secure_storage.is_some())
            .finish_non_exhaustive()
    }
}

impl ModuleSet {
    /// The capability names present in this set, in initialization order.
    pub fn capability_names(&self) -> Vec<&'static str> {
        self.modules().iter().map(|m| m.capability().as_str()).collect()
    }

    /// All modules in initialization order: storage first (everything else
    /// may read from it), then the ledger pool, then the capabilities that
    /// depend on both.
    pub fn modules(&self) -> Vec<&dyn CapabilityModule> {
        let mut modules: Vec<&dyn CapabilityModule> = Vec::with_capacity(7);
        if let Some(storage) = &self.secure_storage {
            modules.push(storage);
        }
        modules.push(&self.ledger);
        modules.push(&self.registry);
        modules.push(&self.did_resolution);
        modules.push(&self.mediator);
        modules.push(&self.credentials);
        modules.push(&self.proofs);
        modules
    }
}
