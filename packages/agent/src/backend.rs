//! Backend bundle builders and the module composer.
//!
//! A backend bundle is a complete, self-consistent set of capability
//! modules over one cryptographic/ledger stack. Two bundles exist and are
//! behaviorally substitutable:
//!
//! - [`LegacyLedgerBundle`] — the monolithic legacy ledger SDK. Storage is
//!   internal to the SDK and not exposed as a capability.
//! - [`ModernRegistryBundle`] — the split credential-registry stack with an
//!   explicit encrypted-wallet capability.
//!
//! Builders construct module objects only; nothing here touches the
//! network or the filesystem. Ledger connectivity and storage warm-up
//! happen later, in each module's initialize hook.

use std::sync::Arc;

use tessera::NetworkConfig;

use crate::error::AgentError;
use crate::modules::exchange::AutoAccept;
use crate::modules::registry::{LedgerSdkRegistry, SplitCredentialRegistry};
use crate::modules::resolver::{LedgerSdkResolver, SplitLedgerResolver};
use crate::modules::{
    CredentialExchangeModule, DidResolutionModule, LedgerNetworkModule, MediatorModule,
    ModuleSet, ProofExchangeModule, RegistryModule, SecureStorageModule,
};
use crate::wallet::WalletStore;

/// Builds the full capability surface for one backend stack.
pub trait BackendBundle {
    /// Short name, for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Construct the module set for `network`, persisting through `store`.
    ///
    /// Fails with [`AgentError::Configuration`] when the network config is
    /// invalid (empty genesis); the caller must not construct an agent
    /// from a failed build.
    fn build(
        &self,
        network: &NetworkConfig,
        store: Arc<dyn WalletStore>,
    ) -> Result<ModuleSet, AgentError>;
}

/// Mediation requests are auto-accepted so scripted harness exchanges
/// don't stall waiting for an operator grant. Not a production default.
const AUTO_ACCEPT_MEDIATION: bool = true;

// ---------------------------------------------------------------------------
// LegacyLedgerBundle
// ---------------------------------------------------------------------------

/// Capability bundle over the monolithic legacy ledger SDK.
pub struct LegacyLedgerBundle;

impl BackendBundle for LegacyLedgerBundle {
    fn name(&self) -> &'static str {
        "legacy-ledger"
    }

    fn build(
        &self,
        network: &NetworkConfig,
        store: Arc<dyn WalletStore>,
    ) -> Result<ModuleSet, AgentError> {
        network
            .validate()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Ok(ModuleSet {
            mediator: MediatorModule::new(AUTO_ACCEPT_MEDIATION),
            credentials: CredentialExchangeModule::new(AutoAccept::Never),
            proofs: ProofExchangeModule::new(AutoAccept::Never),
            registry: RegistryModule::new(Arc::new(LedgerSdkRegistry::with_store(Arc::clone(
                &store,
            )))),
            ledger: LedgerNetworkModule::new(network.clone()),
            did_resolution: DidResolutionModule::new(Arc::new(LedgerSdkResolver::new(store))),
            secure_storage: None,
        })
    }
}

// ---------------------------------------------------------------------------
// ModernRegistryBundle
// ---------------------------------------------------------------------------

/// Capability bundle over the split registry stack with an explicit
/// encrypted wallet.
pub struct ModernRegistryBundle {
    /// Storage profile identifier (the run's wallet id).
    pub profile: String,
}

impl ModernRegistryBundle {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }
}

impl BackendBundle for ModernRegistryBundle {
    fn name(&self) -> &'static str {
        "modern-registry"
    }

    fn build(
        &self,
        network: &NetworkConfig,
        store: Arc<dyn WalletStore>,
    ) -> Result<ModuleSet, AgentError> {
        network
            .validate()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Ok(ModuleSet {
            mediator: MediatorModule::new(AUTO_ACCEPT_MEDIATION),
            credentials: CredentialExchangeModule::new(AutoAccept::Never),
            proofs: ProofExchangeModule::new(AutoAccept::Never),
            registry: RegistryModule::new(Arc::new(SplitCredentialRegistry::new(Arc::clone(
                &store,
            )))),
            ledger: LedgerNetworkModule::new(network.clone()),
            did_resolution: DidResolutionModule::new(Arc::new(SplitLedgerResolver::new(
                Arc::clone(&store),
            ))),
            secure_storage: Some(SecureStorageModule::new(store, self.profile.clone())),
        })
    }
}

// ---------------------------------------------------------------------------
// compose
// ---------------------------------------------------------------------------

/// Select a backend bundle and build its module set. Pure selection plus
/// delegation — all other branching lives inside the bundles themselves,
/// which keeps the two backends symmetric and swappable.
pub fn compose(
    use_legacy_backend: bool,
    network: &NetworkConfig,
    store: Arc<dyn WalletStore>,
    profile: &str,
) -> Result<ModuleSet, AgentError> {
    if use_legacy_backend {
        LegacyLedgerBundle.build(network, store)
    } else {
        ModernRegistryBundle::new(profile).build(network, store)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
