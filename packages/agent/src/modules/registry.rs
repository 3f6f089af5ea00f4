//! Credential-registry capability: link-secret provisioning and the
//! backend's credential-material store.
//!
//! The two implementations mirror the two backend stacks. The legacy one
//! wraps the monolithic ledger SDK, which owns its wallet internally; the
//! modern one is the split registry that persists through the shared
//! secure-storage wallet. Both expose the same contract, so the lifecycle
//! layer never branches on the backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tessera::LinkSecret;

use super::{Capability, CapabilityModule, ModuleError};
use crate::wallet::{MemoryWallet, WalletStore, LINK_SECRET_CATEGORY};

// ---------------------------------------------------------------------------
// CredentialRegistry trait
// ---------------------------------------------------------------------------

/// The registry contract both backends implement.
///
/// Operations other than [`open`](CredentialRegistry::open) return
/// [`ModuleError::NotReady`] until the registry has been opened — the
/// backend's credential API only exists once agent initialize has run.
#[async_trait]
pub trait CredentialRegistry: Send + Sync + 'static {
    /// Short backend identifier, for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Warm up the backend runtime. Idempotent.
    async fn open(&self) -> Result<(), ModuleError>;

    /// Ids of all link secrets currently in storage, in creation order.
    async fn list_link_secret_ids(&self) -> Result<Vec<String>, ModuleError>;

    /// Generate and persist a fresh link secret; returns its id.
    async fn create_link_secret(&self) -> Result<String, ModuleError>;
}

// ---------------------------------------------------------------------------
// Shared store-backed implementation
// ---------------------------------------------------------------------------

/// Common link-secret record handling over a [`WalletStore`]. Both concrete
/// registries delegate here; what differs between them is which wallet the
/// store is and who owns it.
struct RegistryCore {
    store: Arc<dyn WalletStore>,
    opened: AtomicBool,
    name: &'static str,
}

impl RegistryCore {
    fn new(store: Arc<dyn WalletStore>, name: &'static str) -> Self {
        Self {
            store,
            opened: AtomicBool::new(false),
            name,
        }
    }

    fn open(&self) {
        self.opened.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), ModuleError> {
        if self.opened.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ModuleError::NotReady(self.name))
        }
    }

    async fn list_link_secret_ids(&self) -> Result<Vec<String>, ModuleError> {
        self.ensure_open()?;
        Ok(self.store.list_names(LINK_SECRET_CATEGORY).await?)
    }

    async fn create_link_secret(&self) -> Result<String, ModuleError> {
        self.ensure_open()?;
        let secret = LinkSecret::generate();
        let record = serde_json::to_string(&secret)
            .map_err(|e| ModuleError::Internal(format!("link secret record: {e}")))?;
        self.store
            .put(LINK_SECRET_CATEGORY, &secret.id, &record)
            .await?;
        tracing::debug!(id = %secret.id, "created link secret");
        Ok(secret.id)
    }
}

// ---------------------------------------------------------------------------
// LedgerSdkRegistry (legacy backend)
// ---------------------------------------------------------------------------

/// Registry over the monolithic legacy ledger SDK.
pub struct LedgerSdkRegistry {
    core: RegistryCore,
}

impl LedgerSdkRegistry {
    /// The SDK manages its own wallet; callers never see the store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryWallet::new()))
    }

    /// Bind to an existing store — used to reopen a prior run's wallet.
    pub fn with_store(store: Arc<dyn WalletStore>) -> Self {
        Self {
            core: RegistryCore::new(store, "legacy-sdk registry"),
        }
    }
}

impl Default for LedgerSdkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialRegistry for LedgerSdkRegistry {
    fn backend_name(&self) -> &'static str {
        "legacy-sdk"
    }

    async fn open(&self) -> Result<(), ModuleError> {
        self.core.open();
        Ok(())
    }

    async fn list_link_secret_ids(&self) -> Result<Vec<String>, ModuleError> {
        self.core.list_link_secret_ids().await
    }

    async fn create_link_secret(&self) -> Result<String, ModuleError> {
        self.core.create_link_secret().await
    }
}

// ---------------------------------------------------------------------------
// SplitCredentialRegistry (modern backend)
// ---------------------------------------------------------------------------

/// The modern split registry: credential operations separated from the
/// ledger client, persisting through the shared secure-storage wallet.
pub struct SplitCredentialRegistry {
    core: RegistryCore,
}

impl SplitCredentialRegistry {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            core: RegistryCore::new(store, "split registry"),
        }
    }
}

#[async_trait]
impl CredentialRegistry for SplitCredentialRegistry {
    fn backend_name(&self) -> &'static str {
        "split-registry"
    }

    async fn open(&self) -> Result<(), ModuleError> {
        self.core.open();
        Ok(())
    }

    async fn list_link_secret_ids(&self) -> Result<Vec<String>, ModuleError> {
        self.core.list_link_secret_ids().await
    }

    async fn create_link_secret(&self) -> Result<String, ModuleError> {
        self.core.create_link_secret().await
    }
}

// ---------------------------------------------------------------------------
// RegistryModule
// ---------------------------------------------------------------------------

/// The credential-registry capability slot: exactly one registry
/// implementation, matching the backend the bundle was built for.
pub struct RegistryModule {
    registry: Arc<dyn CredentialRegistry>,
}

impl RegistryModule {
    pub fn new(registry: Arc<dyn CredentialRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<dyn CredentialRegistry> {
        &self.registry
    }
}

#[async_trait]
impl CapabilityModule for RegistryModule {
    fn capability(&self) -> Capability {
        Capability::CredentialRegistry
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        self.registry.open().await?;
        tracing::debug!(backend = self.registry.backend_name(), "credential registry open");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
