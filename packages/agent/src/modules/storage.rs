//! Secure-storage capability (modern backend only).
//!
//! Wraps the encrypted wallet the modern bundle shares with its registry
//! and resolver. The initialize hook proves the store is usable — one
//! write/read through the cipher — so a wrong wallet key or unwritable
//! database surfaces as an initialization failure instead of a mystery
//! during the first protocol exchange.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Capability, CapabilityModule, ModuleError};
use crate::wallet::{WalletStore, CONFIG_CATEGORY};

/// Record name of the storage-profile marker written at initialize.
const PROFILE_RECORD: &str = "storage_profile";

/// The secure-storage capability: the agent's encrypted wallet as a
/// first-class module.
pub struct SecureStorageModule {
    wallet: Arc<dyn WalletStore>,
    profile: String,
}

impl SecureStorageModule {
    /// `profile` is the run's wallet id; it is written as the profile
    /// marker so a reopened wallet reveals which run created it.
    pub fn new(wallet: Arc<dyn WalletStore>, profile: impl Into<String>) -> Self {
        Self {
            wallet,
            profile: profile.into(),
        }
    }

    pub fn wallet(&self) -> &Arc<dyn WalletStore> {
        &self.wallet
    }
}

#[async_trait]
impl CapabilityModule for SecureStorageModule {
    fn capability(&self) -> Capability {
        Capability::SecureStorage
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        self.wallet
            .put(CONFIG_CATEGORY, PROFILE_RECORD, &self.profile)
            .await?;
        let read_back = self.wallet.get(CONFIG_CATEGORY, PROFILE_RECORD).await?;
        if read_back.as_deref() != Some(self.profile.as_str()) {
            return Err(ModuleError::Internal(
                "secure storage write/read check failed".into(),
            ));
        }
        tracing::debug!(profile = %self.profile, "secure storage open");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{EncryptedWallet, MemoryWallet};

    #[tokio::test]
    async fn initialize_writes_the_profile_marker() {
        let wallet: Arc<dyn WalletStore> = Arc::new(MemoryWallet::new());
        let module = SecureStorageModule::new(Arc::clone(&wallet), "tessera-rust-123");
        module.initialize().await.unwrap();

        assert_eq!(
            wallet.get(CONFIG_CATEGORY, PROFILE_RECORD).await.unwrap().as_deref(),
            Some("tessera-rust-123")
        );
    }

    #[tokio::test]
    async fn initialize_exercises_the_cipher() {
        let inner: Arc<dyn WalletStore> = Arc::new(MemoryWallet::new());
        let wallet: Arc<dyn WalletStore> =
            Arc::new(EncryptedWallet::new(Arc::clone(&inner), "some-key"));
        SecureStorageModule::new(wallet, "profile")
            .initialize()
            .await
            .unwrap();

        // The marker is sealed in the inner store.
        let raw = inner.get(CONFIG_CATEGORY, PROFILE_RECORD).await.unwrap().unwrap();
        assert_ne!(raw, "profile");
    }
}
