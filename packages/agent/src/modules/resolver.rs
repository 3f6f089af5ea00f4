//! DID-resolution capability.
//!
//! Each backend binds exactly one resolver. Both resolvers handle the
//! ledger-independent `did:key` method by pure decoding; for their
//! ledger-anchored method they look the document up in the backend's
//! wallet, where anchored documents are kept under
//! [`DID_DOCUMENT_CATEGORY`](crate::wallet::DID_DOCUMENT_CATEGORY).

use std::sync::Arc;

use async_trait::async_trait;
use tessera::{decode_did_key, DidDocument};

use super::{Capability, CapabilityModule, ModuleError};
use crate::wallet::{WalletStore, DID_DOCUMENT_CATEGORY};

// ---------------------------------------------------------------------------
// DidResolver trait
// ---------------------------------------------------------------------------

/// Resolves DIDs of the methods the backend supports.
#[async_trait]
pub trait DidResolver: Send + Sync + 'static {
    /// DID method names this resolver answers for (without the `did:` prefix).
    fn supported_methods(&self) -> &'static [&'static str];

    async fn resolve(&self, did: &str) -> Result<DidDocument, ModuleError>;
}

/// Extract the method name from a DID, e.g. `"key"` from `did:key:z6Mk…`.
fn did_method(did: &str) -> Option<&str> {
    did.strip_prefix("did:")?.split(':').next()
}

/// Shared resolution logic: `did:key` decodes purely; the ledger method
/// reads the anchored document from the wallet.
async fn resolve_with_store(
    did: &str,
    ledger_method: &str,
    store: &Arc<dyn WalletStore>,
) -> Result<DidDocument, ModuleError> {
    match did_method(did) {
        Some("key") => decode_did_key(did).map_err(|e| ModuleError::DidNotFound(e.to_string())),
        Some(method) if method == ledger_method => {
            let record = store
                .get(DID_DOCUMENT_CATEGORY, did)
                .await?
                .ok_or_else(|| ModuleError::DidNotFound(did.to_string()))?;
            serde_json::from_str(&record)
                .map_err(|e| ModuleError::Internal(format!("anchored DID document: {e}")))
        }
        _ => Err(ModuleError::UnsupportedDid(did.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Backend resolvers
// ---------------------------------------------------------------------------

/// Resolver bound to the legacy ledger SDK: `did:key` plus the legacy
/// `did:sov` method.
pub struct LedgerSdkResolver {
    store: Arc<dyn WalletStore>,
}

impl LedgerSdkResolver {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DidResolver for LedgerSdkResolver {
    fn supported_methods(&self) -> &'static [&'static str] {
        &["key", "sov"]
    }

    async fn resolve(&self, did: &str) -> Result<DidDocument, ModuleError> {
        resolve_with_store(did, "sov", &self.store).await
    }
}

/// Resolver bound to the modern split ledger client: `did:key` plus the
/// namespaced `did:indy` method.
pub struct SplitLedgerResolver {
    store: Arc<dyn WalletStore>,
}

impl SplitLedgerResolver {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DidResolver for SplitLedgerResolver {
    fn supported_methods(&self) -> &'static [&'static str] {
        &["key", "indy"]
    }

    async fn resolve(&self, did: &str) -> Result<DidDocument, ModuleError> {
        resolve_with_store(did, "indy", &self.store).await
    }
}

// ---------------------------------------------------------------------------
// DidResolutionModule
// ---------------------------------------------------------------------------

/// The DID-resolution capability slot: exactly one resolver, matching the
/// backend the bundle was built for.
pub struct DidResolutionModule {
    resolver: Arc<dyn DidResolver>,
}

impl DidResolutionModule {
    pub fn new(resolver: Arc<dyn DidResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<dyn DidResolver> {
        &self.resolver
    }

    pub async fn resolve(&self, did: &str) -> Result<DidDocument, ModuleError> {
        self.resolver.resolve(did).await
    }
}

#[async_trait]
impl CapabilityModule for DidResolutionModule {
    fn capability(&self) -> Capability {
        Capability::DidResolution
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        tracing::debug!(methods = ?self.resolver.supported_methods(), "DID resolution ready");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::MemoryWallet;
    use tessera::AgentIdentity;

    fn store() -> Arc<dyn WalletStore> {
        Arc::new(MemoryWallet::new())
    }

    #[tokio::test]
    async fn resolves_did_key_without_touching_the_store() {
        let resolver = SplitLedgerResolver::new(store());
        let identity = AgentIdentity::generate();
        let doc = resolver.resolve(&identity.did()).await.unwrap();
        assert_eq!(doc.id, identity.did());
    }

    #[tokio::test]
    async fn resolves_anchored_ledger_did_from_the_store() {
        let store = store();
        let did = "did:indy:main-pool:Av63wJYM7xYR4AiygYq4c3";
        let doc = DidDocument::for_key(did, "z6MkAnchored");
        store
            .put(
                DID_DOCUMENT_CATEGORY,
                did,
                &serde_json::to_string(&doc).unwrap(),
            )
            .await
            .unwrap();

        let resolver = SplitLedgerResolver::new(store);
        assert_eq!(resolver.resolve(did).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn unanchored_ledger_did_is_not_found() {
        let resolver = LedgerSdkResolver::new(store());
        let err = resolver
            .resolve("did:sov:WgWxqztrNooG92RXvxSTWv")
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::DidNotFound(_)));
    }

    #[tokio::test]
    async fn foreign_method_is_unsupported() {
        let resolver = LedgerSdkResolver::new(store());
        let err = resolver.resolve("did:web:example.com").await.unwrap_err();
        assert!(matches!(err, ModuleError::UnsupportedDid(_)));
    }

    #[tokio::test]
    async fn backends_differ_in_ledger_method() {
        let legacy = LedgerSdkResolver::new(store());
        let modern = SplitLedgerResolver::new(store());
        assert!(legacy.supported_methods().contains(&"sov"));
        assert!(modern.supported_methods().contains(&"indy"));
        assert!(matches!(
            modern.resolve("did:sov:WgWxqztrNooG92RXvxSTWv").await.unwrap_err(),
            ModuleError::UnsupportedDid(_)
        ));
    }
}
