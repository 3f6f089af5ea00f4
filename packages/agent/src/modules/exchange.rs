//! Credential-exchange and proof-exchange capabilities.
//!
//! Each capability layers two protocol versions (v1 and v2) over one
//! format service. The two version handlers within one bundle must hold
//! the **same** format-service instance: an exchange record started under
//! one protocol version carries format attachments that the other
//! version's handler has to recognize, and format recognition is keyed on
//! the service instance's format identifiers.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Capability, CapabilityModule, ModuleError};

/// Protocol family for credential issuance.
pub const ISSUE_CREDENTIAL_FAMILY: &str = "https://didcomm.org/issue-credential";

/// Protocol family for proof presentation.
pub const PRESENT_PROOF_FAMILY: &str = "https://didcomm.org/present-proof";

/// Auto-accept policy for exchange protocols.
///
/// Conformance runs always use [`AutoAccept::Never`]: the external harness
/// drives every accept/reject decision, and a silent accept would make the
/// agent's observable behavior diverge from the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoAccept {
    Never,
    Always,
}

// ---------------------------------------------------------------------------
// Format services
// ---------------------------------------------------------------------------

/// Encodes and decodes credential payloads in the anoncreds attachment
/// format, shared across protocol versions.
pub struct CredentialFormatService;

impl CredentialFormatService {
    /// Attachment-format identifier prefix this service produces and
    /// recognizes, e.g. `anoncreds/credential-offer@v1.0`.
    pub fn format_prefix(&self) -> &'static str {
        "anoncreds/credential"
    }

    pub fn supports(&self, format_id: &str) -> bool {
        format_id.starts_with(self.format_prefix())
    }
}

/// Encodes and decodes proof payloads in the anoncreds attachment format.
pub struct ProofFormatService;

impl ProofFormatService {
    pub fn format_prefix(&self) -> &'static str {
        "anoncreds/proof"
    }

    pub fn supports(&self, format_id: &str) -> bool {
        format_id.starts_with(self.format_prefix())
    }
}

// ---------------------------------------------------------------------------
// Credential exchange
// ---------------------------------------------------------------------------

/// The v1 issue-credential protocol handler.
pub struct V1CredentialHandler {
    format: Arc<CredentialFormatService>,
}

impl V1CredentialHandler {
    pub fn new(format: Arc<CredentialFormatService>) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &Arc<CredentialFormatService> {
        &self.format
    }

    pub fn supports_type(&self, message_type: &str) -> bool {
        message_type.starts_with(&format!("{ISSUE_CREDENTIAL_FAMILY}/1."))
    }
}

/// The v2 issue-credential protocol handler. v2 is multi-format on the
/// wire, so it carries a list of services even though this agent registers
/// only the anoncreds one.
pub struct V2CredentialHandler {
    formats: Vec<Arc<CredentialFormatService>>,
}

impl V2CredentialHandler {
    pub fn new(formats: Vec<Arc<CredentialFormatService>>) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &[Arc<CredentialFormatService>] {
        &self.formats
    }

    pub fn supports_type(&self, message_type: &str) -> bool {
        message_type.starts_with(&format!("{ISSUE_CREDENTIAL_FAMILY}/2."))
    }
}

/// The credential-exchange capability: v1 + v2 protocol handlers over one
/// shared format service.
pub struct CredentialExchangeModule {
    pub auto_accept: AutoAccept,
    pub v1: V1CredentialHandler,
    pub v2: V2CredentialHandler,
}

impl CredentialExchangeModule {
    /// Build the capability over one shared format-service instance.
    pub fn new(auto_accept: AutoAccept) -> Self {
        let format = Arc::new(CredentialFormatService);
        Self {
            auto_accept,
            v1: V1CredentialHandler::new(Arc::clone(&format)),
            v2: V2CredentialHandler::new(vec![format]),
        }
    }

    /// True when the v1 and v2 handlers hold the same format-service
    /// instance (identity, not structural, equality).
    pub fn shares_format_service(&self) -> bool {
        self.v2
            .formats()
            .iter()
            .any(|f| Arc::ptr_eq(f, self.v1.format()))
    }

    pub fn handles(&self, message_type: &str) -> bool {
        self.v1.supports_type(message_type) || self.v2.supports_type(message_type)
    }
}

#[async_trait]
impl CapabilityModule for CredentialExchangeModule {
    fn capability(&self) -> Capability {
        Capability::Credentials
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        tracing::debug!(auto_accept = ?self.auto_accept, "credential exchange ready (v1, v2)");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Proof exchange
// ---------------------------------------------------------------------------

/// The v1 present-proof protocol handler.
pub struct V1ProofHandler {
    format: Arc<ProofFormatService>,
}

impl V1ProofHandler {
    pub fn new(format: Arc<ProofFormatService>) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &Arc<ProofFormatService> {
        &self.format
    }

    pub fn supports_type(&self, message_type: &str) -> bool {
        message_type.starts_with(&format!("{PRESENT_PROOF_FAMILY}/1."))
    }
}

/// The v2 present-proof protocol handler.
pub struct V2ProofHandler {
    formats: Vec<Arc<ProofFormatService>>,
}

impl V2ProofHandler {
    pub fn new(formats: Vec<Arc<ProofFormatService>>) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &[Arc<ProofFormatService>] {
        &self.formats
    }

    pub fn supports_type(&self, message_type: &str) -> bool {
        message_type.starts_with(&format!("{PRESENT_PROOF_FAMILY}/2."))
    }
}

/// The proof-exchange capability: v1 + v2 protocol handlers over one
/// shared format service.
pub struct ProofExchangeModule {
    pub auto_accept: AutoAccept,
    pub v1: V1ProofHandler,
    pub v2: V2ProofHandler,
}

impl ProofExchangeModule {
    pub fn new(auto_accept: AutoAccept) -> Self {
        let format = Arc::new(ProofFormatService);
        Self {
            auto_accept,
            v1: V1ProofHandler::new(Arc::clone(&format)),
            v2: V2ProofHandler::new(vec![format]),
        }
    }

    pub fn shares_format_service(&self) -> bool {
        self.v2
            .formats()
            .iter()
            .any(|f| Arc::ptr_eq(f, self.v1.format()))
    }

    pub fn handles(&self, message_type: &str) -> bool {
        self.v1.supports_type(message_type) || self.v2.supports_type(message_type)
    }
}

#[async_trait]
impl CapabilityModule for ProofExchangeModule {
    fn capability(&self) -> Capability {
        Capability::Proofs
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        tracing::debug!(auto_accept = ?self.auto_accept, "proof exchange ready (v1, v2)");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_handlers_share_one_format_service() {
        let module = CredentialExchangeModule::new(AutoAccept::Never);
        assert!(module.shares_format_service());
    }

    #[test]
    fn proof_handlers_share_one_format_service() {
        let module = ProofExchangeModule::new(AutoAccept::Never);
        assert!(module.shares_format_service());
    }

    #[test]
    fn distinct_services_are_not_identity_equal() {
        let v1 = V1CredentialHandler::new(Arc::new(CredentialFormatService));
        let v2 = V2CredentialHandler::new(vec![Arc::new(CredentialFormatService)]);
        let module = CredentialExchangeModule {
            auto_accept: AutoAccept::Never,
            v1,
            v2,
        };
        assert!(!module.shares_format_service());
    }

    #[test]
    fn version_routing_by_message_type() {
        let module = CredentialExchangeModule::new(AutoAccept::Never);
        assert!(module.v1.supports_type("https://didcomm.org/issue-credential/1.0/offer-credential"));
        assert!(!module.v1.supports_type("https://didcomm.org/issue-credential/2.0/offer-credential"));
        assert!(module.v2.supports_type("https://didcomm.org/issue-credential/2.0/offer-credential"));
        assert!(module.handles("https://didcomm.org/issue-credential/2.0/propose-credential"));
        assert!(!module.handles("https://didcomm.org/present-proof/2.0/propose-presentation"));
    }

    #[test]
    fn format_service_recognizes_its_attachment_ids() {
        let service = CredentialFormatService;
        assert!(service.supports("anoncreds/credential-offer@v1.0"));
        assert!(!service.supports("dif/credential-manifest@v1.0"));
    }
}
