//! Mediation coordination capability.

use async_trait::async_trait;

use super::{Capability, CapabilityModule, ModuleError};

/// Protocol family handled by this capability.
pub const COORDINATE_MEDIATION_FAMILY: &str = "https://didcomm.org/coordinate-mediation";

/// The mediator capability: grants (or withholds) mediation to requesting
/// agents.
pub struct MediatorModule {
    /// When set, incoming mediation requests are granted without an
    /// operator decision. The harness relies on this so scripted exchanges
    /// don't stall waiting for a grant.
    pub auto_accept_mediation_requests: bool,
}

impl MediatorModule {
    pub fn new(auto_accept_mediation_requests: bool) -> Self {
        Self {
            auto_accept_mediation_requests,
        }
    }

    /// Whether this capability handles the given protocol message type.
    pub fn handles(&self, message_type: &str) -> bool {
        message_type.starts_with(&format!("{COORDINATE_MEDIATION_FAMILY}/"))
    }
}

#[async_trait]
impl CapabilityModule for MediatorModule {
    fn capability(&self) -> Capability {
        Capability::Mediator
    }

    async fn initialize(&self) -> Result<(), ModuleError> {
        tracing::debug!(
            auto_accept = self.auto_accept_mediation_requests,
            "mediator capability ready"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_only_coordinate_mediation_messages() {
        let module = MediatorModule::new(true);
        assert!(module.handles("https://didcomm.org/coordinate-mediation/1.0/mediate-request"));
        assert!(!module.handles("https://didcomm.org/issue-credential/1.0/offer-credential"));
        // Family prefix alone is not a message type.
        assert!(!module.handles("https://didcomm.org/coordinate-mediation"));
    }
}
