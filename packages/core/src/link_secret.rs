//! The holder's link secret.
//!
//! A link secret is a private value a credential holder blinds into every
//! credential request, binding all of its credentials to one holder without
//! revealing a correlatable identifier. Exactly one default link secret
//! must exist before any proof can be generated; provisioning it is part of
//! agent startup, not of the proof protocols themselves.

use serde::{Deserialize, Serialize};

/// A named link-secret value as held in wallet storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkSecret {
    /// Wallet-unique identifier for the secret.
    pub id: String,

    /// The secret value, hex-encoded. Never leaves the wallet in protocol
    /// traffic — only blinded commitments derived from it do.
    pub value: String,
}

impl LinkSecret {
    /// Generate a fresh link secret with a UUIDv7 id and a random 32-byte
    /// value.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            value: hex::encode(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_secrets() {
        let a = LinkSecret::generate();
        let b = LinkSecret::generate();
        assert_ne!(a.id, b.id);
        assert_ne!(a.value, b.value);
        assert_eq!(a.value.len(), 64, "32 bytes hex-encoded");
    }

    #[test]
    fn serializes_with_plain_field_names() {
        let secret = LinkSecret::generate();
        let json = serde_json::to_value(&secret).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("value").is_some());
    }
}
