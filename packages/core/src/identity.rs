//! Agent identity — Ed25519 keypair and `did:key` DID.
//!
//! This type is fully synchronous and has no storage dependency. The owner
//! (the agent lifecycle, or a test) is responsible for persisting the seed
//! and passing it back on restart, so the same DID survives re-runs against
//! the same wallet.
//!
//! # `did:key` encoding
//!
//! ```text
//! did:key: z <base58btc( [0xed, 0x01] ++ public_key_bytes )>
//! ```
//!
//! where `[0xed, 0x01]` is the unsigned-varint encoding of the
//! `ed25519-pub` multicodec value. This produces the well-known `z6Mk…`
//! prefix. [`decode_did_key`] inverts the encoding and is the pure half of
//! the DID-resolution capability.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while decoding a DID.
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("not a did:key DID: {0}")]
    NotDidKey(String),

    #[error("invalid multibase encoding: {0}")]
    InvalidMultibase(String),

    #[error("not an ed25519-pub multicodec key")]
    WrongMulticodec,
}

/// An agent's cryptographic identity.
///
/// The stable public identity is the `did:key` DID, derived entirely from
/// the Ed25519 public key. It never changes as long as the same seed is
/// used.
#[derive(Clone)]
pub struct AgentIdentity {
    signing_key: SigningKey,
}

impl AgentIdentity {
    /// Generate a fresh identity using OS randomness.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore an identity from a previously saved 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The raw 32-byte seed. **Keep this secret.** Pass it to
    /// [`from_seed`](Self::from_seed) to restore the same identity.
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The agent's stable `did:key` DID, e.g. `did:key:z6Mk…`.
    pub fn did(&self) -> String {
        format!("did:key:{}", self.public_key_multibase())
    }

    /// The public key in multibase format (`z`-prefixed base58btc over the
    /// multicodec-prefixed key bytes).
    pub fn public_key_multibase(&self) -> String {
        encode_multibase(&self.signing_key.verifying_key().to_bytes())
    }

    /// Sign `message` with the agent's private key. Returns the raw
    /// 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        use ed25519_dalek::Signer;
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// The resolved DID document for this identity.
    pub fn did_document(&self) -> DidDocument {
        DidDocument::for_key(&self.did(), &self.public_key_multibase())
    }
}

/// A minimal resolved DID document: the DID, its verification key, and the
/// service endpoints a sender would deliver messages to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DidDocument {
    pub id: String,

    /// Verification keys, multibase-encoded.
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,

    /// DIDComm service endpoints, in preference order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(rename = "publicKeyMultibase")]
    pub public_key_multibase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub id: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

impl DidDocument {
    /// Build the document for a `did:key` identity (one Ed25519 key, no
    /// service endpoints — those come from the agent's own config).
    pub fn for_key(did: &str, public_key_multibase: &str) -> Self {
        Self {
            id: did.to_string(),
            verification_method: vec![VerificationMethod {
                id: format!("{did}#key-1"),
                method_type: "Ed25519VerificationKey2020".into(),
                public_key_multibase: public_key_multibase.to_string(),
            }],
            service: vec![],
        }
    }
}

/// Decode a `did:key` DID into its DID document.
///
/// Pure function: verifies the multibase/multicodec framing and that the
/// embedded bytes form a valid Ed25519 public key.
pub fn decode_did_key(did: &str) -> Result<DidDocument, IdentityError> {
    let multibase = did
        .strip_prefix("did:key:")
        .ok_or_else(|| IdentityError::NotDidKey(did.to_string()))?;

    let b58 = multibase
        .strip_prefix('z')
        .ok_or_else(|| IdentityError::InvalidMultibase("missing 'z' prefix".into()))?;

    let bytes = bs58::decode(b58)
        .into_vec()
        .map_err(|e| IdentityError::InvalidMultibase(e.to_string()))?;

    if bytes.len() != 34 || bytes[0] != 0xed || bytes[1] != 0x01 {
        return Err(IdentityError::WrongMulticodec);
    }

    let key_bytes: [u8; 32] = bytes[2..].try_into().expect("length checked above");
    VerifyingKey::from_bytes(&key_bytes).map_err(|_| IdentityError::WrongMulticodec)?;

    Ok(DidDocument::for_key(did, multibase))
}

fn encode_multibase(pub_key: &[u8; 32]) -> String {
    // Multicodec prefix for ed25519-pub: 0xed 0x01
    let mut prefixed = vec![0xed_u8, 0x01];
    prefixed.extend_from_slice(pub_key);
    format!("z{}", bs58::encode(prefixed).into_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_starts_with_z6mk() {
        let id = AgentIdentity::generate();
        assert!(id.did().starts_with("did:key:z6Mk"), "got: {}", id.did());
    }

    #[test]
    fn stable_from_seed() {
        let id = AgentIdentity::generate();
        let restored = AgentIdentity::from_seed(&id.seed());
        assert_eq!(id.did(), restored.did());
    }

    #[test]
    fn sign_returns_64_bytes() {
        let id = AgentIdentity::generate();
        assert_eq!(id.sign(b"conformance ping").len(), 64);
    }

    #[test]
    fn decode_roundtrips_generated_did() {
        let id = AgentIdentity::generate();
        let doc = decode_did_key(&id.did()).unwrap();
        assert_eq!(doc.id, id.did());
        assert_eq!(
            doc.verification_method[0].public_key_multibase,
            id.public_key_multibase()
        );
    }

    #[test]
    fn decode_rejects_non_did_key() {
        let err = decode_did_key("did:sov:WgWxqztrNooG92RXvxSTWv").unwrap_err();
        assert!(matches!(err, IdentityError::NotDidKey(_)));
    }

    #[test]
    fn decode_rejects_wrong_multicodec() {
        // secp256k1-pub multicodec prefix (0xe7 0x01) instead of ed25519-pub.
        let mut bytes = vec![0xe7_u8, 0x01];
        bytes.extend_from_slice(&[0u8; 33]);
        let did = format!("did:key:z{}", bs58::encode(bytes).into_string());
        assert_eq!(decode_did_key(&did).unwrap_err(), IdentityError::WrongMulticodec);
    }
}
