//! Core data model for the Tessera conformance agent.
//!
//! This crate has **no I/O** — no networking, no filesystem, no async
//! runtime. It defines the types the rest of the workspace agrees on:
//! the DIDComm-style message envelope, ledger network configuration and
//! genesis parsing, the agent's `did:key` identity, and the link-secret
//! value a credential holder needs before it can present proofs.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`message`] | [`AgentMessage`] envelope exchanged over transports |
//! | [`network`] | [`NetworkConfig`] and genesis-transaction parsing |
//! | [`identity`] | [`AgentIdentity`] — Ed25519 keypair and `did:key` DID |
//! | [`link_secret`] | [`LinkSecret`] — holder-side proof prerequisite |

pub mod identity;
pub mod link_secret;
pub mod message;
pub mod network;

pub use identity::{decode_did_key, AgentIdentity, DidDocument, IdentityError};
pub use link_secret::LinkSecret;
pub use message::AgentMessage;
pub use network::{GenesisTransaction, NetworkConfig, NetworkConfigError};
