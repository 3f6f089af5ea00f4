//! Agent module composition and bootstrap.
//!
//! This crate assembles a protocol agent from one of two interchangeable
//! backend bundles and walks it through a deterministic startup sequence
//! ending in a Ready agent handle. The protocol state machines themselves
//! (credential offer/issue, proof request/present) live outside this
//! workspace; what lives here is everything that has to be true before
//! they can run.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | Backend bundle builders and the module composer |
//! | [`modules`] | The protocol-capability modules and [`ModuleSet`] |
//! | [`lifecycle`] | [`create_agent`], the [`Agent`] handle, phases, startup trace |
//! | [`transport`] | Transport seams and inbound dispatch |
//! | [`events`] | Event bus, message-processed events, debug sink |
//! | [`wallet`] | Wallet storage: memory, SQLite, encrypting wrapper |
//! | [`config`] | Per-run [`AgentConfig`] |
//! | [`error`] | The [`AgentError`] taxonomy |
//!
//! [`ModuleSet`]: modules::ModuleSet
//! [`create_agent`]: lifecycle::create_agent
//! [`Agent`]: lifecycle::Agent
//! [`AgentConfig`]: config::AgentConfig
//! [`AgentError`]: error::AgentError

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod modules;
pub mod transport;
pub mod wallet;

pub use backend::{compose, BackendBundle, LegacyLedgerBundle, ModernRegistryBundle};
pub use config::AgentConfig;
pub use error::AgentError;
pub use events::{AgentEvent, EventBus, MessageSink, TracingSink};
pub use lifecycle::{create_agent, Agent, CreateAgentOptions, Phase, StartupStep};
pub use modules::{Capability, ModuleSet};
pub use transport::{
    InboundTransport, MessageDispatcher, OutboundTransport, TransportConfig, TransportError,
};
pub use wallet::{EncryptedWallet, MemoryWallet, SqliteWallet, WalletStore};
