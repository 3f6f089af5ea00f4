//! Public surface for the `tessera-backchannel` crate.
//!
//! Exposes the HTTP transports and the env-var configuration so that
//! external crates (e.g. the conformance test suite) can assemble an
//! in-process agent without spawning a subprocess.

pub mod config;
pub mod http;

pub use config::BackchannelConfig;
pub use http::{HttpInboundTransport, HttpOutboundTransport};
