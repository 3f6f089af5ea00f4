//! Backchannel configuration, populated from environment variables.

/// Runtime configuration for a backchannel process.
///
/// All fields are populated from environment variables with defaults that
/// suit a local conformance run, so the binary can be started with only
/// `TESSERA_GENESIS` set.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `TESSERA_GENESIS` | `./genesis.txn` | Path to the ledger genesis document |
/// | `TESSERA_NAME` | `Tessera` | Agent display label |
/// | `TESSERA_BACKEND` | `modern` | `legacy` or `modern` backend bundle |
/// | `TESSERA_INBOUND_PORT` | `9021` | TCP port the inbound HTTP transport binds |
/// | `TESSERA_ENDPOINT` | derived from port | Endpoint URL advertised to peers |
/// | `TESSERA_WALLET_DB` | (absent = in-memory) | Path to the SQLite wallet file |
#[derive(Debug, Clone)]
pub struct BackchannelConfig {
    /// Path to the genesis document.
    pub genesis_path: String,

    /// Agent display label.
    pub agent_name: String,

    /// Select the legacy ledger-SDK backend instead of the modern one.
    pub use_legacy_backend: bool,

    /// Port the inbound HTTP transport listens on.
    pub inbound_port: u16,

    /// Endpoint URL peers deliver messages to.
    pub endpoint: String,

    /// Path to the SQLite wallet file. `None` means an in-memory wallet
    /// (storage is lost when the process exits).
    pub wallet_db_path: Option<String>,
}

impl BackchannelConfig {
    /// Populate config from environment variables, applying defaults where
    /// absent.
    pub fn from_env() -> Self {
        let inbound_port = std::env::var("TESSERA_INBOUND_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(9021);

        let endpoint = std::env::var("TESSERA_ENDPOINT")
            .unwrap_or_else(|_| format!("http://localhost:{inbound_port}"));

        let use_legacy_backend = matches!(
            std::env::var("TESSERA_BACKEND").as_deref(),
            Ok("legacy")
        );

        Self {
            genesis_path: std::env::var("TESSERA_GENESIS")
                .unwrap_or_else(|_| "./genesis.txn".into()),
            agent_name: std::env::var("TESSERA_NAME").unwrap_or_else(|_| "Tessera".into()),
            use_legacy_backend,
            inbound_port,
            endpoint,
            wallet_db_path: std::env::var("TESSERA_WALLET_DB").ok(),
        }
    }
}
