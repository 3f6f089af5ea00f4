//! `tessera-backchannel` — conformance agent boundary process.
//!
//! # Quick start
//!
//! ```sh
//! # Modern backend, in-memory wallet:
//! TESSERA_GENESIS=./local-genesis.txn tessera-backchannel
//!
//! # Legacy backend:
//! TESSERA_BACKEND=legacy TESSERA_GENESIS=./local-genesis.txn tessera-backchannel
//!
//! # Durable wallet:
//! TESSERA_WALLET_DB=./wallet.db TESSERA_GENESIS=./local-genesis.txn tessera-backchannel
//! ```
//!
//! # Environment variables
//!
//! See [`BackchannelConfig::from_env`] for the full list.

use std::sync::Arc;

use tessera_backchannel::{BackchannelConfig, HttpInboundTransport, HttpOutboundTransport};
use tessera_agent::{
    create_agent, CreateAgentOptions, EncryptedWallet, SqliteWallet, TransportConfig, WalletStore,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_backchannel=debug,tessera_agent=debug".into()),
        )
        .init();

    let config = BackchannelConfig::from_env();

    let storage: Option<Arc<dyn WalletStore>> = match &config.wallet_db_path {
        Some(path) => {
            tracing::info!("wallet: SQLite at {path}");
            let sqlite = SqliteWallet::open(path)
                .unwrap_or_else(|e| panic!("failed to open wallet database at {path}: {e}"));
            Some(Arc::new(EncryptedWallet::new(
                Arc::new(sqlite),
                tessera_agent::config::TEST_WALLET_KEY,
            )))
        }
        None => {
            tracing::info!("wallet: in-memory (storage will not survive restart)");
            None
        }
    };

    let transport = TransportConfig {
        endpoints: vec![config.endpoint.clone()],
        inbound: vec![Box::new(HttpInboundTransport::new(config.inbound_port))],
        outbound: vec![Box::new(HttpOutboundTransport::new())],
    };

    let mut options = CreateAgentOptions::new(
        &config.genesis_path,
        &config.agent_name,
        transport,
        config.use_legacy_backend,
    );
    options.storage = storage;

    let agent = match create_agent(options).await {
        Ok(agent) => agent,
        // Any create_agent failure is fatal to startup: no agent instance
        // is usable without a clean pass through Ready.
        Err(e) => {
            tracing::error!("agent startup failed: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        label = %agent.config().label,
        did = %agent.identity().map(|i| i.did()).unwrap_or_default(),
        endpoint = %config.endpoint,
        "backchannel ready"
    );

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    tracing::info!("shutting down");
    if let Err(e) = agent.shutdown().await {
        tracing::warn!("shutdown error: {e}");
    }
}
