//! Agent lifecycle: construction, transport binding, initialization, and
//! cryptographic-material provisioning.
//!
//! [`create_agent`] runs the whole startup sequence in its mandatory
//! order:
//!
//! 1. read the genesis document (suspension point),
//! 2. build the [`NetworkConfig`] and per-run [`AgentConfig`],
//! 3. compose the backend module set,
//! 4. construct the agent,
//! 5. register transports — before initialize, so inbound handlers are
//!    live the moment initialize completes,
//! 6. initialize (suspension point: ledger connectivity, backend warm-up,
//!    identity provisioning, inbound transport start),
//! 7. verify/create the default link secret (suspension points),
//! 8. attach the event observer.
//!
//! Any failure aborts the remaining sequence; no partially-Ready agent is
//! ever returned. A failed agent is observable only through the error the
//! caller receives — and through [`Phase::Failed`] when driving the
//! [`Agent`] methods directly.

use std::path::PathBuf;
use std::sync::Arc;

use tessera::{AgentIdentity, AgentMessage, NetworkConfig};

use crate::backend::compose;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::events::{spawn_observer, EventBus, MessageSink, TracingSink};
use crate::modules::{CapabilityModule, CredentialRegistry, ModuleError, ModuleSet};
use crate::transport::{
    InboundTransport, MessageDispatcher, OutboundTransport, TransportConfig, TransportError,
};
use crate::wallet::{EncryptedWallet, MemoryWallet, WalletStore, CONFIG_CATEGORY};

/// Ledger namespace used for conformance pools.
pub const LEDGER_NAMESPACE: &str = "main-pool";

/// Wallet record holding the agent's identity seed (hex), so the same DID
/// survives re-runs against the same storage.
const IDENTITY_SEED_RECORD: &str = "agent_identity_seed";

// ---------------------------------------------------------------------------
// Phase and startup trace
// ---------------------------------------------------------------------------

/// The agent's lifecycle state.
///
/// The unconfigured stage before construction has no variant: until
/// [`Agent::new`] runs there is no agent value to carry it. The remaining
/// transitions are strictly ordered; `Failed` is terminal and reachable
/// from every non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    TransportsBound,
    Initializing,
    Initialized,
    /// Link secret verified — the agent is ready for protocol traffic.
    Ready,
    Failed(String),
}

/// One step of the startup sequence, recorded in order as it completes.
/// The trace is what makes ordering properties observable to tests and to
/// postmortem diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    GenesisRead,
    ModulesComposed,
    AgentConstructed,
    InboundTransportRegistered,
    OutboundTransportRegistered,
    InitializeStarted,
    InitializeCompleted,
    LinkSecretVerified,
}

// ---------------------------------------------------------------------------
// CreateAgentOptions
// ---------------------------------------------------------------------------

/// Inputs to [`create_agent`]. Values come from the surrounding
/// configuration layer; nothing is reparsed here.
pub struct CreateAgentOptions {
    /// Path to the ledger genesis document.
    pub genesis_path: PathBuf,

    /// Display label, e.g. `"Alice"`.
    pub agent_name: String,

    /// Endpoints and transport instances to bind.
    pub transport: TransportConfig,

    /// `true` selects the legacy ledger-SDK backend; `false` the modern
    /// split-registry backend.
    pub use_legacy_backend: bool,

    /// Reopen an existing wallet store instead of creating a fresh one.
    /// `None` (the normal case) opens a new store for this run's wallet id.
    pub storage: Option<Arc<dyn WalletStore>>,

    /// Debug sink for processed-message payloads. Defaults to
    /// [`TracingSink`].
    pub message_sink: Option<Arc<dyn MessageSink>>,
}

impl CreateAgentOptions {
    pub fn new(
        genesis_path: impl Into<PathBuf>,
        agent_name: impl Into<String>,
        transport: TransportConfig,
        use_legacy_backend: bool,
    ) -> Self {
        Self {
            genesis_path: genesis_path.into(),
            agent_name: agent_name.into(),
            transport,
            use_legacy_backend,
            storage: None,
            message_sink: None,
        }
    }
}

// ---------------------------------------------------------------------------
// create_agent
// ---------------------------------------------------------------------------

/// Run the full startup sequence and return a Ready agent.
///
/// Suspension points, in order: the genesis read, module initialize (which
/// performs ledger connectivity and backend warm-up), the link-secret
/// listing, and — only when none exists yet — the link-secret creation.
/// Re-running against a pre-populated store never creates a second link
/// secret.
pub async fn create_agent(options: CreateAgentOptions) -> Result<Agent, AgentError> {
    let CreateAgentOptions {
        genesis_path,
        agent_name,
        transport,
        use_legacy_backend,
        storage,
        message_sink,
    } = options;

    let genesis_transactions = tokio::fs::read_to_string(&genesis_path).await?;
    tracing::info!(path = %genesis_path.display(), "read genesis document");
    let mut trace = vec![StartupStep::GenesisRead];

    let network = NetworkConfig::new(LEDGER_NAMESPACE, false, genesis_transactions);
    let config = AgentConfig::for_run(agent_name, transport.endpoints.clone());

    let store: Arc<dyn WalletStore> = match storage {
        Some(existing) => existing,
        // The legacy SDK keeps an unencrypted internal store; the modern
        // backend opens its encrypted wallet under the run's key material.
        None if use_legacy_backend => Arc::new(MemoryWallet::new()),
        None => Arc::new(EncryptedWallet::new(
            Arc::new(MemoryWallet::new()),
            &config.wallet_key,
        )),
    };

    let modules = compose(use_legacy_backend, &network, Arc::clone(&store), &config.wallet_id)?;
    trace.push(StartupStep::ModulesComposed);
    tracing::info!(
        backend = if use_legacy_backend { "legacy-ledger" } else { "modern-registry" },
        label = %config.label,
        wallet_id = %config.wallet_id,
        "composed agent modules"
    );

    let mut agent = Agent::new(config, modules, store, trace);
    agent.register_inbound(transport.inbound)?;
    agent.register_outbound(transport.outbound)?;
    agent.initialize().await?;
    agent.ensure_default_link_secret().await?;
    agent.attach_observer(message_sink.unwrap_or_else(|| Arc::new(TracingSink)));

    tracing::info!("agent ready");
    Ok(agent)
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// The live agent: owns the module set, the transport bindings, and the
/// event subscription.
pub struct Agent {
    config: AgentConfig,
    modules: Arc<ModuleSet>,
    store: Arc<dyn WalletStore>,
    inbound: Vec<Box<dyn InboundTransport>>,
    outbound: Vec<Box<dyn OutboundTransport>>,
    events: EventBus,
    identity: Option<AgentIdentity>,
    phase: Phase,
    trace: Vec<StartupStep>,
    observer: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("has_identity", &self.identity.is_some())
            .field("trace", &self.trace)
            .field("inbound_transports", &self.inbound.len())
            .field("outbound_transports", &self.outbound.len())
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Construct an agent from a composed module set. The result is in
    /// [`Phase::Constructed`]; callers continue with transport
    /// registration and [`initialize`](Self::initialize).
    pub fn new(
        config: AgentConfig,
        modules: ModuleSet,
        store: Arc<dyn WalletStore>,
        mut trace: Vec<StartupStep>,
    ) -> Self {
        trace.push(StartupStep::AgentConstructed);
        Self {
            config,
            modules: Arc::new(modules),
            store,
            inbound: vec![],
            outbound: vec![],
            events: EventBus::new(),
            identity: None,
            phase: Phase::Constructed,
            trace,
            observer: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The startup steps completed so far, in completion order.
    pub fn startup_trace(&self) -> &[StartupStep] {
        &self.trace
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The agent's `did:key` identity. `None` until initialize has run.
    pub fn identity(&self) -> Option<&AgentIdentity> {
        self.identity.as_ref()
    }

    /// A dispatcher for delivering inbound messages to this agent.
    pub fn dispatcher(&self) -> MessageDispatcher {
        MessageDispatcher::new(Arc::clone(&self.modules), self.events.clone())
    }

    /// Register inbound transports, preserving order. Duplicates are the
    /// caller's responsibility. Rejected once initialize has started.
    pub fn register_inbound(
        &mut self,
        transports: Vec<Box<dyn InboundTransport>>,
    ) -> Result<(), AgentError> {
        self.ensure_transports_open()?;
        for transport in transports {
            self.inbound.push(transport);
            self.trace.push(StartupStep::InboundTransportRegistered);
            self.phase = Phase::TransportsBound;
        }
        Ok(())
    }

    /// Register outbound transports, preserving order. Same rules as
    /// [`register_inbound`](Self::register_inbound).
    pub fn register_outbound(
        &mut self,
        transports: Vec<Box<dyn OutboundTransport>>,
    ) -> Result<(), AgentError> {
        self.ensure_transports_open()?;
        for transport in transports {
            self.outbound.push(transport);
            self.trace.push(StartupStep::OutboundTransportRegistered);
            self.phase = Phase::TransportsBound;
        }
        Ok(())
    }

    fn ensure_transports_open(&self) -> Result<(), AgentError> {
        match self.phase {
            Phase::Constructed | Phase::TransportsBound => Ok(()),
            _ => Err(AgentError::Configuration(
                "transports must be registered before initialize starts".into(),
            )),
        }
    }

    /// Initialize the agent: run every module's initialize hook, provision
    /// the agent's identity from the wallet, and start the inbound
    /// transports. Runs at most once.
    pub async fn initialize(&mut self) -> Result<(), AgentError> {
        match self.phase {
            Phase::Constructed | Phase::TransportsBound => {}
            _ => {
                return Err(AgentError::Configuration(format!(
                    "initialize is not valid in phase {:?}",
                    self.phase
                )))
            }
        }
        self.phase = Phase::Initializing;
        self.trace.push(StartupStep::InitializeStarted);

        let modules = Arc::clone(&self.modules);
        for module in modules.modules() {
            if let Err(e) = module.initialize().await {
                return Err(self.fail_init(format!("{} initialize: {e}", module.capability())));
            }
        }

        match self.load_or_generate_identity().await {
            Ok(identity) => {
                tracing::info!(did = %identity.did(), "agent identity provisioned");
                self.identity = Some(identity);
            }
            Err(e) => return Err(self.fail_init(format!("identity provisioning: {e}"))),
        }

        let dispatcher = MessageDispatcher::new(Arc::clone(&self.modules), self.events.clone());
        for transport in &mut self.inbound {
            if let Err(e) = transport.start(dispatcher.clone()).await {
                let reason = format!("inbound transport start: {e}");
                self.phase = Phase::Failed(reason.clone());
                return Err(AgentError::Initialization(reason));
            }
        }

        self.phase = Phase::Initialized;
        self.trace.push(StartupStep::InitializeCompleted);
        Ok(())
    }

    fn fail_init(&mut self, reason: String) -> AgentError {
        self.phase = Phase::Failed(reason.clone());
        AgentError::Initialization(reason)
    }

    /// Load the identity seed from the wallet, or generate and save one.
    async fn load_or_generate_identity(&self) -> Result<AgentIdentity, ModuleError> {
        if let Some(hex_seed) = self.store.get(CONFIG_CATEGORY, IDENTITY_SEED_RECORD).await? {
            let seed_bytes = hex::decode(&hex_seed)
                .map_err(|e| ModuleError::Internal(format!("invalid identity seed: {e}")))?;
            let seed: [u8; 32] = seed_bytes
                .try_into()
                .map_err(|_| ModuleError::Internal("identity seed must be 32 bytes".into()))?;
            Ok(AgentIdentity::from_seed(&seed))
        } else {
            let identity = AgentIdentity::generate();
            self.store
                .put(CONFIG_CATEGORY, IDENTITY_SEED_RECORD, &hex::encode(identity.seed()))
                .await?;
            Ok(identity)
        }
    }

    /// Verify the default link secret exists, creating it exactly once if
    /// absent. Valid only after a successful initialize — the registry API
    /// does not exist before then.
    pub async fn ensure_default_link_secret(&mut self) -> Result<(), AgentError> {
        if self.phase != Phase::Initialized {
            return Err(AgentError::Configuration(format!(
                "link-secret check is not valid in phase {:?}",
                self.phase
            )));
        }

        let registry = Arc::clone(self.modules.registry.registry());
        let ids = match registry.list_link_secret_ids().await {
            Ok(ids) => ids,
            Err(e) => return Err(self.fail_crypto(format!("listing link secrets: {e}"))),
        };

        if ids.is_empty() {
            match registry.create_link_secret().await {
                Ok(id) => tracing::info!(%id, "created default link secret"),
                Err(e) => return Err(self.fail_crypto(format!("creating link secret: {e}"))),
            }
        } else {
            tracing::debug!(count = ids.len(), "default link secret already present");
        }

        self.trace.push(StartupStep::LinkSecretVerified);
        self.phase = Phase::Ready;
        Ok(())
    }

    fn fail_crypto(&mut self, reason: String) -> AgentError {
        self.phase = Phase::Failed(reason.clone());
        AgentError::CryptoProvisioning(reason)
    }

    /// Attach the diagnostic event observer. Called once, at Ready.
    pub fn attach_observer(&mut self, sink: Arc<dyn MessageSink>) {
        if self.observer.is_none() {
            self.observer = Some(spawn_observer(&self.events, sink));
        }
    }

    /// Deliver an outbound message via the first registered transport that
    /// supports the endpoint's scheme.
    pub async fn send_message(
        &self,
        endpoint: &str,
        message: &AgentMessage,
    ) -> Result<(), TransportError> {
        let scheme = endpoint.split("://").next().unwrap_or_default();
        let transport = self
            .outbound
            .iter()
            .find(|t| t.supported_schemes().contains(&scheme))
            .ok_or_else(|| {
                TransportError::Send(format!("no outbound transport for scheme {scheme:?}"))
            })?;
        transport.send(endpoint, message).await
    }

    /// Stop transports and the event observer. The agent is not
    /// reconstructable afterwards.
    pub async fn shutdown(mut self) -> Result<(), TransportError> {
        for transport in &mut self.inbound {
            transport.stop().await?;
        }
        if let Some(observer) = self.observer.take() {
            observer.abort();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
