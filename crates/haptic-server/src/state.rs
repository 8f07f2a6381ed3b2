use std::sync::Arc;

use haptic_core::config::Config;
use haptic_core::sequencer::TracingActuator;
use haptic_core::{MessageRouter, PatternCatalog, RouterOptions};
use peer_link::{MemoryConnectivity, PeerSession, PeerSessionHandle, TransportAdapter};

/// Shared state for every handler.
///
/// The link is an in-memory stand-in: reachability and activation are driven
/// through the `/api/link/*` routes and the most recent send attempts are
/// visible at `/api/outbox`.
#[derive(Clone)]
pub struct AppState {
    pub session: PeerSessionHandle,
    pub catalog: Arc<PatternCatalog>,
    pub connectivity: MemoryConnectivity,
    pub config: Arc<Config>,
}

impl AppState {
    /// Spawns the peer session, so this must run inside a Tokio runtime.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(PatternCatalog::builtin()?);
        let connectivity =
            MemoryConnectivity::with_capacity(false, config.delivery.outbox_capacity);
        let router = MessageRouter::new(
            catalog.clone(),
            TracingActuator,
            RouterOptions::from_config(&config),
        );
        let transport = TransportAdapter::new(Arc::new(connectivity.clone()));
        let session = PeerSession::spawn(router, transport, config.haptics.clone());
        Ok(Self {
            session,
            catalog,
            connectivity,
            config: Arc::new(config),
        })
    }
}
