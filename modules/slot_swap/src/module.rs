use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::api::rest::sse::RealtimeChannel;
use crate::config::SlotSwapConfig;
use crate::contract::client::SlotSwapApi;
use crate::domain::repo::{SlotRepository, SwapRequestRepository};
use crate::domain::service::Service;
use crate::gateways::local::SlotSwapLocalClient;
use crate::infra::realtime::{ConnectionRegistry, NotificationFanout};
use crate::infra::storage::{InMemorySlotRepository, InMemorySwapRequestRepository};

/// The slot_swap module: stores, negotiation engine, realtime fan-out and the
/// REST surface wired together.
#[derive(Clone)]
pub struct SlotSwap {
    service: Arc<Service>,
    registry: Arc<ConnectionRegistry>,
    config: SlotSwapConfig,
    shutdown: CancellationToken,
}

impl SlotSwap {
    /// Module backed by the in-process stores.
    pub fn new(config: SlotSwapConfig) -> Self {
        Self::with_repositories(
            config,
            Arc::new(InMemorySlotRepository::new()),
            Arc::new(InMemorySwapRequestRepository::new()),
        )
    }

    pub fn with_repositories(
        config: SlotSwapConfig,
        slots: Arc<dyn SlotRepository>,
        requests: Arc<dyn SwapRequestRepository>,
    ) -> Self {
        info!("Initializing slot_swap module");
        debug!(
            "Loaded slot_swap config: max_title_length={}, realtime_buffer={}, pending_ttl={:?}",
            config.max_title_length, config.realtime_buffer, config.pending_ttl
        );

        // Wire repositories (infra) and the fan-out adapter to the domain service (ports)
        let registry = Arc::new(ConnectionRegistry::new());
        let events = Arc::new(NotificationFanout::new(registry.clone()));
        let service = Service::new(slots, requests, events, config.service_config());

        Self {
            service: Arc::new(service),
            registry,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }

    /// Local in-process client for other modules.
    pub fn client(&self) -> Arc<dyn SlotSwapApi> {
        Arc::new(SlotSwapLocalClient::new(self.service.clone()))
    }

    pub fn router(&self) -> Router {
        info!("Registering slot_swap REST routes");
        let router = routes::register_routes(Router::new(), self.service.clone());
        routes::register_realtime_route(
            router,
            RealtimeChannel::new(
                self.registry.clone(),
                self.config.realtime_buffer,
                self.shutdown.clone(),
            ),
        )
    }

    /// End every open realtime stream. Graceful HTTP shutdown waits for
    /// in-flight bodies, so call this before (or while) draining the server.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!(
                connections = self.registry.total_connections(),
                "Closing realtime streams"
            );
        }
        self.shutdown.cancel();
    }

    /// Start background work. Returns `None` when pending requests never expire.
    pub fn start_background(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        match self.service.expiry_sweeper() {
            Some(sweeper) => Some(sweeper.spawn(cancel)),
            None => {
                debug!("No pending_ttl configured, expiry sweeper disabled");
                None
            }
        }
    }
}
