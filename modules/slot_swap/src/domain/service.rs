use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::contract::model::{NewSlot, Slot, SlotPatch, SwapRequest, SwapRequestListing};
use crate::domain::error::DomainError;
use crate::domain::events::SwapDomainEvent;
use crate::domain::expiry::ExpirySweeper;
use crate::domain::marketplace::MarketplaceView;
use crate::domain::negotiation::NegotiationEngine;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{SlotRepository, SwapRequestRepository};
use crate::domain::slots::SlotService;

/// Domain service facade: slot management, the marketplace view and the
/// negotiation engine behind one handle.
/// Depends only on the repository and publisher ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    slots: SlotService,
    marketplace: MarketplaceView,
    engine: NegotiationEngine,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_title_length: usize,
    /// `None` keeps pending requests open until answered.
    pub pending_ttl: Option<Duration>,
    pub sweep_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_title_length: 200,
            pending_ttl: None,
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        requests: Arc<dyn SwapRequestRepository>,
        events: Arc<dyn EventPublisher<SwapDomainEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            slots: SlotService::new(
                slots.clone(),
                events.clone(),
                config.max_title_length,
            ),
            marketplace: MarketplaceView::new(slots.clone()),
            engine: NegotiationEngine::new(slots, requests, events),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn engine(&self) -> &NegotiationEngine {
        &self.engine
    }

    /// Sweeper for the configured TTL, if one is set.
    pub fn expiry_sweeper(&self) -> Option<ExpirySweeper> {
        self.config
            .pending_ttl
            .map(|ttl| ExpirySweeper::new(self.engine.clone(), ttl, self.config.sweep_interval))
    }

    pub async fn create_slot(&self, owner_id: Uuid, new_slot: NewSlot) -> Result<Slot, DomainError> {
        self.slots.create_slot(owner_id, new_slot).await
    }

    pub async fn update_slot(
        &self,
        owner_id: Uuid,
        slot_id: Uuid,
        patch: SlotPatch,
    ) -> Result<Slot, DomainError> {
        self.slots.update_slot(owner_id, slot_id, patch).await
    }

    pub async fn delete_slot(&self, owner_id: Uuid, slot_id: Uuid) -> Result<(), DomainError> {
        self.slots.delete_slot(owner_id, slot_id).await
    }

    pub async fn list_own_slots(&self, owner_id: Uuid) -> Result<Vec<Slot>, DomainError> {
        self.slots.list_own_slots(owner_id).await
    }

    pub async fn list_swappable(&self, excluding_user_id: Uuid) -> Result<Vec<Slot>, DomainError> {
        self.marketplace.list_swappable(excluding_user_id).await
    }

    pub async fn create_swap_request(
        &self,
        requester_id: Uuid,
        offered_slot_id: Uuid,
        wanted_slot_id: Uuid,
    ) -> Result<SwapRequest, DomainError> {
        self.engine
            .create_swap_request(requester_id, offered_slot_id, wanted_slot_id)
            .await
    }

    pub async fn respond_to_swap(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        accept: bool,
    ) -> Result<SwapRequest, DomainError> {
        self.engine
            .respond_to_swap(responder_id, request_id, accept)
            .await
    }

    pub async fn list_requests(&self, user_id: Uuid) -> Result<SwapRequestListing, DomainError> {
        self.engine.list_requests(user_id).await
    }
}
