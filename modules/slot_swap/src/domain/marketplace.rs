use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::contract::model::{Slot, SlotStatus};
use crate::domain::error::DomainError;
use crate::domain::repo::SlotRepository;

/// Read-only projection of slots open for swap requests. Holds no state;
/// every call reads the store fresh.
#[derive(Clone)]
pub struct MarketplaceView {
    repo: Arc<dyn SlotRepository>,
}

impl MarketplaceView {
    pub fn new(repo: Arc<dyn SlotRepository>) -> Self {
        Self { repo }
    }

    /// `Swappable` slots not owned by `excluding_user_id`, by start time.
    #[instrument(
        name = "slot_swap.marketplace.list_swappable",
        skip(self),
        fields(excluding_user_id = %excluding_user_id)
    )]
    pub async fn list_swappable(&self, excluding_user_id: Uuid) -> Result<Vec<Slot>, DomainError> {
        let slots: Vec<Slot> = self
            .repo
            .list_by_status(SlotStatus::Swappable)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .into_iter()
            .filter(|s| s.owner_id != excluding_user_id)
            .collect();
        debug!("Marketplace has {} slots", slots.len());
        Ok(slots)
    }
}
