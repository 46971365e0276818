use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewSlot, Slot, SlotPatch, SlotStatus};
use crate::domain::error::DomainError;
use crate::domain::events::SwapDomainEvent;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::SlotRepository;

/// Owner-facing slot management.
///
/// Owners can freely toggle between `Busy` and `Swappable`; anything touching
/// `SwapPending` belongs to the negotiation engine.
#[derive(Clone)]
pub struct SlotService {
    repo: Arc<dyn SlotRepository>,
    events: Arc<dyn EventPublisher<SwapDomainEvent>>,
    max_title_length: usize,
}

impl SlotService {
    pub fn new(
        repo: Arc<dyn SlotRepository>,
        events: Arc<dyn EventPublisher<SwapDomainEvent>>,
        max_title_length: usize,
    ) -> Self {
        Self {
            repo,
            events,
            max_title_length,
        }
    }

    #[instrument(
        name = "slot_swap.slots.create_slot",
        skip(self, new_slot),
        fields(owner_id = %owner_id, title = %new_slot.title)
    )]
    pub async fn create_slot(&self, owner_id: Uuid, new_slot: NewSlot) -> Result<Slot, DomainError> {
        info!("Creating slot");

        self.validate_title(&new_slot.title)?;
        validate_window(&new_slot.start_time, &new_slot.end_time)?;
        let status = new_slot.status.unwrap_or(SlotStatus::Busy);
        ensure_owner_settable(status)?;

        let now = Utc::now();
        let slot = Slot {
            id: Uuid::new_v4(),
            owner_id,
            title: new_slot.title,
            start_time: new_slot.start_time,
            end_time: new_slot.end_time,
            status,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .insert(slot.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        self.events.publish(&SwapDomainEvent::SlotCreated {
            slot_id: slot.id,
            owner_id,
            status,
            at: now,
        });

        info!(slot_id = %slot.id, "Successfully created slot");
        Ok(slot)
    }

    #[instrument(
        name = "slot_swap.slots.update_slot",
        skip(self, patch),
        fields(owner_id = %owner_id, slot_id = %slot_id)
    )]
    pub async fn update_slot(
        &self,
        owner_id: Uuid,
        slot_id: Uuid,
        patch: SlotPatch,
    ) -> Result<Slot, DomainError> {
        info!("Updating slot");

        if let Some(ref title) = patch.title {
            self.validate_title(title)?;
        }
        if let Some(status) = patch.status {
            ensure_owner_settable(status)?;
        }

        let mut current = self.load_owned(owner_id, slot_id).await?;
        if current.status == SlotStatus::SwapPending {
            return Err(DomainError::precondition_failed(slot_id, current.status));
        }
        if patch.is_empty() {
            debug!("Empty patch, nothing to write");
            return Ok(current);
        }

        if let Some(title) = patch.title {
            current.title = title;
        }
        if let Some(start) = patch.start_time {
            current.start_time = start;
        }
        if let Some(end) = patch.end_time {
            current.end_time = end;
        }
        if let Some(status) = patch.status {
            current.status = status;
        }
        validate_window(&current.start_time, &current.end_time)?;
        current.updated_at = Utc::now();

        // Version-checked: a concurrent swap request that locked this slot
        // bumps the version and turns this write into a conflict.
        let outcome = self.repo.update(current).await?;

        if let Some(ref transition) = outcome.transition {
            for event in SwapDomainEvent::slots_updated(
                std::slice::from_ref(transition),
                outcome.slot.updated_at,
            ) {
                self.events.publish(&event);
            }
        }

        info!("Successfully updated slot");
        Ok(outcome.slot)
    }

    #[instrument(
        name = "slot_swap.slots.delete_slot",
        skip(self),
        fields(owner_id = %owner_id, slot_id = %slot_id)
    )]
    pub async fn delete_slot(&self, owner_id: Uuid, slot_id: Uuid) -> Result<(), DomainError> {
        info!("Deleting slot");

        let current = self.load_owned(owner_id, slot_id).await?;
        // A locked slot stays until its pending request resolves.
        if current.status == SlotStatus::SwapPending {
            return Err(DomainError::precondition_failed(slot_id, current.status));
        }

        self.repo.delete(slot_id, current.version).await?;

        self.events.publish(&SwapDomainEvent::SlotDeleted {
            slot_id,
            owner_id,
            at: Utc::now(),
        });

        info!("Successfully deleted slot");
        Ok(())
    }

    #[instrument(name = "slot_swap.slots.list_own_slots", skip(self), fields(owner_id = %owner_id))]
    pub async fn list_own_slots(&self, owner_id: Uuid) -> Result<Vec<Slot>, DomainError> {
        let slots = self
            .repo
            .list_by_owner(owner_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Found {} slots", slots.len());
        Ok(slots)
    }

    /// Slots owned by someone else are reported as missing.
    async fn load_owned(&self, owner_id: Uuid, slot_id: Uuid) -> Result<Slot, DomainError> {
        self.repo
            .find_by_id(slot_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .filter(|s| s.owner_id == owner_id)
            .ok_or_else(|| DomainError::slot_not_found(slot_id))
    }

    fn validate_title(&self, title: &str) -> Result<(), DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if title.chars().count() > self.max_title_length {
            return Err(DomainError::validation(
                "title",
                format!("longer than {} characters", self.max_title_length),
            ));
        }
        Ok(())
    }
}

fn validate_window(
    start: &chrono::DateTime<Utc>,
    end: &chrono::DateTime<Utc>,
) -> Result<(), DomainError> {
    if end <= start {
        return Err(DomainError::validation(
            "end_time",
            "must be later than start_time",
        ));
    }
    Ok(())
}

fn ensure_owner_settable(status: SlotStatus) -> Result<(), DomainError> {
    if status == SlotStatus::SwapPending {
        return Err(DomainError::invalid_operation(
            "SWAP_PENDING is set only by swap requests",
        ));
    }
    Ok(())
}
