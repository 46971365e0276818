//! In-process repository implementations for the domain ports.
//!
//! Each repository keeps its records behind a single `RwLock`, so every
//! write (including a multi-slot transition) is linearized and readers never
//! observe a half-applied batch.

use std::collections::HashMap;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::contract::model::{Slot, SlotStatus, SwapRequest, SwapStatus};
use crate::domain::repo::{
    SlotRepository, SlotUpdate, StoreError, SwapRequestRepository, Transition, TransitionRequest,
};

#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: RwLock<HashMap<Uuid, Slot>>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut slots: Vec<Slot>) -> Vec<Slot> {
        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        slots
    }
}

/// Compare-and-swap on one record.
fn apply_transition(
    slot: &mut Slot,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<Transition, StoreError> {
    if slot.status != request.expected_status {
        return Err(StoreError::StaleStatus {
            slot_id: slot.id,
            expected: request.expected_status,
            actual: slot.status,
        });
    }
    if slot.owner_id != request.expected_owner {
        return Err(StoreError::OwnerChanged {
            slot_id: slot.id,
            expected: request.expected_owner,
            actual: slot.owner_id,
        });
    }

    let from = slot.status;
    let previous_owner = slot.owner_id;
    slot.status = request.new_status;
    if let Some(owner) = request.new_owner {
        slot.owner_id = owner;
    }
    slot.version += 1;
    slot.updated_at = now;

    Ok(Transition {
        slot_id: slot.id,
        from,
        to: slot.status,
        previous_owner,
        owner: slot.owner_id,
        version: slot.version,
    })
}

#[async_trait::async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Slot>> {
        Ok(self.slots.read().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Slot>> {
        let slots = self
            .slots
            .read()
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(Self::sorted(slots))
    }

    async fn list_by_status(&self, status: SlotStatus) -> anyhow::Result<Vec<Slot>> {
        let slots = self
            .slots
            .read()
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect();
        Ok(Self::sorted(slots))
    }

    async fn insert(&self, slot: Slot) -> anyhow::Result<()> {
        let mut slots = self.slots.write();
        if slots.contains_key(&slot.id) {
            return Err(anyhow!("slot {} already exists", slot.id));
        }
        slots.insert(slot.id, slot);
        Ok(())
    }

    async fn update(&self, mut slot: Slot) -> Result<SlotUpdate, StoreError> {
        let mut slots = self.slots.write();
        let stored = slots
            .get_mut(&slot.id)
            .ok_or(StoreError::NotFound { id: slot.id })?;

        if stored.version != slot.version {
            return Err(StoreError::StaleVersion {
                id: slot.id,
                expected: slot.version,
                actual: stored.version,
            });
        }
        if stored.owner_id != slot.owner_id {
            return Err(StoreError::OwnerChanged {
                slot_id: slot.id,
                expected: slot.owner_id,
                actual: stored.owner_id,
            });
        }

        slot.version += 1;
        let transition = (stored.status != slot.status).then(|| Transition {
            slot_id: slot.id,
            from: stored.status,
            to: slot.status,
            previous_owner: stored.owner_id,
            owner: slot.owner_id,
            version: slot.version,
        });
        *stored = slot.clone();

        Ok(SlotUpdate { slot, transition })
    }

    async fn delete(&self, id: Uuid, expected_version: u64) -> Result<Slot, StoreError> {
        let mut slots = self.slots.write();
        let stored = slots.get(&id).ok_or(StoreError::NotFound { id })?;
        if stored.version != expected_version {
            return Err(StoreError::StaleVersion {
                id,
                expected: expected_version,
                actual: stored.version,
            });
        }
        slots.remove(&id).ok_or(StoreError::NotFound { id })
    }

    async fn try_transition(&self, request: TransitionRequest) -> Result<Transition, StoreError> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(&request.slot_id)
            .ok_or(StoreError::NotFound {
                id: request.slot_id,
            })?;
        apply_transition(slot, &request, Utc::now())
    }

    /// All-or-nothing: transitions are applied to scratch copies and written
    /// back only if every one of them succeeds.
    async fn try_transition_all(
        &self,
        requests: Vec<TransitionRequest>,
    ) -> Result<Vec<Transition>, StoreError> {
        let now = Utc::now();
        let mut slots = self.slots.write();

        let mut scratch: HashMap<Uuid, Slot> = HashMap::with_capacity(requests.len());
        let mut applied = Vec::with_capacity(requests.len());
        for request in &requests {
            if !scratch.contains_key(&request.slot_id) {
                let current = slots.get(&request.slot_id).ok_or(StoreError::NotFound {
                    id: request.slot_id,
                })?;
                scratch.insert(request.slot_id, current.clone());
            }
            let slot = scratch
                .get_mut(&request.slot_id)
                .ok_or(StoreError::NotFound {
                    id: request.slot_id,
                })?;
            applied.push(apply_transition(slot, request, now)?);
        }

        slots.extend(scratch);
        Ok(applied)
    }
}

#[derive(Default)]
pub struct InMemorySwapRequestRepository {
    requests: RwLock<HashMap<Uuid, SwapRequest>>,
}

impl InMemorySwapRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first<F>(&self, pred: F) -> Vec<SwapRequest>
    where
        F: Fn(&SwapRequest) -> bool,
    {
        let mut out: Vec<SwapRequest> = self
            .requests
            .read()
            .values()
            .filter(|r| pred(*r))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        out
    }
}

#[async_trait::async_trait]
impl SwapRequestRepository for InMemorySwapRequestRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<SwapRequest>> {
        Ok(self.requests.read().get(&id).cloned())
    }

    async fn insert(&self, request: SwapRequest) -> anyhow::Result<()> {
        let mut requests = self.requests.write();
        if requests.contains_key(&request.id) {
            return Err(anyhow!("swap request {} already exists", request.id));
        }
        requests.insert(request.id, request);
        Ok(())
    }

    async fn resolve(
        &self,
        id: Uuid,
        status: SwapStatus,
        at: DateTime<Utc>,
    ) -> Result<SwapRequest, StoreError> {
        let mut requests = self.requests.write();
        let stored = requests.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        if stored.status.is_terminal() {
            return Err(StoreError::RequestResolved {
                id,
                status: stored.status,
            });
        }
        stored.status = status;
        stored.updated_at = at;
        Ok(stored.clone())
    }

    async fn list_by_receiver(&self, user_id: Uuid) -> anyhow::Result<Vec<SwapRequest>> {
        Ok(self.newest_first(|r| r.receiver_id == user_id))
    }

    async fn list_by_requester(&self, user_id: Uuid) -> anyhow::Result<Vec<SwapRequest>> {
        Ok(self.newest_first(|r| r.requester_id == user_id))
    }

    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SwapRequest>> {
        let mut out = self.newest_first(|r| r.status == SwapStatus::Pending && r.created_at < cutoff);
        out.reverse();
        Ok(out)
    }
}
