use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{Slot, SlotStatus, SwapRequest, SwapStatus};

/// Write failures reported by the persistence ports.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record {id} not found")]
    NotFound { id: Uuid },

    #[error("slot {slot_id} is {actual}, expected {expected}")]
    StaleStatus {
        slot_id: Uuid,
        expected: SlotStatus,
        actual: SlotStatus,
    },

    #[error("slot {slot_id} is owned by {actual}, expected {expected}")]
    OwnerChanged {
        slot_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    #[error("record {id} is at version {actual}, expected {expected}")]
    StaleVersion { id: Uuid, expected: u64, actual: u64 },

    #[error("swap request {id} is already {status}")]
    RequestResolved { id: Uuid, status: SwapStatus },

    /// A partially applied multi-slot transition could not be undone.
    #[error("failed to revert slot {slot_id} after partial transition: {source}")]
    CompensationFailed {
        slot_id: Uuid,
        #[source]
        source: Box<StoreError>,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Compare-and-swap request for a single slot: applies only while the slot
/// is still in `expected_status` and held by `expected_owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub slot_id: Uuid,
    pub expected_status: SlotStatus,
    pub expected_owner: Uuid,
    pub new_status: SlotStatus,
    pub new_owner: Option<Uuid>,
}

impl TransitionRequest {
    pub fn new(slot_id: Uuid, expected_owner: Uuid, from: SlotStatus, to: SlotStatus) -> Self {
        Self {
            slot_id,
            expected_status: from,
            expected_owner,
            new_status: to,
            new_owner: None,
        }
    }

    pub fn with_new_owner(mut self, owner: Uuid) -> Self {
        self.new_owner = Some(owner);
        self
    }
}

/// What a successful transition did. Fan-out works from this instead of
/// comparing records before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub slot_id: Uuid,
    pub from: SlotStatus,
    pub to: SlotStatus,
    pub previous_owner: Uuid,
    pub owner: Uuid,
    pub version: u64,
}

impl Transition {
    pub fn status_changed(&self) -> bool {
        self.from != self.to
    }

    pub fn owner_changed(&self) -> bool {
        self.previous_owner != self.owner
    }

    /// Request that undoes this transition.
    pub fn reverse(&self) -> TransitionRequest {
        let req = TransitionRequest::new(self.slot_id, self.owner, self.to, self.from);
        if self.owner_changed() {
            req.with_new_owner(self.previous_owner)
        } else {
            req
        }
    }
}

/// Result of an owner-initiated update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotUpdate {
    pub slot: Slot,
    /// Present when the write changed the slot's status.
    pub transition: Option<Transition>,
}

/// Port for the domain layer: slot persistence.
///
/// Negotiation writes go exclusively through [`SlotRepository::try_transition`]
/// and [`SlotRepository::try_transition_all`]; owner edits go through the
/// version-checked [`SlotRepository::update`] and [`SlotRepository::delete`].
#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Slot>>;

    /// Slots held by `owner_id`, ordered by start time.
    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Slot>>;

    /// Slots currently in `status`, ordered by start time.
    async fn list_by_status(&self, status: SlotStatus) -> anyhow::Result<Vec<Slot>>;

    async fn insert(&self, slot: Slot) -> anyhow::Result<()>;

    /// Replace the record if its stored version still equals `slot.version`.
    async fn update(&self, slot: Slot) -> Result<SlotUpdate, StoreError>;

    /// Remove the record if its stored version still equals `expected_version`.
    async fn delete(&self, id: Uuid, expected_version: u64) -> Result<Slot, StoreError>;

    /// Atomic compare-and-swap on status (and owner). Fails with `NotFound`
    /// when the slot is absent and with `StaleStatus`/`OwnerChanged` when the
    /// stored state no longer matches the request.
    async fn try_transition(&self, request: TransitionRequest) -> Result<Transition, StoreError>;

    /// Apply every transition or none of them.
    ///
    /// The default runs them one by one and, on the first failure, reverts the
    /// ones already applied in reverse order. Stores that can write several
    /// records atomically should override this.
    async fn try_transition_all(
        &self,
        requests: Vec<TransitionRequest>,
    ) -> Result<Vec<Transition>, StoreError> {
        let mut applied: Vec<Transition> = Vec::with_capacity(requests.len());
        for request in requests {
            match self.try_transition(request).await {
                Ok(t) => applied.push(t),
                Err(err) => {
                    for done in applied.iter().rev() {
                        tracing::warn!(
                            slot_id = %done.slot_id,
                            from = %done.to,
                            to = %done.from,
                            "reverting partially applied transition"
                        );
                        if let Err(revert_err) = self.try_transition(done.reverse()).await {
                            return Err(StoreError::CompensationFailed {
                                slot_id: done.slot_id,
                                source: Box::new(revert_err),
                            });
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(applied)
    }
}

/// Port for the domain layer: swap request persistence. Requests are never
/// deleted.
#[async_trait]
pub trait SwapRequestRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<SwapRequest>>;

    async fn insert(&self, request: SwapRequest) -> anyhow::Result<()>;

    /// Move a `Pending` request to a terminal status. Fails with
    /// `RequestResolved` if it already left `Pending`.
    async fn resolve(
        &self,
        id: Uuid,
        status: SwapStatus,
        at: DateTime<Utc>,
    ) -> Result<SwapRequest, StoreError>;

    /// Requests addressed to `user_id`, newest first.
    async fn list_by_receiver(&self, user_id: Uuid) -> anyhow::Result<Vec<SwapRequest>>;

    /// Requests sent by `user_id`, newest first.
    async fn list_by_requester(&self, user_id: Uuid) -> anyhow::Result<Vec<SwapRequest>>;

    /// Pending requests created strictly before `cutoff`, oldest first.
    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SwapRequest>>;
}
