use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::SlotSwapError,
    model::{NewSlot, Slot, SlotPatch, SwapRequest, SwapRequestListing},
};

/// Public API of the slot_swap module. Every call carries the id of the
/// already-authenticated actor.
#[async_trait]
pub trait SlotSwapApi: Send + Sync {
    /// Create a slot owned by `owner_id`
    async fn create_slot(&self, owner_id: Uuid, new_slot: NewSlot) -> Result<Slot, SlotSwapError>;

    /// Update one of the actor's slots
    async fn update_slot(
        &self,
        owner_id: Uuid,
        slot_id: Uuid,
        patch: SlotPatch,
    ) -> Result<Slot, SlotSwapError>;

    /// Delete one of the actor's slots
    async fn delete_slot(&self, owner_id: Uuid, slot_id: Uuid) -> Result<(), SlotSwapError>;

    /// List the actor's own slots
    async fn list_own_slots(&self, owner_id: Uuid) -> Result<Vec<Slot>, SlotSwapError>;

    /// List slots other users currently offer for exchange
    async fn list_swappable(&self, excluding_user_id: Uuid) -> Result<Vec<Slot>, SlotSwapError>;

    /// Propose exchanging one of the actor's slots for someone else's.
    /// BUSY slots give `PreconditionFailed`; SWAP_PENDING slots give a
    /// retryable `Conflict`.
    async fn create_swap_request(
        &self,
        requester_id: Uuid,
        offered_slot_id: Uuid,
        wanted_slot_id: Uuid,
    ) -> Result<SwapRequest, SlotSwapError>;

    /// Accept or reject a request addressed to the actor
    async fn respond_to_swap(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        accept: bool,
    ) -> Result<SwapRequest, SlotSwapError>;

    /// Incoming and outgoing requests of the actor
    async fn list_requests(&self, user_id: Uuid) -> Result<SwapRequestListing, SlotSwapError>;
}
