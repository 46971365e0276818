use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::SlotSwapApi,
    error::SlotSwapError,
    model::{NewSlot, Slot, SlotPatch, SwapRequest, SwapRequestListing},
};
use crate::domain::service::Service;

/// Local implementation of the SlotSwapApi trait that delegates to the domain service
pub struct SlotSwapLocalClient {
    service: Arc<Service>,
}

impl SlotSwapLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SlotSwapApi for SlotSwapLocalClient {
    async fn create_slot(&self, owner_id: Uuid, new_slot: NewSlot) -> Result<Slot, SlotSwapError> {
        self.service
            .create_slot(owner_id, new_slot)
            .await
            .map_err(Into::into)
    }

    async fn update_slot(
        &self,
        owner_id: Uuid,
        slot_id: Uuid,
        patch: SlotPatch,
    ) -> Result<Slot, SlotSwapError> {
        self.service
            .update_slot(owner_id, slot_id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_slot(&self, owner_id: Uuid, slot_id: Uuid) -> Result<(), SlotSwapError> {
        self.service
            .delete_slot(owner_id, slot_id)
            .await
            .map_err(Into::into)
    }

    async fn list_own_slots(&self, owner_id: Uuid) -> Result<Vec<Slot>, SlotSwapError> {
        self.service.list_own_slots(owner_id).await.map_err(Into::into)
    }

    async fn list_swappable(&self, excluding_user_id: Uuid) -> Result<Vec<Slot>, SlotSwapError> {
        self.service
            .list_swappable(excluding_user_id)
            .await
            .map_err(Into::into)
    }

    async fn create_swap_request(
        &self,
        requester_id: Uuid,
        offered_slot_id: Uuid,
        wanted_slot_id: Uuid,
    ) -> Result<SwapRequest, SlotSwapError> {
        self.service
            .create_swap_request(requester_id, offered_slot_id, wanted_slot_id)
            .await
            .map_err(Into::into)
    }

    async fn respond_to_swap(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        accept: bool,
    ) -> Result<SwapRequest, SlotSwapError> {
        self.service
            .respond_to_swap(responder_id, request_id, accept)
            .await
            .map_err(Into::into)
    }

    async fn list_requests(&self, user_id: Uuid) -> Result<SwapRequestListing, SlotSwapError> {
        self.service.list_requests(user_id).await.map_err(Into::into)
    }
}
