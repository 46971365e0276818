use axum::{
    extract::Path,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::auth::AuthUser;
use crate::api::rest::dto::{
    CreateSlotReq, CreateSwapReq, DeletedDto, RespondSwapReq, SlotDto, SlotEnvelope, SlotListDto,
    SwapEnvelope, SwapRequestListingDto, UpdateSlotReq,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::problem::ProblemResponse;
use crate::domain::service::Service;

fn slot_list(slots: Vec<crate::contract::model::Slot>) -> SlotListDto {
    SlotListDto {
        events: slots.into_iter().map(SlotDto::from).collect(),
    }
}

/// List the caller's own slots
pub async fn list_my_slots(
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    uri: Uri,
) -> Result<Json<SlotListDto>, ProblemResponse> {
    info!("Listing slots of user {}", user_id);

    match svc.list_own_slots(user_id).await {
        Ok(slots) => Ok(Json(slot_list(slots))),
        Err(e) => {
            error!("Failed to list slots of {}: {}", user_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create a slot owned by the caller
pub async fn create_slot(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    Json(req_body): Json<CreateSlotReq>,
) -> Result<(StatusCode, Json<SlotEnvelope>), ProblemResponse> {
    info!("Creating slot: {:?}", req_body);

    match svc.create_slot(user_id, req_body.into()).await {
        Ok(slot) => Ok((
            StatusCode::CREATED,
            Json(SlotEnvelope {
                event: SlotDto::from(slot),
            }),
        )),
        Err(e) => {
            error!("Failed to create slot: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Update one of the caller's slots
pub async fn update_slot(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req_body): Json<UpdateSlotReq>,
) -> Result<Json<SlotEnvelope>, ProblemResponse> {
    info!("Updating slot {} with: {:?}", id, req_body);

    match svc.update_slot(user_id, id, req_body.into()).await {
        Ok(slot) => Ok(Json(SlotEnvelope {
            event: SlotDto::from(slot),
        })),
        Err(e) => {
            error!("Failed to update slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete one of the caller's slots
pub async fn delete_slot(
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<DeletedDto>, ProblemResponse> {
    info!("Deleting slot: {}", id);

    match svc.delete_slot(user_id, id).await {
        Ok(()) => Ok(Json(DeletedDto { ok: true })),
        Err(e) => {
            error!("Failed to delete slot {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Slots other users offer for exchange
pub async fn list_swappable(
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    uri: Uri,
) -> Result<Json<SlotListDto>, ProblemResponse> {
    match svc.list_swappable(user_id).await {
        Ok(slots) => Ok(Json(slot_list(slots))),
        Err(e) => {
            error!("Failed to list marketplace: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Incoming and outgoing swap requests of the caller
pub async fn list_requests(
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    uri: Uri,
) -> Result<Json<SwapRequestListingDto>, ProblemResponse> {
    match svc.list_requests(user_id).await {
        Ok(listing) => Ok(Json(listing.into())),
        Err(e) => {
            error!("Failed to list requests of {}: {}", user_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Propose a swap of the caller's slot for someone else's
pub async fn create_swap_request(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    Json(req_body): Json<CreateSwapReq>,
) -> Result<(StatusCode, Json<SwapEnvelope>), ProblemResponse> {
    info!("Creating swap request: {:?}", req_body);

    match svc
        .create_swap_request(user_id, req_body.my_slot_id, req_body.their_slot_id)
        .await
    {
        Ok(request) => Ok((
            StatusCode::CREATED,
            Json(SwapEnvelope {
                swap: request.into(),
            }),
        )),
        Err(e) => {
            error!("Failed to create swap request: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Accept or reject a swap request addressed to the caller
pub async fn respond_to_swap(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req_body): Json<RespondSwapReq>,
) -> Result<Json<SwapEnvelope>, ProblemResponse> {
    info!("Responding to swap request {}: accepted={}", id, req_body.accepted);

    match svc.respond_to_swap(user_id, id, req_body.accepted).await {
        Ok(request) => Ok(Json(SwapEnvelope {
            swap: request.into(),
        })),
        Err(e) => {
            error!("Failed to respond to swap request {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
