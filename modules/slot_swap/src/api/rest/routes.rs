use crate::api::rest::handlers;
use crate::api::rest::sse::{self, RealtimeChannel};
use crate::domain::service::Service;
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;

/// REST routes for slots, the marketplace and swap negotiation.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        // Slots of the caller
        .route(
            "/api/events",
            get(handlers::list_my_slots).post(handlers::create_slot),
        )
        .route(
            "/api/events/{id}",
            put(handlers::update_slot).delete(handlers::delete_slot),
        )
        // Marketplace (the second path is kept for older clients)
        .route(
            "/api/events/market/swappable",
            get(handlers::list_swappable),
        )
        .route("/api/swappable-slots", get(handlers::list_swappable))
        // Negotiation
        .route("/api/requests", get(handlers::list_requests))
        .route("/api/swap-request", post(handlers::create_swap_request))
        .route("/api/swap-response/{id}", post(handlers::respond_to_swap))
        .route("/health", get(handlers::health))
        .layer(Extension(service))
}

/// Register the realtime SSE route. Streams live until the client leaves or
/// the channel's shutdown token fires.
pub fn register_realtime_route(router: Router, channel: RealtimeChannel) -> Router {
    let realtime = Router::new()
        .route("/api/realtime", get(sse::realtime_events))
        .layer(Extension(channel));
    router.merge(realtime)
}
