use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::Router;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::field::Empty;

const REQUEST_ID: &str = "x-request-id";
const BODY_LIMIT: usize = 1024 * 1024;

/// Wrap the module router with the server-wide middleware stack.
/// Layers run bottom-up, so the request id is set before tracing sees it.
pub fn with_middleware(router: Router) -> Router {
    let x_request_id = HeaderName::from_static(REQUEST_ID);

    router
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        // Bounds time to response headers only; SSE bodies keep streaming.
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let rid = req
                    .headers()
                    .get(REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    request_id = %rid,
                    status = Empty,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
}
