//! Tower middleware applied to every route.
//!
//! Layers run outermost first on the way in:
//!
//! 1. `SetRequestId`: stamps a UUID v4 `x-request-id`
//! 2. `Trace`: one span per request
//! 3. `Compression`: gzip
//! 4. `CORS`
//! 5. `Timeout`: 408 once `request_timeout` elapses
//! 6. in-flight tracking, which also refuses new work while draining
//! 7. `PropagateRequestId`: echoes `x-request-id` on the response

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;
use super::shutdown::ShutdownController;

const REQUEST_ID: &str = "x-request-id";

/// Wraps `router` in the full middleware stack.
pub fn apply_http_layers(
    router: Router,
    config: &NetworkConfig,
    shutdown: Arc<ShutdownController>,
) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(build_cors_layer(&config.cors_origins))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(from_fn_with_state(shutdown, track_in_flight))
            .layer(PropagateRequestIdLayer::new(request_id)),
    )
}

/// Holds an in-flight guard for the lifetime of the request.
///
/// Health probes are always admitted so orchestrators can watch a drain.
async fn track_in_flight(
    State(shutdown): State<Arc<ShutdownController>>,
    request: Request,
    next: Next,
) -> Response {
    let is_probe = request.uri().path().starts_with("/health");
    if !is_probe && !shutdown.health_state().accepts_requests() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let _guard = shutdown.in_flight_guard();
    next.run(request).await
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}
