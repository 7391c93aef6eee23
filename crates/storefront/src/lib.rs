//! Zahra Fashion storefront library.
//!
//! This crate provides the storefront HTTP API as a library so the binary,
//! the CLI and the integration tests all build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::from_fn,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::db::Store;
use crate::services::uploads::UPLOADS_URL_PREFIX;
use crate::state::AppState;

/// Room for multipart framing and text fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Assemble the storefront application.
///
/// `routes` is either [`routes::routes`] or [`routes::rate_limited_routes`];
/// the latter needs the server to provide `ConnectInfo<SocketAddr>` or a
/// proxy IP header. Sentry layers are added by the binary.
pub fn app<S, T>(
    state: AppState<S>,
    session_layer: SessionManagerLayer<T>,
    routes: Router<AppState<S>>,
) -> Router
where
    S: Store,
    T: SessionStore + Clone,
{
    let body_limit = state.config().max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let uploads = ServeDir::new(state.uploads().dir());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .merge(routes)
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
}

/// Request span with an empty `request_id` field for the request ID
/// middleware to fill in.
fn make_request_span(request: &axum::extract::Request) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
