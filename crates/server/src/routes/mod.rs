//! HTTP route handlers for the client registry.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health              - Liveness check
//! GET    /health/ready        - Readiness check (database)
//!
//! # Clients (JSON)
//! GET    /clients             - List all clients
//! POST   /clients             - Create a client
//! GET    /clients/{id}        - Get a client
//! PUT    /clients/{id}        - Replace a client
//! DELETE /clients/{id}        - Delete a client
//! ```

pub mod clients;
pub mod health;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the client routes router.
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(clients::index).post(clients::create))
        .route(
            "/{id}",
            get(clients::show)
                .put(clients::update)
                .delete(clients::delete),
        )
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/clients", client_routes())
}

/// Build the complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Request span with an empty `request_id` slot for the request ID middleware.
fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}
