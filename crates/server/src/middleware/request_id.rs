//! Request correlation IDs.
//!
//! Every response carries `x-request-id`. A caller-supplied ID is reused so
//! logs line up with the caller's own, but only when it is at most
//! [`MAX_REQUEST_ID_LEN`] visible ASCII characters. Anything else is replaced
//! by a fresh UUID v4 before it reaches the tracing span or the Sentry scope.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{Span, debug};
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request ID that is kept.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// The caller's request ID, if it is safe to log and echo.
fn caller_request_id(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(REQUEST_ID_HEADER)?;
    let id = raw.to_str().ok().filter(|id| {
        !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
    });

    if id.is_none() {
        debug!(len = raw.len(), "Replacing malformed upstream request ID");
    }
    id
}

/// Tags the request with an ID and echoes it in the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = caller_request_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;

    // Accepted and generated IDs are visible ASCII
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
