//! Request/response logging middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::http;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Span, info};

/// Span for the trace layer. Records the path only, so the query string
/// and the token in it stay out of the logs at every level.
pub fn request_span<B>(request: &http::Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Logs request method, path, status, and duration.
///
/// The query string is left out: it carries download tokens.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "HTTP request"
    );

    response
}
