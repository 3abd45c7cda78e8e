//! Route definitions for the AudioGate HTTP API.

use axum::body::Body;
use axum::http::Request;
use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .route("/", get(handlers::audio::fetch_audio))
        .route("/download", get(handlers::download::download_audio))
        .route("/health", get(handlers::health::health))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    middleware::logging::request_span(request)
                }),
        )
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
