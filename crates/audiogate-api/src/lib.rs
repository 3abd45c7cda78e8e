//! # audiogate-api
//!
//! HTTP boundary for AudioGate built on Axum.
//!
//! Exposes the fetch-and-issue endpoint, the token-gated download endpoint
//! and a health probe, and maps every access failure class to its own
//! status code.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
