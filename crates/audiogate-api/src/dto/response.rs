//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Body of a successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Download token for the produced file.
    pub token: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Tokens currently held in the store.
    pub live_tokens: usize,
    /// Downloads directory status.
    pub storage: String,
}
