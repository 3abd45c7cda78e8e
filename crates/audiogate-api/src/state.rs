//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use audiogate_access::{DownloadService, TokenIssuer, TokenStore};
use audiogate_core::config::AppConfig;
use audiogate_core::traits::StorageProvider;
use audiogate_media::MediaFetcher;

/// Shared application state. Cheap to clone: every field is a handle.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Token registry, shared with the sweeper.
    pub store: Arc<TokenStore>,
    /// Issues tokens for fetched files.
    pub issuer: Arc<TokenIssuer>,
    /// Opens token-gated downloads.
    pub downloads: Arc<DownloadService>,
    /// Produces audio files.
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Downloads directory.
    pub storage: Arc<dyn StorageProvider>,
}
