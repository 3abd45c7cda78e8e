//! Media fetcher trait.

use async_trait::async_trait;

use audiogate_core::result::AppResult;

/// Downloads the audio track behind a URL into the downloads directory.
#[async_trait]
pub trait MediaFetcher: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch and transcode `url`, returning the produced filename relative
    /// to the downloads directory.
    async fn fetch_audio(&self, url: &str) -> AppResult<String>;
}
