//! Storage provider trait for the downloads directory.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Filename relative to the storage root.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME type (if known).
    pub mime_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether this is a directory.
    pub is_directory: bool,
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for the durable storage that backs issued tokens.
///
/// Paths are relative names resolved against a single root, so the
/// download path and the expiration sweeper always agree on which file a
/// token refers to.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Open a file and return its byte stream.
    ///
    /// A missing file is reported as `ErrorKind::NotFound`.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Write bytes to a file at the given path.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Delete a file at the given path.
    ///
    /// A missing file is reported as `ErrorKind::NotFound`.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Check whether a file exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Get metadata about a file.
    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta>;

    /// List the files directly under the root.
    async fn list(&self) -> AppResult<Vec<StorageObjectMeta>>;
}
