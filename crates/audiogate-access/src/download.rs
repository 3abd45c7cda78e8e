//! Serve-time contract: authorize the token, confirm the file, open it.

use std::sync::Arc;

use audiogate_core::error::{AppError, ErrorKind};
use audiogate_core::result::AppResult;
use audiogate_core::traits::storage::{ByteStream, StorageProvider};

use crate::store::TokenStore;
use crate::token_prefix;
use crate::validator::AccessValidator;

/// An opened download ready to be streamed to the client.
pub struct AudioDownload {
    /// Filename for Content-Disposition.
    pub filename: String,
    /// MIME type for Content-Type.
    pub content_type: String,
    /// File size at open time.
    pub size_bytes: u64,
    /// File content.
    pub stream: ByteStream,
}

impl std::fmt::Debug for AudioDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDownload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

/// Opens token-gated downloads.
#[derive(Debug, Clone)]
pub struct DownloadService {
    validator: AccessValidator,
    store: Arc<TokenStore>,
    storage: Arc<dyn StorageProvider>,
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(
        validator: AccessValidator,
        store: Arc<TokenStore>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            validator,
            store,
            storage,
        }
    }

    /// Open the file behind `token`.
    ///
    /// The sweeper may reclaim the file between authorization and the
    /// open; either step failing to find it yields `NotFound`.
    pub async fn open(&self, token: &str) -> AppResult<AudioDownload> {
        let record = self.validator.authorize(token)?;
        let filename = record.filename;

        let meta = self
            .storage
            .metadata(&filename)
            .await
            .map_err(|e| missing_file(e, token, &filename))?;
        let stream = self
            .storage
            .read(&filename)
            .await
            .map_err(|e| missing_file(e, token, &filename))?;

        if self.validator.single_use() && self.store.mark_consumed(token).is_none() {
            // Lost the race to a concurrent redemption, or the sweeper won.
            return Err(if self.store.exists(token) {
                AppError::gone("Token has already been used.")
            } else {
                AppError::unauthorized("Invalid token.")
            });
        }

        tracing::info!(
            token = token_prefix(token),
            filename = %filename,
            size_bytes = meta.size_bytes,
            "Serving download"
        );

        Ok(AudioDownload {
            content_type: meta
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: meta.size_bytes,
            filename,
            stream,
        })
    }
}

fn missing_file(err: AppError, token: &str, filename: &str) -> AppError {
    if err.is(ErrorKind::NotFound) {
        tracing::warn!(
            token = token_prefix(token),
            filename,
            "File vanished for a valid token"
        );
        AppError::not_found("File not found.")
    } else {
        err
    }
}
