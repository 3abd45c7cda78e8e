//! Startup purge of files no live token can reach.

use std::sync::Arc;

use audiogate_core::error::ErrorKind;
use audiogate_core::result::AppResult;
use audiogate_core::traits::storage::StorageProvider;

/// Deletes files left in the downloads directory by a previous process.
///
/// The token store does not survive a restart, so anything on disk at
/// startup is unreachable and would never be swept.
#[derive(Debug, Clone)]
pub struct OrphanPurge {
    /// Storage provider for the downloads directory.
    provider: Arc<dyn StorageProvider>,
}

impl OrphanPurge {
    /// Create a new orphan purge handler.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Delete every regular file in the downloads directory.
    ///
    /// Returns the number of files removed. Individual failures are logged
    /// and skipped.
    pub async fn purge_orphans(&self) -> AppResult<usize> {
        let entries = self.provider.list().await?;
        let mut removed = 0usize;

        for entry in entries.into_iter().filter(|e| !e.is_directory) {
            match self.provider.delete(&entry.path).await {
                Ok(()) => removed += 1,
                Err(e) if e.is(ErrorKind::NotFound) => {}
                Err(e) => {
                    tracing::warn!(filename = %entry.path, error = %e, "Failed to purge orphan file");
                }
            }
        }

        if removed > 0 {
            tracing::info!(count = removed, "Purged orphan downloads");
        }
        Ok(removed)
    }
}
