//! Local filesystem storage provider rooted at the downloads directory.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use audiogate_core::error::{AppError, ErrorKind};
use audiogate_core::result::AppResult;
use audiogate_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

/// Local filesystem storage provider.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Directory holding every downloadable file.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path,
    /// creating the directory if needed.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create downloads directory: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Root directory of this provider.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Resolve a filename to an absolute path inside the root.
    ///
    /// Only flat names are accepted: anything that could climb out of the
    /// root or into a subdirectory is rejected.
    fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.contains('\0')
        {
            return Err(AppError::validation(format!("Invalid filename: {name:?}")));
        }
        Ok(self.root.join(name))
    }
}

fn map_io(err: std::io::Error, action: &str, name: &str) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::with_source(ErrorKind::NotFound, format!("File not found: {name}"), err)
    } else {
        AppError::with_source(ErrorKind::Storage, format!("Failed to {action}: {name}"), err)
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match fs::metadata(&self.root).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(_) => Ok(false),
        }
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| map_io(e, "open file", path))?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        fs::write(&full_path, &data)
            .await
            .map_err(|e| map_io(e, "write file", path))?;

        debug!(path, bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| map_io(e, "delete file", path))?;

        debug!(path, "Deleted file");
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        match fs::metadata(&full_path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io(e, "stat file", path)),
        }
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| map_io(e, "get metadata", path))?;

        if !meta.is_file() {
            return Err(AppError::not_found(format!("Not a file: {path}")));
        }

        let last_modified = meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from);

        Ok(StorageObjectMeta {
            path: path.to_string(),
            size_bytes: meta.len(),
            mime_type: mime_from_path(path),
            last_modified,
            is_directory: false,
        })
    }

    async fn list(&self) -> AppResult<Vec<StorageObjectMeta>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to list downloads directory", e)
        })?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let entry_meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to get entry metadata", e)
            })?;

            let name = entry.file_name().to_string_lossy().to_string();
            let last_modified = entry_meta
                .modified()
                .ok()
                .map(chrono::DateTime::<chrono::Utc>::from);

            entries.push(StorageObjectMeta {
                mime_type: if entry_meta.is_file() {
                    mime_from_path(&name)
                } else {
                    None
                },
                path: name,
                size_bytes: entry_meta.len(),
                last_modified,
                is_directory: entry_meta.is_dir(),
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

/// Guess MIME type from a file extension.
pub fn mime_from_path(path: &str) -> Option<String> {
    let (_, ext) = path.rsplit_once('.')?;
    let mime = match ext.to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        _ => return None,
    };
    Some(mime.to_string())
}
