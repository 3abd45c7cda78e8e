//! yt-dlp backed media fetcher.
//!
//! Arguments are passed one by one (no shell), `--no-exec` blocks
//! post-processing hooks, and the output name is a fresh UUID so two
//! downloads never share a file.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use audiogate_core::config::MediaConfig;
use audiogate_core::error::{AppError, ErrorKind};
use audiogate_core::result::AppResult;

use crate::fetcher::MediaFetcher;

/// Upper bound on how much tool stderr ends up in an error message.
const STDERR_LIMIT: usize = 1000;

/// Runs the external `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    config: MediaConfig,
    downloads_dir: PathBuf,
}

impl YtDlpFetcher {
    /// Create a fetcher writing into `downloads_dir`.
    pub fn new(config: MediaConfig, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Command-line arguments for one download of `url` named `stem`.
    fn build_args(&self, url: &str, stem: &str) -> Vec<String> {
        let template = self
            .downloads_dir
            .join(format!("{stem}.%(ext)s"))
            .to_string_lossy()
            .into_owned();

        vec![
            "-f".into(),
            "bestaudio/best".into(),
            "-x".into(),
            "--audio-format".into(),
            self.config.audio_format.clone(),
            "--audio-quality".into(),
            self.config.audio_quality.clone(),
            "--no-playlist".into(),
            "--no-exec".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "-o".into(),
            template,
            url.to_string(),
        ]
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch_audio(&self, url: &str) -> AppResult<String> {
        let url = validate_url(url)?;
        let stem = Uuid::new_v4().to_string();

        info!(%url, stem = %stem, "Fetching audio");

        let child = Command::new(&self.config.binary)
            .args(self.build_args(url, &stem))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let output = match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    format!("{} is not installed", self.config.binary),
                    e,
                ));
            }
            Ok(Err(e)) => {
                return Err(AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Failed to run {}", self.config.binary),
                    e,
                ));
            }
            Err(_) => {
                warn!(%url, timeout_seconds = self.config.timeout_seconds, "Audio fetch timed out");
                discard_partials(&self.downloads_dir, &stem).await;
                return Err(AppError::external_service(format!(
                    "{} timed out after {}s",
                    self.config.binary, self.config.timeout_seconds
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.chars().take(STDERR_LIMIT).collect();
            discard_partials(&self.downloads_dir, &stem).await;
            return Err(AppError::external_service(format!(
                "{} failed: {}",
                self.config.binary,
                stderr.trim()
            )));
        }

        let filename =
            locate_output(&self.downloads_dir, &stem, &self.config.audio_format).await?;
        debug!(filename = %filename, "Audio fetched");
        Ok(filename)
    }
}

/// Accept only http(s) URLs.
fn validate_url(url: &str) -> AppResult<&str> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed)
    } else {
        Err(AppError::validation(
            "Invalid URL (must start with http:// or https://)",
        ))
    }
}

/// Find the file the tool produced for `stem`: the expected extension
/// first, otherwise any file with that stem.
async fn locate_output(dir: &Path, stem: &str, audio_format: &str) -> AppResult<String> {
    let expected = format!("{stem}.{audio_format}");
    if tokio::fs::try_exists(dir.join(&expected))
        .await
        .unwrap_or(false)
    {
        return Ok(expected);
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                return Ok(name.to_string());
            }
        }
    }

    discard_partials(dir, stem).await;
    Err(AppError::external_service(
        "Audio file was not created successfully",
    ))
}

/// Remove whatever a failed run left for `stem` (`.part`, `.ytdl`,
/// intermediate formats). Nothing references these files.
async fn discard_partials(dir: &Path, stem: &str) {
    let prefix = format!("{stem}.");
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Failed to scan downloads for leftovers");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&prefix) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => debug!(file = name, "Removed leftover download"),
            Err(e) => warn!(file = name, error = %e, "Failed to remove leftover download"),
        }
    }
}
