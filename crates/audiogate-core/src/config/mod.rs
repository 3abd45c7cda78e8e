//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so the server can
//! start without any file present.

pub mod access;
pub mod app;
pub mod logging;
pub mod media;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::access::AccessConfig;
pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::LoggingConfig;
pub use self::media::MediaConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Smallest accepted token length in bytes (128 bits of entropy).
pub const MIN_TOKEN_BYTES: usize = 16;

/// Longest accepted token TTL (one year).
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `AUDIOGATE__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Downloads directory settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token issuance, TTL, and sweep settings.
    #[serde(default)]
    pub access: AccessConfig,
    /// External media-fetch tool settings.
    #[serde(default)]
    pub media: MediaConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `<config_dir>/default.toml`, the
    /// `<config_dir>/<env>.toml` overlay and `AUDIOGATE__` prefixed
    /// environment variables, then validate it.
    pub fn load(config_dir: &str, env: &str) -> Result<Self, AppError> {
        let dir = config_dir.trim_end_matches('/');
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AUDIOGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check the policy constants.
    ///
    /// A TTL that does not exceed the sweep interval is accepted but
    /// reported, since most tokens then get reclaimed with no grace window.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access.token_bytes < MIN_TOKEN_BYTES {
            return Err(AppError::configuration(format!(
                "access.token_bytes must be at least {MIN_TOKEN_BYTES}, got {}",
                self.access.token_bytes
            )));
        }
        if self.access.ttl_seconds == 0 {
            return Err(AppError::configuration("access.ttl_seconds must be positive"));
        }
        if self.access.ttl_seconds > MAX_TTL_SECONDS {
            return Err(AppError::configuration(format!(
                "access.ttl_seconds must be at most {MAX_TTL_SECONDS}, got {}",
                self.access.ttl_seconds
            )));
        }
        if self.access.sweep_interval_seconds == 0 {
            return Err(AppError::configuration(
                "access.sweep_interval_seconds must be positive",
            ));
        }
        if self.storage.downloads_dir.trim().is_empty() {
            return Err(AppError::configuration("storage.downloads_dir must not be empty"));
        }
        if self.media.binary.trim().is_empty() {
            return Err(AppError::configuration("media.binary must not be empty"));
        }
        if self.media.timeout_seconds == 0 {
            return Err(AppError::configuration("media.timeout_seconds must be positive"));
        }

        if self.access.ttl_seconds <= self.access.sweep_interval_seconds {
            tracing::warn!(
                ttl_seconds = self.access.ttl_seconds,
                sweep_interval_seconds = self.access.sweep_interval_seconds,
                "Token TTL does not exceed the sweep interval; tokens get no grace window"
            );
        }

        Ok(())
    }
}
