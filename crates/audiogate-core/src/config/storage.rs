//! Downloads directory configuration.

use serde::{Deserialize, Serialize};

/// Where produced audio files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory every token filename is resolved against.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,
    /// Delete leftover files from a previous process on startup.
    #[serde(default = "default_true")]
    pub purge_on_startup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
            purge_on_startup: true,
        }
    }
}

fn default_downloads_dir() -> String {
    "./downloads".to_string()
}

fn default_true() -> bool {
    true
}
