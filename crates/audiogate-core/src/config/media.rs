//! External media-fetch tool configuration.

use serde::{Deserialize, Serialize};

/// Settings for the `yt-dlp` invocation that produces audio files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Executable name or path.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Target audio codec passed to `--audio-format`.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Target bitrate passed to `--audio-quality`.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    /// Upper bound on one download + transcode, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_binary() -> String {
    "yt-dlp".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_timeout() -> u64 {
    600
}
