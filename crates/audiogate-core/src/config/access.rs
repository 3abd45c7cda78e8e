//! Download token policy configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token entropy, lifetime, and reclamation cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Random bytes drawn per token before URL-safe encoding.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
    /// Seconds a token stays valid after issuance.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Seconds between two expiration sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// When set, a token may be used for one download only.
    #[serde(default)]
    pub single_use: bool,
}

impl AccessConfig {
    /// Token time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Pause between sweep cycles.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            token_bytes: default_token_bytes(),
            ttl_seconds: default_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            single_use: false,
        }
    }
}

fn default_token_bytes() -> usize {
    32
}

fn default_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}
