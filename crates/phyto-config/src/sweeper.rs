//! Background cache expiry sweep configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

const fn default_interval_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweeperConfig {
    /// Whether `phyto sweeper` runs the recurring sweep at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between two expiry sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl SweeperConfig {
    /// Sweep period. Never zero, since `tokio::time::interval` panics on a
    /// zero period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
