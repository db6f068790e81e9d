//! Reconciler and scheduler configuration.

use std::time::Duration;

use serde::Deserialize;

/// Reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Feature versions tracked even before any release of them is stored.
    pub versions: Vec<u32>,
    /// Vendor recorded on every mapped release.
    pub vendor: String,
    /// Releases published more recently than this are re-fetched every
    /// incremental cycle, since their binaries may still be uploading.
    pub young_release_grace_secs: u64,
    /// Upper bound on concurrent per-release fetches.
    pub max_concurrent_fetches: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            versions: (8..=25).collect(),
            vendor: "eclipse".to_string(),
            young_release_grace_secs: 3600,
            max_concurrent_fetches: 8,
        }
    }
}

impl ReconcilerConfig {
    pub fn young_release_grace(&self) -> Duration {
        Duration::from_secs(self.young_release_grace_secs)
    }
}

/// Timer settings for the two update loops.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay before the first full rebuild.
    pub full_update_delay_secs: u64,
    /// Period of the full rebuild.
    pub full_update_interval_secs: u64,
    /// Delay before the first incremental refresh.
    pub incremental_delay_secs: u64,
    /// Period of the incremental refresh.
    pub incremental_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            full_update_delay_secs: 0,
            full_update_interval_secs: 24 * 60 * 60,
            incremental_delay_secs: 60,
            incremental_interval_secs: 3 * 60,
        }
    }
}

impl SchedulerConfig {
    pub fn full_update_delay(&self) -> Duration {
        Duration::from_secs(self.full_update_delay_secs)
    }

    pub fn full_update_interval(&self) -> Duration {
        Duration::from_secs(self.full_update_interval_secs)
    }

    pub fn incremental_delay(&self) -> Duration {
        Duration::from_secs(self.incremental_delay_secs)
    }

    pub fn incremental_interval(&self) -> Duration {
        Duration::from_secs(self.incremental_interval_secs)
    }
}
