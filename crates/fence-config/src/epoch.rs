//! Epoch scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Five minutes between scheduled epochs.
const fn default_interval_secs() -> u64 {
    300
}

const fn default_sink_timeout_ms() -> u64 {
    5_000
}

const fn default_run_on_start() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EpochConfig {
    /// Seconds between scheduled epochs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on each persistence write at the end of an epoch.
    #[serde(default = "default_sink_timeout_ms")]
    pub sink_timeout_ms: u64,

    /// Worker threads for per-vehicle resolution. `0` means one per core.
    #[serde(default)]
    pub workers: usize,

    /// Run one epoch immediately when the scheduler starts.
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            sink_timeout_ms: default_sink_timeout_ms(),
            workers: 0,
            run_on_start: default_run_on_start(),
        }
    }
}

impl EpochConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub const fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid("epoch.interval_secs", "must be at least 1"));
        }
        if self.sink_timeout_ms == 0 {
            return Err(ConfigError::invalid("epoch.sink_timeout_ms", "must be at least 1"));
        }
        Ok(())
    }
}
