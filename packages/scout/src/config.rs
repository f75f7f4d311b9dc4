use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a run of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Minimum classifier confidence for a job to pass.
    pub min_score: f32,
    /// Pause between consecutive job pages, in milliseconds.
    pub pace_delay_ms: u64,
    /// Navigation timeout for page fetches, in milliseconds.
    pub nav_timeout_ms: u64,
    /// Extra wait after a page loads, in milliseconds.
    pub settle_delay_ms: u64,
    /// Where passed jobs are delivered when mock outbound is off.
    pub outbound_endpoint: Option<String>,
    /// Timeout per outbound request, in seconds.
    pub outbound_timeout_secs: u64,
    /// Retries after the first failed outbound attempt.
    pub outbound_max_retries: u32,
    /// Interval between heartbeat events while a run is live, in seconds.
    pub heartbeat_secs: u64,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            pace_delay_ms: 500,
            nav_timeout_ms: 30_000,
            settle_delay_ms: 2_000,
            outbound_endpoint: None,
            outbound_timeout_secs: 15,
            outbound_max_retries: 3,
            heartbeat_secs: 15,
        }
    }
}

impl ScoutConfig {
    pub fn pace_delay(&self) -> Duration {
        Duration::from_millis(self.pace_delay_ms)
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}
