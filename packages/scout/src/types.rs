use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a run. Terminal statuses are set exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Stopped,
    Cancelled,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending | RunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Stopped => "stopped",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => RunStatus::Pending,
            "running" => RunStatus::Running,
            "stopped" => RunStatus::Stopped,
            "cancelled" => RunStatus::Cancelled,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            other => anyhow::bail!("unknown run status: {other}"),
        })
    }
}

/// A supervised execution of the pipeline over a batch of source URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config: RunConfig,
}

impl Run {
    pub fn new(run_id: RunId, config: RunConfig) -> Self {
        Self {
            run_id,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            config,
        }
    }
}

/// Caller-supplied configuration for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub urls: Vec<String>,
    #[serde(default = "default_true")]
    pub use_mock_outbound: bool,
}

fn default_true() -> bool {
    true
}

/// Classifier output for a single text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

/// One scraped posting tied to a run, unique by (run, url).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRecord {
    pub url: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub classification: Classification,
    pub passed: bool,
    pub score: f32,
    pub reason: String,
}

/// Terminal status of a source URL's processing within a run.
///
/// `Stopped` only appears in in-memory pipeline results for sources cut short
/// by a cooperative stop; it is never written to source memory as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Active,
    Empty,
    Failed,
    Stopped,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Active => "active",
            SourceStatus::Empty => "empty",
            SourceStatus::Failed => "failed",
            SourceStatus::Stopped => "stopped",
        }
    }
}

/// Per-listing-URL aggregate for a run, written once when the source's
/// processing ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub url: String,
    pub links: usize,
    pub passed: usize,
    pub status: SourceStatus,
}

/// Everything a finished (or stopped) pipeline hands back to the run manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineResult {
    pub jobs: Vec<JobRecord>,
    pub sources: Vec<SourceOutcome>,
}

/// Record of one dispatch to the external intake for an accepted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundAttempt {
    pub run_id: RunId,
    pub job_url: String,
    pub status: String,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Long-lived, cross-run record of a listing URL's historical yield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMemory {
    pub url: String,
    pub status: String,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub total_jobs_found: i64,
    pub last_run_yield: i64,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Stopped.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn run_status_round_trips_through_str() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Stopped,
            RunStatus::Cancelled,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<RunStatus>().unwrap(), status);
        }
    }
}
