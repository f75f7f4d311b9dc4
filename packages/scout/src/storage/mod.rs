use anyhow::Result;
use async_trait::async_trait;

use crate::events::ProgressEvent;
use crate::types::*;

pub mod postgres;
pub use postgres::PostgresScoutStorage;

/// Persistence boundary for runs, jobs, events and source memory.
#[async_trait]
pub trait ScoutStorage: Send + Sync {
    // Runs
    async fn create_run(&self, run: &Run) -> Result<()>;
    async fn update_run_status(&self, run_id: RunId, status: RunStatus) -> Result<()>;
    async fn get_run(&self, run_id: RunId) -> Result<Option<Run>>;

    // Jobs
    async fn upsert_job(&self, run_id: RunId, job: &JobRecord) -> Result<()>;
    async fn list_jobs(&self, run_id: RunId, passed_only: bool) -> Result<Vec<JobRecord>>;

    // Progress events
    async fn append_event(&self, event: &ProgressEvent) -> Result<()>;
    async fn list_events(&self, run_id: RunId) -> Result<Vec<ProgressEvent>>;

    // Outbound attempts
    async fn add_outbound_attempt(&self, attempt: &OutboundAttempt) -> Result<()>;

    // Source memory
    async fn record_source_result(
        &self,
        url: &str,
        status: SourceStatus,
        jobs_found: i64,
        last_error: Option<&str>,
    ) -> Result<()>;
    async fn list_productive_sources(&self, limit: i64) -> Result<Vec<SourceMemory>>;
}
