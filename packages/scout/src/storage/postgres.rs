use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::events::{EventKind, ProgressEvent};
use crate::storage::ScoutStorage;
use crate::types::*;

pub struct PostgresScoutStorage {
    pool: PgPool,
}

impl PostgresScoutStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn run_from_row(r: sqlx::postgres::PgRow) -> Result<Run> {
    let status: String = r.get("status");
    let config: serde_json::Value = r.get("config");
    Ok(Run {
        run_id: RunId(r.get("run_id")),
        status: status.parse()?,
        started_at: r.get("started_at"),
        finished_at: r.get("finished_at"),
        config: serde_json::from_value(config).context("Invalid run config in storage")?,
    })
}

fn job_from_row(r: sqlx::postgres::PgRow) -> JobRecord {
    JobRecord {
        url: r.get("url"),
        title: r.get("title"),
        company: r.get("company"),
        location: r.get("location"),
        region: r.get("region"),
        city: r.get("city"),
        description: r.get("description"),
        summary: r.get("summary"),
        classification: Classification {
            label: r.get("label"),
            score: r.get("label_score"),
        },
        passed: r.get("passed"),
        score: r.get("score"),
        reason: r.get("reason"),
    }
}

#[async_trait]
impl ScoutStorage for PostgresScoutStorage {
    async fn create_run(&self, run: &Run) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO runs (run_id, status, started_at, finished_at, config)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(run.run_id.0)
        .bind(run.status.as_str())
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(serde_json::to_value(&run.config)?)
        .execute(&self.pool)
        .await
        .context("Failed to create run")?;
        Ok(())
    }

    async fn update_run_status(&self, run_id: RunId, status: RunStatus) -> Result<()> {
        let finished = status.is_terminal();
        sqlx::query(
            r#"
            UPDATE runs
            SET status = $2,
                finished_at = CASE WHEN $3 THEN now() ELSE finished_at END
            WHERE run_id = $1
            "#,
        )
        .bind(run_id.0)
        .bind(status.as_str())
        .bind(finished)
        .execute(&self.pool)
        .await
        .context("Failed to update run status")?;
        Ok(())
    }

    async fn get_run(&self, run_id: RunId) -> Result<Option<Run>> {
        let row = sqlx::query(
            r#"
            SELECT run_id, status, started_at, finished_at, config
            FROM runs
            WHERE run_id = $1
            "#,
        )
        .bind(run_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get run")?;

        row.map(run_from_row).transpose()
    }

    async fn upsert_job(&self, run_id: RunId, job: &JobRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                run_id, url, title, company, location, region, city,
                description, summary, label, label_score, passed, score, reason
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (run_id, url) DO UPDATE SET
                title = EXCLUDED.title,
                company = EXCLUDED.company,
                location = EXCLUDED.location,
                region = EXCLUDED.region,
                city = EXCLUDED.city,
                description = EXCLUDED.description,
                summary = EXCLUDED.summary,
                label = EXCLUDED.label,
                label_score = EXCLUDED.label_score,
                passed = EXCLUDED.passed,
                score = EXCLUDED.score,
                reason = EXCLUDED.reason
            "#,
        )
        .bind(run_id.0)
        .bind(&job.url)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.region)
        .bind(&job.city)
        .bind(&job.description)
        .bind(&job.summary)
        .bind(&job.classification.label)
        .bind(job.classification.score)
        .bind(job.passed)
        .bind(job.score)
        .bind(&job.reason)
        .execute(&self.pool)
        .await
        .context("Failed to upsert job")?;
        Ok(())
    }

    async fn list_jobs(&self, run_id: RunId, passed_only: bool) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT url, title, company, location, region, city,
                   description, summary, label, label_score, passed, score, reason
            FROM jobs
            WHERE run_id = $1 AND ($2 = false OR passed = true)
            ORDER BY id
            "#,
        )
        .bind(run_id.0)
        .bind(passed_only)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list jobs")?;

        Ok(rows.into_iter().map(job_from_row).collect())
    }

    async fn append_event(&self, event: &ProgressEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO progress_events (run_id, kind, message, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.run_id.0)
        .bind(event.kind.as_str())
        .bind(&event.message)
        .bind(&event.payload)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to append progress event")?;
        Ok(())
    }

    async fn list_events(&self, run_id: RunId) -> Result<Vec<ProgressEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT run_id, kind, message, payload, created_at
            FROM progress_events
            WHERE run_id = $1
            ORDER BY id
            "#,
        )
        .bind(run_id.0)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list progress events")?;

        rows.into_iter()
            .map(|r| {
                let kind: String = r.get("kind");
                Ok(ProgressEvent {
                    run_id: RunId(r.get("run_id")),
                    kind: kind.parse::<EventKind>()?,
                    message: r.get("message"),
                    payload: r.get("payload"),
                    created_at: r.get("created_at"),
                })
            })
            .collect()
    }

    async fn add_outbound_attempt(&self, attempt: &OutboundAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO outbound_attempts (run_id, job_url, status, response_status, response_body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attempt.run_id.0)
        .bind(&attempt.job_url)
        .bind(&attempt.status)
        .bind(attempt.response_status)
        .bind(&attempt.response_body)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to record outbound attempt")?;
        Ok(())
    }

    async fn record_source_result(
        &self,
        url: &str,
        status: SourceStatus,
        jobs_found: i64,
        last_error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO job_sources (url, status, last_scraped_at, total_jobs_found, last_run_yield, last_error)
            VALUES ($1, $2, now(), $3, $3, $4)
            ON CONFLICT (url) DO UPDATE SET
                status = EXCLUDED.status,
                last_scraped_at = now(),
                total_jobs_found = job_sources.total_jobs_found + EXCLUDED.last_run_yield,
                last_run_yield = EXCLUDED.last_run_yield,
                last_error = EXCLUDED.last_error
            "#,
        )
        .bind(url)
        .bind(status.as_str())
        .bind(jobs_found)
        .bind(last_error)
        .execute(&self.pool)
        .await
        .context("Failed to record source result")?;
        Ok(())
    }

    async fn list_productive_sources(&self, limit: i64) -> Result<Vec<SourceMemory>> {
        let rows = sqlx::query(
            r#"
            SELECT url, status, last_scraped_at, total_jobs_found, last_run_yield, last_error
            FROM job_sources
            WHERE status = 'active' AND last_run_yield > 0
            ORDER BY last_scraped_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list productive sources")?;

        Ok(rows
            .into_iter()
            .map(|r| SourceMemory {
                url: r.get("url"),
                status: r.get("status"),
                last_scraped_at: r.get("last_scraped_at"),
                total_jobs_found: r.get("total_jobs_found"),
                last_run_yield: r.get("last_run_yield"),
                last_error: r.get("last_error"),
            })
            .collect())
    }
}
