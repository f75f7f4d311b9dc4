//! Run lifecycle supervision: registry of live runs, stop requests,
//! terminal persistence and status transitions.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::classifier::Classifier;
use crate::config::ScoutConfig;
use crate::events::{EventKind, EventSink, ProgressEvent};
use crate::fetcher::PageFetcher;
use crate::outbound::{HttpDispatcher, JobDispatcher, MockDispatcher};
use crate::pipeline::Pipeline;
use crate::publisher::EventPublisher;
use crate::storage::ScoutStorage;
use crate::types::*;

/// Sink that appends each event to storage and broadcasts it to live
/// observers. A storage failure is logged and does not interrupt the run.
pub struct StorageSink {
    storage: Arc<dyn ScoutStorage>,
    publisher: EventPublisher,
}

impl StorageSink {
    pub fn new(storage: Arc<dyn ScoutStorage>, publisher: EventPublisher) -> Self {
        Self { storage, publisher }
    }
}

#[async_trait]
impl EventSink for StorageSink {
    async fn emit(&self, event: ProgressEvent) {
        if let Err(err) = self.storage.append_event(&event).await {
            warn!(run_id = %event.run_id, error = %err, "failed to persist progress event");
        }
        self.publisher.publish(event).await;
    }
}

struct RunHandle {
    stop: CancellationToken,
}

/// Owns the set of live runs. One pipeline task per run; stop requests
/// cancel the run's token and take effect at the next boundary.
pub struct RunManager {
    storage: Arc<dyn ScoutStorage>,
    publisher: EventPublisher,
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<dyn Classifier>,
    config: ScoutConfig,
    shutdown: CancellationToken,
    active: Arc<RwLock<HashMap<RunId, RunHandle>>>,
}

impl RunManager {
    pub fn new(
        storage: Arc<dyn ScoutStorage>,
        publisher: EventPublisher,
        fetcher: Arc<dyn PageFetcher>,
        classifier: Arc<dyn Classifier>,
        config: ScoutConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            storage,
            publisher,
            fetcher,
            classifier,
            config,
            shutdown,
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn dispatcher(&self, use_mock: bool) -> Result<Arc<dyn JobDispatcher>> {
        if use_mock {
            return Ok(Arc::new(MockDispatcher));
        }
        let endpoint = self
            .config
            .outbound_endpoint
            .clone()
            .context("outbound endpoint not configured")?;
        Ok(Arc::new(HttpDispatcher::new(
            endpoint,
            "scout".to_string(),
            self.config.outbound_timeout(),
            self.config.outbound_max_retries,
        )?))
    }

    /// Create and launch a run. Returns once the run is registered and its
    /// pipeline task is spawned.
    pub async fn start_run(self: &Arc<Self>, config: RunConfig) -> Result<RunId> {
        // Fail before the run row exists; a run that never launched must not
        // sit in `running` with no task behind it.
        let dispatcher = self.dispatcher(config.use_mock_outbound)?;

        let run_id = RunId::new();
        let run = Run::new(run_id, config.clone());
        self.storage.create_run(&run).await?;
        let stop = self.shutdown.child_token();
        self.active
            .write()
            .await
            .insert(run_id, RunHandle { stop: stop.clone() });

        let sink: Arc<dyn EventSink> =
            Arc::new(StorageSink::new(self.storage.clone(), self.publisher.clone()));
        sink.emit(ProgressEvent::new(
            run_id,
            EventKind::Start,
            format!("starting run {run_id}"),
        ))
        .await;

        let manager = self.clone();
        tokio::spawn(async move {
            manager.drive_run(run_id, config, dispatcher, sink, stop).await;
        });

        Ok(run_id)
    }

    async fn drive_run(
        self: Arc<Self>,
        run_id: RunId,
        config: RunConfig,
        dispatcher: Arc<dyn JobDispatcher>,
        sink: Arc<dyn EventSink>,
        stop: CancellationToken,
    ) {
        let heartbeat_token = CancellationToken::new();
        let heartbeat = {
            let publisher = self.publisher.clone();
            let token = heartbeat_token.clone();
            tokio::spawn(async move { publisher.heartbeat_loop(run_id, token).await })
        };

        let pipeline = Pipeline::new(
            self.fetcher.clone(),
            self.classifier.clone(),
            dispatcher,
            sink.clone(),
            self.config.clone(),
        );
        let result = pipeline.run(run_id, &config.urls, &stop).await;

        let status = if self.shutdown.is_cancelled() {
            RunStatus::Cancelled
        } else if stop.is_cancelled() {
            RunStatus::Stopped
        } else {
            RunStatus::Completed
        };

        let terminal = match self.persist_result(run_id, &config, &result).await {
            Ok(()) => status,
            Err(err) => {
                error!(run_id = %run_id, error = %err, "failed to persist run results");
                sink.emit(ProgressEvent::new(
                    run_id,
                    EventKind::Error,
                    format!("run failed: {err}"),
                ))
                .await;
                RunStatus::Failed
            }
        };

        if let Err(err) = self.storage.update_run_status(run_id, terminal).await {
            error!(run_id = %run_id, error = %err, "failed to record terminal run status");
        }

        heartbeat_token.cancel();
        heartbeat.abort();
        self.active.write().await.remove(&run_id);
        info!(
            run_id = %run_id,
            status = terminal.as_str(),
            jobs = result.jobs.len(),
            sources = result.sources.len(),
            "run finished"
        );
    }

    async fn persist_result(
        &self,
        run_id: RunId,
        config: &RunConfig,
        result: &PipelineResult,
    ) -> Result<()> {
        for job in &result.jobs {
            self.storage.upsert_job(run_id, job).await?;

            if job.passed {
                let attempt = OutboundAttempt {
                    run_id,
                    job_url: job.url.clone(),
                    status: "sent".to_string(),
                    response_status: None,
                    response_body: Some(if config.use_mock_outbound {
                        "mock".to_string()
                    } else {
                        "sent".to_string()
                    }),
                    created_at: Utc::now(),
                };
                self.storage.add_outbound_attempt(&attempt).await?;
                // Persistence runs after the run's terminal event; the
                // attempt row is the record, no late progress events.
                info!(run_id = %run_id, url = %job.url, "outbound attempt recorded");
            }
        }

        for source in &result.sources {
            // An interrupted source keeps its historical standing.
            let status = match source.status {
                SourceStatus::Stopped => SourceStatus::Active,
                other => other,
            };
            self.storage
                .record_source_result(&source.url, status, source.passed as i64, None)
                .await?;
        }

        Ok(())
    }

    /// Ask a live run to stop at its next boundary. Returns false when the
    /// run is not active.
    pub async fn request_stop(&self, run_id: RunId) -> bool {
        let active = self.active.read().await;
        match active.get(&run_id) {
            Some(handle) => {
                handle.stop.cancel();
                info!(run_id = %run_id, "stop requested");
                true
            }
            None => false,
        }
    }

    pub async fn is_active(&self, run_id: RunId) -> bool {
        self.active.read().await.contains_key(&run_id)
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }
}
