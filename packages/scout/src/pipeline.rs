//! Sequential discovery and triage over a batch of source URLs.
//!
//! One source at a time, one job page at a time. Stops cooperatively at
//! source and job boundaries; a stopped run returns whatever it accumulated.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::config::ScoutConfig;
use crate::discovery::discover_job_links;
use crate::events::{EventKind, EventSink, ProgressEvent};
use crate::extractor;
use crate::fetcher::PageFetcher;
use crate::filter::{self, FilterContext, FilterInput, FilterResult};
use crate::outbound::JobDispatcher;
use crate::types::*;

pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<dyn Classifier>,
    dispatcher: Arc<dyn JobDispatcher>,
    sink: Arc<dyn EventSink>,
    filter_context: FilterContext,
    config: ScoutConfig,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: Arc<dyn Classifier>,
        dispatcher: Arc<dyn JobDispatcher>,
        sink: Arc<dyn EventSink>,
        config: ScoutConfig,
    ) -> Self {
        let filter_context = FilterContext {
            min_score: config.min_score,
        };
        Self {
            fetcher,
            classifier,
            dispatcher,
            sink,
            filter_context,
            config,
        }
    }

    async fn emit(&self, run_id: RunId, kind: EventKind, message: String) {
        self.sink.emit(ProgressEvent::new(run_id, kind, message)).await;
    }

    async fn emit_with_payload(
        &self,
        run_id: RunId,
        kind: EventKind,
        message: String,
        payload: serde_json::Value,
    ) {
        self.sink
            .emit(ProgressEvent::new(run_id, kind, message).with_payload(payload))
            .await;
    }

    /// Extract, classify, filter and (for accepted jobs) dispatch one page.
    async fn process_job(&self, run_id: RunId, job_url: &str, html: &str) -> Result<JobRecord> {
        let extracted = extractor::extract(html);
        let text = extracted.text();
        let classification = self.classifier.classify(&text);

        let decision: FilterResult = filter::evaluate(
            &classification,
            FilterInput {
                title: extracted.title.as_deref(),
                description: extracted.description.as_deref(),
                summary: extracted.summary.as_deref(),
                location: extracted.location.as_deref(),
            },
            &self.filter_context,
        );

        let record = JobRecord {
            url: job_url.to_string(),
            title: extracted.title,
            company: extracted.company,
            location: extracted.location,
            region: decision.region.clone(),
            city: decision.city.clone(),
            description: extracted.description,
            summary: extracted.summary,
            classification,
            passed: decision.passed,
            score: decision.score,
            reason: decision.reason.clone(),
        };

        if decision.passed {
            self.dispatcher.dispatch(&record).await?;
            let region = decision.region.as_deref().unwrap_or("unknown");
            self.emit_with_payload(
                run_id,
                EventKind::Progress,
                format!("job passed (region {region}): {job_url}"),
                serde_json::json!({ "job": record, "event": "job_passed" }),
            )
            .await;
        } else {
            self.emit_with_payload(
                run_id,
                EventKind::Progress,
                format!("job rejected ({}): {job_url}", decision.reason),
                serde_json::json!({ "job": record, "event": "job_skipped" }),
            )
            .await;
        }

        Ok(record)
    }

    /// Process every source sequentially, honoring `stop` at source and job
    /// boundaries. Emits exactly one terminal event: `stop` when interrupted,
    /// `done` otherwise.
    pub async fn run(
        &self,
        run_id: RunId,
        urls: &[String],
        stop: &CancellationToken,
    ) -> PipelineResult {
        let mut result = PipelineResult::default();

        self.emit(
            run_id,
            EventKind::Progress,
            format!("starting scan of {} sources", urls.len()),
        )
        .await;

        for source_url in urls {
            if stop.is_cancelled() {
                self.emit(run_id, EventKind::Stop, "scan stopped by request".to_string())
                    .await;
                return result;
            }

            self.emit(
                run_id,
                EventKind::Progress,
                format!("fetching listing page: {source_url}"),
            )
            .await;

            let Some(listing_html) = self.fetcher.fetch(source_url).await else {
                warn!(url = %source_url, "listing page fetch failed");
                self.emit(
                    run_id,
                    EventKind::Error,
                    format!("failed to load listing page: {source_url}"),
                )
                .await;
                result.sources.push(SourceOutcome {
                    url: source_url.clone(),
                    links: 0,
                    passed: 0,
                    status: SourceStatus::Failed,
                });
                continue;
            };

            let job_links = discover_job_links(&listing_html, source_url);
            self.emit(
                run_id,
                EventKind::Progress,
                format!("found {} job links", job_links.len()),
            )
            .await;

            let mut passed_count = 0usize;
            for job_url in &job_links {
                if stop.is_cancelled() {
                    self.emit(run_id, EventKind::Stop, "scan stopped by request".to_string())
                        .await;
                    result.sources.push(SourceOutcome {
                        url: source_url.clone(),
                        links: job_links.len(),
                        passed: passed_count,
                        status: SourceStatus::Stopped,
                    });
                    return result;
                }

                let Some(job_html) = self.fetcher.fetch(job_url).await else {
                    self.emit(
                        run_id,
                        EventKind::Error,
                        format!("error processing {job_url}: page load failed"),
                    )
                    .await;
                    continue;
                };

                match self.process_job(run_id, job_url, &job_html).await {
                    Ok(record) => {
                        if record.passed {
                            passed_count += 1;
                        }
                        result.jobs.push(record);
                    }
                    Err(err) => {
                        self.emit(
                            run_id,
                            EventKind::Error,
                            format!("error processing {job_url}: {err}"),
                        )
                        .await;
                    }
                }

                tokio::time::sleep(self.config.pace_delay()).await;
            }

            let status = if passed_count > 0 {
                SourceStatus::Active
            } else {
                SourceStatus::Empty
            };
            result.sources.push(SourceOutcome {
                url: source_url.clone(),
                links: job_links.len(),
                passed: passed_count,
                status,
            });
            info!(
                url = %source_url,
                links = job_links.len(),
                passed = passed_count,
                "source processed"
            );
        }

        self.emit(run_id, EventKind::Done, "scan completed".to_string())
            .await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    use crate::classifier::LexicalClassifier;
    use crate::outbound::{DispatchError, MockDispatcher};

    struct MapFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Option<String> {
            self.pages.get(url).cloned()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    #[async_trait::async_trait]
    impl EventSink for RecordingSink {
        async fn emit(&self, event: ProgressEvent) {
            self.events.lock().await.push(event);
        }
    }

    struct FailingDispatcher;

    #[async_trait::async_trait]
    impl JobDispatcher for FailingDispatcher {
        async fn dispatch(&self, _job: &JobRecord) -> Result<String, DispatchError> {
            Err(DispatchError::Rejected { status: 503 })
        }
    }

    fn listing_page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|link| format!(r#"<a href="{link}">job</a>"#))
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    fn dev_job_page(location: &str) -> String {
        format!(
            r#"<html><head><title>Backend Developer</title></head><body>
            <h1>Backend Developer</h1>
            <span class="location">{location}</span>
            <main><p>software engineer backend python api database cloud docker</p></main>
            </body></html>"#
        )
    }

    fn test_config() -> ScoutConfig {
        ScoutConfig {
            pace_delay_ms: 0,
            ..ScoutConfig::default()
        }
    }

    fn pipeline_with(
        pages: HashMap<String, String>,
        dispatcher: Arc<dyn JobDispatcher>,
        sink: Arc<RecordingSink>,
    ) -> Pipeline {
        Pipeline::new(
            Arc::new(MapFetcher { pages }),
            Arc::new(LexicalClassifier::new()),
            dispatcher,
            sink,
            test_config(),
        )
    }

    #[tokio::test]
    async fn passing_job_flows_end_to_end() {
        let source = "https://acme.example/careers".to_string();
        let job = "https://acme.example/jobs/1".to_string();
        let mut pages = HashMap::new();
        pages.insert(source.clone(), listing_page(&["/jobs/1"]));
        pages.insert(job.clone(), dev_job_page("Tel Aviv"));

        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline_with(pages, Arc::new(MockDispatcher), sink.clone());

        let result = pipeline
            .run(RunId::new(), &[source.clone()], &CancellationToken::new())
            .await;

        assert_eq!(result.jobs.len(), 1);
        assert!(result.jobs[0].passed);
        assert_eq!(result.jobs[0].region.as_deref(), Some("center"));
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].links, 1);
        assert_eq!(result.sources[0].passed, 1);
        assert_eq!(result.sources[0].status, SourceStatus::Active);

        let events = sink.events.lock().await;
        assert!(events.iter().any(|e| e.kind == EventKind::Done));
        assert!(!events.iter().any(|e| e.kind == EventKind::Stop));
    }

    #[tokio::test]
    async fn rejected_job_is_recorded_but_not_dispatched() {
        let source = "https://acme.example/careers".to_string();
        let job = "https://acme.example/jobs/2".to_string();
        let mut pages = HashMap::new();
        pages.insert(source.clone(), listing_page(&["/jobs/2"]));
        pages.insert(job, dev_job_page("Berlin"));

        let sink = Arc::new(RecordingSink::default());
        // A dispatch would fail loudly; a rejected job must never reach it.
        let pipeline = pipeline_with(pages, Arc::new(FailingDispatcher), sink.clone());

        let result = pipeline
            .run(RunId::new(), &[source], &CancellationToken::new())
            .await;

        assert_eq!(result.jobs.len(), 1);
        assert!(!result.jobs[0].passed);
        assert_eq!(result.sources[0].status, SourceStatus::Empty);
        let events = sink.events.lock().await;
        assert!(!events.iter().any(|e| e.kind == EventKind::Error));
    }

    #[tokio::test]
    async fn failed_source_is_isolated() {
        let good = "https://good.example/careers".to_string();
        let bad = "https://bad.example/careers".to_string();
        let job = "https://good.example/jobs/1".to_string();
        let mut pages = HashMap::new();
        pages.insert(good.clone(), listing_page(&["/jobs/1"]));
        pages.insert(job, dev_job_page("Tel Aviv"));

        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline_with(pages, Arc::new(MockDispatcher), sink.clone());

        let result = pipeline
            .run(
                RunId::new(),
                &[bad.clone(), good.clone()],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].url, bad);
        assert_eq!(result.sources[0].status, SourceStatus::Failed);
        assert_eq!(result.sources[1].status, SourceStatus::Active);
        assert_eq!(result.jobs.len(), 1);
    }

    #[tokio::test]
    async fn stop_before_first_source_yields_empty_result() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline_with(HashMap::new(), Arc::new(MockDispatcher), sink.clone());

        let token = CancellationToken::new();
        token.cancel();
        let result = pipeline
            .run(
                RunId::new(),
                &["https://acme.example/careers".to_string()],
                &token,
            )
            .await;

        assert!(result.jobs.is_empty());
        assert!(result.sources.is_empty());

        let events = sink.events.lock().await;
        let stops = events.iter().filter(|e| e.kind == EventKind::Stop).count();
        assert_eq!(stops, 1);
        assert!(!events.iter().any(|e| e.kind == EventKind::Done));
    }

    struct StopAfterDispatch {
        token: CancellationToken,
    }

    #[async_trait::async_trait]
    impl JobDispatcher for StopAfterDispatch {
        async fn dispatch(&self, _job: &JobRecord) -> Result<String, DispatchError> {
            self.token.cancel();
            Ok("mock".to_string())
        }
    }

    #[tokio::test]
    async fn stop_mid_source_returns_partial_results_with_stopped_entry() {
        let source = "https://acme.example/careers".to_string();
        let mut pages = HashMap::new();
        pages.insert(source.clone(), listing_page(&["/jobs/1", "/jobs/2"]));
        pages.insert(
            "https://acme.example/jobs/1".to_string(),
            dev_job_page("Tel Aviv"),
        );
        pages.insert(
            "https://acme.example/jobs/2".to_string(),
            dev_job_page("Tel Aviv"),
        );

        let token = CancellationToken::new();
        let sink = Arc::new(RecordingSink::default());
        // The stop lands right after the first job is accepted, so the
        // second link hits the job-boundary check.
        let pipeline = pipeline_with(
            pages,
            Arc::new(StopAfterDispatch {
                token: token.clone(),
            }),
            sink.clone(),
        );

        let result = pipeline.run(RunId::new(), &[source.clone()], &token).await;

        assert_eq!(result.jobs.len(), 1);
        assert!(result.jobs[0].passed);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].url, source);
        assert_eq!(result.sources[0].links, 2);
        assert_eq!(result.sources[0].passed, 1);
        assert_eq!(result.sources[0].status, SourceStatus::Stopped);

        let events = sink.events.lock().await;
        let stops = events.iter().filter(|e| e.kind == EventKind::Stop).count();
        assert_eq!(stops, 1);
        assert!(!events.iter().any(|e| e.kind == EventKind::Done));
    }

    #[tokio::test]
    async fn dispatch_failure_drops_the_record_and_emits_error() {
        let source = "https://acme.example/careers".to_string();
        let job = "https://acme.example/jobs/1".to_string();
        let mut pages = HashMap::new();
        pages.insert(source.clone(), listing_page(&["/jobs/1"]));
        pages.insert(job, dev_job_page("Tel Aviv"));

        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline_with(pages, Arc::new(FailingDispatcher), sink.clone());

        let result = pipeline
            .run(RunId::new(), &[source], &CancellationToken::new())
            .await;

        assert!(result.jobs.is_empty());
        assert_eq!(result.sources[0].status, SourceStatus::Empty);
        let events = sink.events.lock().await;
        assert!(events.iter().any(|e| e.kind == EventKind::Error));
    }

    #[tokio::test]
    async fn unreachable_job_page_does_not_sink_the_source() {
        let source = "https://acme.example/careers".to_string();
        let ok_job = "https://acme.example/jobs/ok".to_string();
        let mut pages = HashMap::new();
        pages.insert(source.clone(), listing_page(&["/jobs/missing", "/jobs/ok"]));
        pages.insert(ok_job, dev_job_page("Tel Aviv"));

        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline_with(pages, Arc::new(MockDispatcher), sink.clone());

        let result = pipeline
            .run(RunId::new(), &[source], &CancellationToken::new())
            .await;

        assert_eq!(result.jobs.len(), 1);
        assert_eq!(result.sources[0].links, 2);
        assert_eq!(result.sources[0].passed, 1);
        let events = sink.events.lock().await;
        assert!(events.iter().any(|e| e.kind == EventKind::Error));
        assert!(events.iter().any(|e| e.kind == EventKind::Done));
    }
}
