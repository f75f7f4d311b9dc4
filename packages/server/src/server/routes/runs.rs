//! Run lifecycle endpoints.

use std::sync::OnceLock;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scout::{JobRecord, ProgressEvent, Run, RunConfig, RunId};

use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct StartRunRequest {
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub raw_urls: Option<String>,
    #[serde(default = "default_true")]
    pub use_mock_outbound: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
pub struct StartRunResponse {
    pub run_id: RunId,
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s\]\)<>]+").unwrap())
}

/// Harvest URLs from free-form text: regex scan, trailing-punctuation trim,
/// ordered de-duplication.
pub fn extract_urls(request: &StartRunRequest) -> Vec<String> {
    let mut blob = String::new();
    if let Some(urls) = &request.urls {
        for url in urls {
            blob.push_str(url);
            blob.push('\n');
        }
    }
    if let Some(raw) = &request.raw_urls {
        blob.push_str(raw);
    }

    let mut seen = std::collections::HashSet::new();
    let mut deduped = Vec::new();
    for found in url_pattern().find_iter(&blob) {
        let cleaned = found
            .as_str()
            .trim_end_matches(|c| matches!(c, '>' | ')' | ',' | '.' | ';' | '"' | '\''))
            .to_string();
        if seen.insert(cleaned.clone()) {
            deduped.push(cleaned);
        }
    }
    deduped
}

pub async fn start_run(
    Extension(state): Extension<AppState>,
    Json(payload): Json<StartRunRequest>,
) -> Result<Json<StartRunResponse>, (StatusCode, String)> {
    let urls = extract_urls(&payload);
    if urls.is_empty() {
        warn!("start request carried no usable urls");
        return Err((StatusCode::BAD_REQUEST, "no valid urls provided".to_string()));
    }
    info!(count = urls.len(), "starting run");

    let run_id = state
        .manager
        .start_run(RunConfig {
            urls,
            use_mock_outbound: payload.use_mock_outbound,
        })
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok(Json(StartRunResponse { run_id }))
}

#[derive(Deserialize)]
pub struct StopRunRequest {
    pub run_id: RunId,
}

#[derive(Serialize)]
pub struct StopRunResponse {
    pub status: &'static str,
    pub run_id: RunId,
}

pub async fn stop_run(
    Extension(state): Extension<AppState>,
    Json(payload): Json<StopRunRequest>,
) -> Result<Json<StopRunResponse>, (StatusCode, String)> {
    let run = state
        .storage
        .get_run(payload.run_id)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    if run.is_none() {
        return Err((StatusCode::NOT_FOUND, "run not found".to_string()));
    }

    // The run settles its own terminal status at the next boundary; a stop
    // for an already finished run is a no-op.
    let accepted = state.manager.request_stop(payload.run_id).await;
    Ok(Json(StopRunResponse {
        status: if accepted { "stopping" } else { "not_running" },
        run_id: payload.run_id,
    }))
}

#[derive(Serialize)]
pub struct RunDetailResponse {
    #[serde(flatten)]
    pub run: Run,
    pub jobs: Vec<JobRecord>,
    pub events: Vec<ProgressEvent>,
}

pub async fn get_run(
    Extension(state): Extension<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<Json<RunDetailResponse>, (StatusCode, String)> {
    let internal = |err: anyhow::Error| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string());

    let run = state.storage.get_run(run_id).await.map_err(internal)?;
    let Some(run) = run else {
        return Err((StatusCode::NOT_FOUND, "run not found".to_string()));
    };

    let jobs = state
        .storage
        .list_jobs(run_id, false)
        .await
        .map_err(internal)?;
    let events = state.storage.list_events(run_id).await.map_err(internal)?;

    Ok(Json(RunDetailResponse { run, jobs, events }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(raw: &str) -> StartRunRequest {
        StartRunRequest {
            urls: None,
            raw_urls: Some(raw.to_string()),
            use_mock_outbound: true,
        }
    }

    #[test]
    fn harvests_urls_from_free_text() {
        let urls = extract_urls(&request(
            "check https://acme.example/careers and (https://other.example/jobs).",
        ));
        assert_eq!(
            urls,
            vec![
                "https://acme.example/careers".to_string(),
                "https://other.example/jobs".to_string(),
            ]
        );
    }

    #[test]
    fn deduplicates_preserving_order() {
        let urls = extract_urls(&request(
            "https://b.example/x https://a.example/y https://b.example/x",
        ));
        assert_eq!(urls, vec!["https://b.example/x", "https://a.example/y"]);
    }

    #[test]
    fn merges_list_and_raw_input() {
        let req = StartRunRequest {
            urls: Some(vec!["https://a.example/jobs".to_string()]),
            raw_urls: Some("also https://b.example/jobs".to_string()),
            use_mock_outbound: true,
        };
        assert_eq!(extract_urls(&req).len(), 2);
    }

    #[test]
    fn non_url_text_yields_nothing() {
        assert!(extract_urls(&request("no links here, just words")).is_empty());
    }

    #[test]
    fn trims_trailing_punctuation_but_keeps_path() {
        let urls = extract_urls(&request("see <https://acme.example/careers/jobs>;"));
        assert_eq!(urls, vec!["https://acme.example/careers/jobs"]);
    }
}
