use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};

use scout::{JobRecord, RunId};

use crate::server::app::AppState;

/// Jobs that passed the filter for a run. An unknown run yields an empty
/// list, not 404, to simplify clients.
pub async fn list_passed_jobs(
    Extension(state): Extension<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<Json<Vec<JobRecord>>, (StatusCode, String)> {
    let jobs = state
        .storage
        .list_jobs(run_id, true)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(Json(jobs))
}
