use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub urls: Vec<String>,
}

/// Recently productive source URLs, most recent first, for auto-fill.
pub async fn suggest_sources(
    Extension(state): Extension<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, (StatusCode, String)> {
    let sources = state
        .storage
        .list_productive_sources(query.limit)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let urls = sources.into_iter().map(|source| source.url).collect();
    Ok(Json(SuggestResponse { urls }))
}
