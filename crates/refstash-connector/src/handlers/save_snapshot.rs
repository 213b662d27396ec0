use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use refstash_core::models::ItemSummary;

use crate::capture::{self, SaveRequest};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveSnapshotRequest {
    pub url: String,
    pub html: Option<String>,
    #[serde(default)]
    pub pdf: bool,
    #[serde(rename = "sessionID")]
    pub session_id: Option<String>,
    pub target: Option<String>,
}

#[utoipa::path(
    post,
    path = "/connector/saveSnapshot",
    tag = "save",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 201, description = "Snapshot saved", body = Vec<ItemSummary>),
        (status = 400, description = "Invalid request or non-PDF resource", body = ErrorResponse),
        (status = 500, description = "Fetch failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(url = %request.url, pdf = request.pdf, operation = "save_snapshot"))]
pub async fn save_snapshot(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SaveSnapshotRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = capture::dispatch(
        &state,
        SaveRequest::Snapshot {
            url: request.url,
            html: request.html,
            pdf: request.pdf,
            session_id: request.session_id,
            target: request.target,
        },
    )
    .await
    .map_err(HttpAppError::from)?;

    Ok((StatusCode::CREATED, Json(outcome.items)))
}
