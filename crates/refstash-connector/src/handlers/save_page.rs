use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use refstash_core::models::ItemSummary;

use crate::capture::{self, SaveRequest};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SavePageRequest {
    pub uri: String,
    pub html: String,
    #[serde(rename = "sessionID")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavePageResponse {
    pub items: Vec<ItemSummary>,
}

#[utoipa::path(
    post,
    path = "/connector/savePage",
    tag = "save",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 201, description = "Page translated and saved", body = SavePageResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "No translator matches this page", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(uri = %request.uri, operation = "save_page"))]
pub async fn save_page(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SavePageRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = capture::dispatch(
        &state,
        SaveRequest::PageTranslate {
            uri: request.uri,
            html: request.html,
            session_id: request.session_id,
        },
    )
    .await
    .map_err(HttpAppError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(SavePageResponse {
            items: outcome.items,
        }),
    ))
}
