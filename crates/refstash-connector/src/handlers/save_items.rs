use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use refstash_core::models::{ItemDraft, ItemSummary};
use refstash_core::proxy::ProxyScheme;

use crate::capture::{self, SaveRequest};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveItemsRequest {
    pub items: Vec<ItemDraft>,
    pub uri: String,
    #[serde(rename = "sessionID")]
    pub session_id: Option<String>,
    pub proxy: Option<ProxyScheme>,
    pub target: Option<String>,
}

#[utoipa::path(
    post,
    path = "/connector/saveItems",
    tag = "save",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 201, description = "Items saved", body = Vec<ItemSummary>),
        (status = 400, description = "Invalid item draft", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(uri = %request.uri, operation = "save_items"))]
pub async fn save_items(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SaveItemsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = capture::dispatch(
        &state,
        SaveRequest::StructuredItems {
            items: request.items,
            uri: request.uri,
            session_id: request.session_id,
            proxy: request.proxy,
            target: request.target,
        },
    )
    .await
    .map_err(HttpAppError::from)?;

    Ok((StatusCode::CREATED, Json(outcome.items)))
}
