use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use refstash_core::proxy::ProxyScheme;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub uri: String,
    pub html: String,
}

/// A candidate translator, with the proxy that had to be applied for its
/// target to match the captured URI (if any).
#[derive(Debug, Serialize, ToSchema)]
pub struct DetectedTranslatorResponse {
    #[serde(rename = "translatorID")]
    pub translator_id: String,
    pub label: String,
    pub priority: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyScheme>,
}

#[utoipa::path(
    post,
    path = "/connector/detect",
    tag = "translate",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 200, description = "Candidate translators with resolved proxy info", body = Vec<DetectedTranslatorResponse>),
        (status = 400, description = "Invalid request body", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(uri = %request.uri, operation = "detect"))]
pub async fn detect(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DetectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let detected = state.engine.detect(&request.uri, &request.html).await;
    let response: Vec<DetectedTranslatorResponse> = detected
        .into_iter()
        .map(|d| DetectedTranslatorResponse {
            translator_id: d.translator.id,
            label: d.translator.label,
            priority: d.translator.priority,
            proxy: d.proxy,
        })
        .collect();
    Ok(Json(response))
}
