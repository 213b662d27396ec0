use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};
use serde::Deserialize;

use refstash_core::AppError;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GetTranslatorCodeRequest {
    #[serde(rename = "translatorID")]
    pub translator_id: String,
}

#[utoipa::path(
    post,
    path = "/connector/getTranslatorCode",
    tag = "translate",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 200, description = "Translator source text", body = String),
        (status = 404, description = "Unknown translator", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(translator_id = %request.translator_id, operation = "get_translator_code"))]
pub async fn get_translator_code(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<GetTranslatorCodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let translator = state.registry.get(&request.translator_id).ok_or_else(|| {
        HttpAppError(AppError::NotFound(format!(
            "translator {}",
            request.translator_id
        )))
    })?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        translator.code,
    ))
}
