use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use refstash_core::models::ItemSummary;
use refstash_core::AppError;

use crate::capture::{self, SaveRequest};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// Session to register the imported items under.
    pub session: Option<String>,
}

#[utoipa::path(
    post,
    path = "/connector/import",
    tag = "import",
    params(
        ("session" = Option<String>, Query, description = "Save session to register imported items under")
    ),
    request_body(content = String, content_type = "application/x-bibtex"),
    responses(
        (status = 201, description = "Entries imported", body = Vec<ItemSummary>),
        (status = 400, description = "Unparsable or unsupported import data", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(operation = "import"))]
pub async fn import(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImportQuery>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, HttpAppError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            HttpAppError(AppError::Validation(
                "missing Content-Type header".to_string(),
            ))
        })?;

    let outcome = capture::dispatch(
        &state,
        SaveRequest::BibliographicText {
            content_type,
            body,
            session_id: query.session,
        },
    )
    .await
    .map_err(HttpAppError::from)?;

    Ok((StatusCode::CREATED, Json(outcome.items)))
}
