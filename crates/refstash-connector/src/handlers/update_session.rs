use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use refstash_core::models::TargetRef;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    /// Tree-row token: `L<uuid>` for a library root, `C<uuid>` for a collection.
    pub target: Option<String>,
    /// Comma-separated tags to add to every item in the session.
    pub tags: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateSessionResponse {
    pub updated: usize,
}

#[utoipa::path(
    post,
    path = "/connector/updateSession",
    tag = "save",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 200, description = "Session items retargeted", body = UpdateSessionResponse),
        (status = 400, description = "Malformed target", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(session_id = %request.session_id, operation = "update_session"))]
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UpdateSessionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let target = request
        .target
        .as_deref()
        .map(TargetRef::parse)
        .transpose()
        .map_err(HttpAppError::from)?;

    let affected = state
        .sessions
        .update(
            &request.session_id,
            target,
            request.tags.as_deref(),
            state.store.as_ref(),
        )
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(UpdateSessionResponse {
        updated: affected.len(),
    }))
}
