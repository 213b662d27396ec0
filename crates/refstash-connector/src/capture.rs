//! Capture dispatch
//!
//! Every save endpoint decodes its body into one [`SaveRequest`] variant and
//! hands it here. The match is exhaustive: each variant drives its own
//! sub-pipeline (classify, resolve destination, materialize, register), and
//! an unknown import content type is a validation error rather than a
//! default branch.

use std::sync::Arc;

use refstash_core::models::{ItemDraft, TargetRef};
use refstash_core::proxy::ProxyScheme;
use refstash_core::AppError;

use crate::destination;
use crate::services::save::{ItemSaver, SaveOutcome};
use crate::state::AppState;

/// A classified save request. Exactly one variant applies per request,
/// chosen by the endpoint and the declared content type.
#[derive(Debug)]
pub enum SaveRequest {
    StructuredItems {
        items: Vec<ItemDraft>,
        uri: String,
        session_id: Option<String>,
        proxy: Option<ProxyScheme>,
        target: Option<String>,
    },
    Snapshot {
        url: String,
        html: Option<String>,
        pdf: bool,
        session_id: Option<String>,
        target: Option<String>,
    },
    PageTranslate {
        uri: String,
        html: String,
        session_id: Option<String>,
    },
    BibliographicText {
        content_type: String,
        body: String,
        session_id: Option<String>,
    },
}

fn parse_target(target: Option<String>) -> Result<Option<TargetRef>, AppError> {
    target.as_deref().map(TargetRef::parse).transpose()
}

pub async fn dispatch(
    state: &Arc<AppState>,
    request: SaveRequest,
) -> Result<SaveOutcome, AppError> {
    let saver = ItemSaver::new(state);
    match request {
        SaveRequest::StructuredItems {
            items,
            uri,
            session_id,
            proxy,
            target,
        } => {
            if items.is_empty() {
                return Err(AppError::Validation("no items to save".to_string()));
            }
            let destination =
                destination::select(parse_target(target)?, state.libraries.as_ref());
            tracing::debug!(uri = %uri, count = items.len(), "Saving structured items");
            saver
                .save_drafts(items, destination, session_id.as_deref(), proxy.as_ref())
                .await
        }

        SaveRequest::Snapshot {
            url,
            html,
            pdf,
            session_id,
            target,
        } => {
            let destination =
                destination::select(parse_target(target)?, state.libraries.as_ref());
            tracing::debug!(url = %url, pdf = pdf, "Saving snapshot");
            saver
                .save_snapshot(&url, html, pdf, destination, session_id.as_deref())
                .await
        }

        SaveRequest::PageTranslate {
            uri,
            html,
            session_id,
        } => {
            let candidates = state.engine.detect(&uri, &html).await;
            if candidates.is_empty() {
                return Err(AppError::NoHandler(
                    "No translator available for this page".to_string(),
                ));
            }
            let mut drafts: Option<Vec<ItemDraft>> = None;
            for candidate in &candidates {
                match state.engine.run(&candidate.translator.id, &uri, &html).await {
                    Ok(items) if !items.is_empty() => {
                        tracing::debug!(
                            translator = %candidate.translator.label,
                            count = items.len(),
                            "Translator produced items"
                        );
                        drafts = Some(items);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::debug!(
                            translator = %candidate.translator.id,
                            error = %e,
                            "Translator did not produce items"
                        );
                        continue;
                    }
                }
            }
            let drafts = drafts.ok_or_else(|| {
                AppError::NoHandler("No translator produced items for this page".to_string())
            })?;
            let destination = destination::select(None, state.libraries.as_ref());
            saver
                .save_drafts(drafts, destination, session_id.as_deref(), None)
                .await
        }

        SaveRequest::BibliographicText {
            content_type,
            body,
            session_id,
        } => {
            if !state.importer.supports(&content_type) {
                return Err(AppError::Validation(format!(
                    "unsupported import content type '{}'",
                    content_type
                )));
            }
            let drafts = state
                .importer
                .parse(&content_type, &body)
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            tracing::debug!(
                content_type = %content_type,
                count = drafts.len(),
                "Parsed bibliographic import"
            );
            let destination = destination::select(None, state.libraries.as_ref());
            saver
                .save_drafts(drafts, destination, session_id.as_deref(), None)
                .await
        }
    }
}
