//! Item materialization
//!
//! Turns drafts into persisted items: validate, create the parent at the
//! resolved destination, then fetch and attach resources. The parent always
//! exists before any attachment is created, which is what gives subscribers
//! the parent-then-children event order. A failed attachment fetch is a
//! partial failure recorded on the outcome, never a failed save; a failed
//! parent creation aborts before anything else is committed.

use std::sync::Arc;

use uuid::Uuid;

use refstash_core::models::{AttachmentDraft, Destination, ItemDraft, ItemSummary};
use refstash_core::proxy::ProxyScheme;
use refstash_core::validation::validate_draft;
use refstash_core::AppError;
use refstash_store::{AttachmentKind, NewAttachment, NewItem};
use refstash_translate::embedded;
use refstash_worker::RecognitionJob;

use crate::state::AppState;

/// Result of one save call: summaries of the created parents and the number
/// of attachments that had to be skipped.
#[derive(Debug, Default)]
pub struct SaveOutcome {
    pub items: Vec<ItemSummary>,
    pub partial_failures: usize,
}

struct Materialized {
    parent_id: Uuid,
    attachment_ids: Vec<Uuid>,
    partial_failures: usize,
    summary: ItemSummary,
}

pub struct ItemSaver {
    state: Arc<AppState>,
}

impl ItemSaver {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Materialize a batch of drafts at one destination, registering results
    /// under the session. Validation runs over the whole batch first so a
    /// malformed draft fails the request before anything is created.
    pub async fn save_drafts(
        &self,
        mut drafts: Vec<ItemDraft>,
        destination: Destination,
        session_id: Option<&str>,
        proxy: Option<&ProxyScheme>,
    ) -> Result<SaveOutcome, AppError> {
        for draft in &drafts {
            validate_draft(draft)?;
        }

        if let Some(session_id) = session_id {
            self.state.sessions.begin(session_id, destination).await;
        }

        let mut outcome = SaveOutcome::default();
        for draft in &mut drafts {
            if let Some(proxy) = proxy {
                if let Some(url) = draft.field("url").map(str::to_string) {
                    draft.set_field("url", proxy.resolve(&url));
                }
            }
            let materialized = self.materialize(draft, destination).await?;
            self.record(session_id, &materialized).await;
            outcome.partial_failures += materialized.partial_failures;
            outcome.items.push(materialized.summary);
        }
        Ok(outcome)
    }

    /// Save a page snapshot, or fetch-and-import when `pdf` is requested.
    pub async fn save_snapshot(
        &self,
        url: &str,
        html: Option<String>,
        pdf: bool,
        destination: Destination,
        session_id: Option<&str>,
    ) -> Result<SaveOutcome, AppError> {
        if let Some(session_id) = session_id {
            self.state.sessions.begin(session_id, destination).await;
        }
        if pdf {
            return self.save_remote_document(url, destination, session_id).await;
        }
        let html = html
            .ok_or_else(|| AppError::Validation("missing html for snapshot".to_string()))?;
        self.save_html_snapshot(url, &html, destination, session_id)
            .await
    }

    /// Webpage parent plus an imported snapshot child from supplied HTML.
    async fn save_html_snapshot(
        &self,
        url: &str,
        html: &str,
        destination: Destination,
        session_id: Option<&str>,
    ) -> Result<SaveOutcome, AppError> {
        let title = embedded::page_title(html).unwrap_or_else(|| url.to_string());

        let mut draft = ItemDraft::new("webpage");
        draft.set_field("title", title.clone());
        draft.set_field("url", url);
        let parent_id = self.create_parent(&draft, destination).await?;

        let blob_key = format!("snapshots/{}.html", Uuid::new_v4());
        self.state
            .blobs
            .put(&blob_key, bytes::Bytes::from(html.as_bytes().to_vec()))
            .await
            .map_err(|e| AppError::Store(format!("Failed to store snapshot: {}", e)))?;

        let attachment_id = self
            .create_attachment_record(
                parent_id,
                destination,
                title.clone(),
                Some(url.to_string()),
                "text/html".to_string(),
                AttachmentKind::ImportedSnapshot,
                Some(blob_key),
            )
            .await?;

        let materialized = Materialized {
            parent_id,
            attachment_ids: vec![attachment_id],
            partial_failures: 0,
            summary: ItemSummary {
                id: parent_id,
                title,
                item_type: "webpage".to_string(),
            },
        };
        self.record(session_id, &materialized).await;
        Ok(SaveOutcome {
            items: vec![materialized.summary],
            partial_failures: 0,
        })
    }

    /// Fetch a remote resource and branch on what it turns out to be: a PDF
    /// is imported under a synthesized webpage parent (retitled later by
    /// recognition, never inline); HTML falls back to the snapshot path.
    async fn save_remote_document(
        &self,
        url: &str,
        destination: Destination,
        session_id: Option<&str>,
    ) -> Result<SaveOutcome, AppError> {
        let fetched = self.state.fetcher.fetch(url).await?;

        if fetched.is_html() && !fetched.is_pdf() {
            let html = String::from_utf8_lossy(&fetched.data).into_owned();
            return self
                .save_html_snapshot(url, &html, destination, session_id)
                .await;
        }
        if !fetched.is_pdf() {
            return Err(AppError::Validation(format!(
                "{} is not a PDF (got {})",
                url, fetched.content_type
            )));
        }

        let mut draft = ItemDraft::new("webpage");
        draft.set_field("title", url);
        draft.set_field("url", url);
        let parent_id = self.create_parent(&draft, destination).await?;

        let blob_key = format!("files/{}.pdf", Uuid::new_v4());
        self.state
            .blobs
            .put(&blob_key, fetched.data.clone())
            .await
            .map_err(|e| AppError::Store(format!("Failed to store file: {}", e)))?;

        let attachment_id = self
            .create_attachment_record(
                parent_id,
                destination,
                url.to_string(),
                Some(url.to_string()),
                "application/pdf".to_string(),
                AttachmentKind::ImportedFile,
                Some(blob_key),
            )
            .await?;

        self.state.recognition.submit(RecognitionJob {
            item_id: parent_id,
            attachment_id,
            data: fetched.data,
        });

        let materialized = Materialized {
            parent_id,
            attachment_ids: vec![attachment_id],
            partial_failures: 0,
            summary: ItemSummary {
                id: parent_id,
                title: url.to_string(),
                item_type: "webpage".to_string(),
            },
        };
        self.record(session_id, &materialized).await;
        Ok(SaveOutcome {
            items: vec![materialized.summary],
            partial_failures: 0,
        })
    }

    /// Create the parent, then fetch and attach resources concurrently.
    async fn materialize(
        &self,
        draft: &ItemDraft,
        destination: Destination,
    ) -> Result<Materialized, AppError> {
        let parent_id = self.create_parent(draft, destination).await?;

        let fetches = draft.attachments.iter().filter_map(|attachment| {
            attachment.url.clone().map(|url| {
                self.fetch_and_attach(parent_id, destination, attachment.clone(), url)
            })
        });
        let results = futures::future::join_all(fetches).await;

        let mut attachment_ids = Vec::new();
        let mut partial_failures = 0;
        for result in results {
            match result {
                Ok(id) => attachment_ids.push(id),
                Err(e) => {
                    partial_failures += 1;
                    tracing::warn!(
                        parent_id = %parent_id,
                        error = %e,
                        "Attachment skipped, parent save continues"
                    );
                }
            }
        }

        Ok(Materialized {
            parent_id,
            attachment_ids,
            partial_failures,
            summary: ItemSummary {
                id: parent_id,
                title: draft.title().unwrap_or("").to_string(),
                item_type: draft.item_type.clone(),
            },
        })
    }

    async fn create_parent(
        &self,
        draft: &ItemDraft,
        destination: Destination,
    ) -> Result<Uuid, AppError> {
        let fields = draft.string_fields()?;
        self.state
            .store
            .create_item(NewItem {
                library_id: destination.library_id,
                collection_id: destination.collection_id,
                item_type: draft.item_type.clone(),
                fields,
                creators: draft.creators.clone(),
            })
            .await
            .map_err(|e| AppError::Store(format!("Failed to create item: {}", e)))
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_attachment_record(
        &self,
        parent_id: Uuid,
        destination: Destination,
        title: String,
        url: Option<String>,
        content_type: String,
        kind: AttachmentKind,
        blob_key: Option<String>,
    ) -> Result<Uuid, AppError> {
        self.state
            .store
            .create_attachment(NewAttachment {
                parent_id: Some(parent_id),
                library_id: destination.library_id,
                collection_id: None,
                title,
                url,
                content_type,
                kind,
                blob_key,
            })
            .await
            .map_err(|e| AppError::Store(format!("Failed to create attachment: {}", e)))
    }

    /// Fetch one attachment URL and store it by what it actually is: HTML as
    /// a snapshot, PDF as an imported file with recognition queued, anything
    /// else as a plain imported file.
    async fn fetch_and_attach(
        &self,
        parent_id: Uuid,
        destination: Destination,
        attachment: AttachmentDraft,
        url: String,
    ) -> Result<Uuid, AppError> {
        let fetched = self.state.fetcher.fetch(&url).await?;
        let title = attachment.title.unwrap_or_else(|| url.clone());

        if fetched.is_pdf() {
            let blob_key = format!("files/{}.pdf", Uuid::new_v4());
            self.state
                .blobs
                .put(&blob_key, fetched.data.clone())
                .await
                .map_err(|e| AppError::Store(format!("Failed to store file: {}", e)))?;
            let attachment_id = self
                .create_attachment_record(
                    parent_id,
                    destination,
                    title,
                    Some(url),
                    "application/pdf".to_string(),
                    AttachmentKind::ImportedFile,
                    Some(blob_key),
                )
                .await?;
            self.state.recognition.submit(RecognitionJob {
                item_id: parent_id,
                attachment_id,
                data: fetched.data,
            });
            return Ok(attachment_id);
        }

        let (kind, content_type, blob_key) = if fetched.is_html() {
            (
                AttachmentKind::ImportedSnapshot,
                "text/html".to_string(),
                format!("snapshots/{}.html", Uuid::new_v4()),
            )
        } else {
            (
                AttachmentKind::ImportedFile,
                fetched.content_type.clone(),
                format!("files/{}.bin", Uuid::new_v4()),
            )
        };
        self.state
            .blobs
            .put(&blob_key, fetched.data.clone())
            .await
            .map_err(|e| AppError::Store(format!("Failed to store attachment: {}", e)))?;
        self.create_attachment_record(
            parent_id,
            destination,
            title,
            Some(url),
            content_type,
            kind,
            Some(blob_key),
        )
        .await
    }

    /// Transfer the created identifiers to the session registry, parent
    /// first.
    async fn record(&self, session_id: Option<&str>, materialized: &Materialized) {
        let Some(session_id) = session_id else {
            return;
        };
        let mut ids = Vec::with_capacity(1 + materialized.attachment_ids.len());
        ids.push(materialized.parent_id);
        ids.extend_from_slice(&materialized.attachment_ids);
        self.state.sessions.record_items(session_id, &ids).await;
    }
}
