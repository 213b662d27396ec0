//! Item store abstraction
//!
//! This module defines the [`ItemStore`] trait the save pipeline writes
//! through. The pipeline only holds item identifiers; record internals belong
//! to the store and are mutated exclusively through these operations.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use refstash_core::models::{CreatorDraft, RecognizedMetadata};

/// Item store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(Uuid),

    #[error("Parent item not found: {0}")]
    ParentNotFound(Uuid),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Parent record to create.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub library_id: Uuid,
    pub collection_id: Option<Uuid>,
    pub item_type: String,
    pub fields: BTreeMap<String, String>,
    pub creators: Vec<CreatorDraft>,
}

/// How an attachment's payload is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Full-page snapshot of fetched HTML.
    ImportedSnapshot,
    /// Imported file (e.g. a PDF).
    ImportedFile,
    /// Link only, no stored payload.
    LinkedUrl,
}

/// Attachment record to create.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    /// Owning parent; `None` creates a top-level attachment.
    pub parent_id: Option<Uuid>,
    pub library_id: Uuid,
    pub collection_id: Option<Uuid>,
    pub title: String,
    pub url: Option<String>,
    pub content_type: String,
    pub kind: AttachmentKind,
    /// Key of the stored payload in the blob store, when imported.
    pub blob_key: Option<String>,
}

/// Payload descriptor on a stored attachment item.
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub kind: AttachmentKind,
    pub content_type: String,
    pub url: Option<String>,
    pub blob_key: Option<String>,
}

/// A persisted item as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub id: Uuid,
    pub library_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub item_type: String,
    pub fields: BTreeMap<String, String>,
    pub creators: Vec<CreatorDraft>,
    pub tags: BTreeSet<String>,
    pub collections: BTreeSet<Uuid>,
    pub attachment: Option<AttachmentInfo>,
    pub added_at: DateTime<Utc>,
}

impl StoredItem {
    pub fn title(&self) -> &str {
        self.fields.get("title").map(String::as_str).unwrap_or("")
    }

    pub fn is_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn is_imported_attachment(&self) -> bool {
        matches!(
            self.attachment.as_ref().map(|a| a.kind),
            Some(AttachmentKind::ImportedSnapshot) | Some(AttachmentKind::ImportedFile)
        )
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Change notifications published by the store. Creation events are emitted
/// in creation order, so a parent's event always precedes its children's.
#[derive(Debug, Clone)]
pub enum ItemChange {
    Added { id: Uuid, parent_id: Option<Uuid> },
}

/// Item store abstraction
///
/// The pipeline materializes drafts through this trait and never touches
/// record internals directly. All operations address items by identifier.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Create a parent item and return its identifier.
    async fn create_item(&self, new: NewItem) -> StoreResult<Uuid>;

    /// Create an attachment, optionally under a parent.
    async fn create_attachment(&self, new: NewAttachment) -> StoreResult<Uuid>;

    /// Read an item back; `None` when it no longer exists.
    async fn get(&self, id: Uuid) -> StoreResult<Option<StoredItem>>;

    /// Add an item to a collection. Membership is additive; existing
    /// memberships are kept.
    async fn add_to_collection(&self, item_id: Uuid, collection_id: Uuid) -> StoreResult<()>;

    /// Add tags to an item. Adding an existing tag is a no-op.
    async fn add_tags(&self, item_id: Uuid, tags: &[String]) -> StoreResult<()>;

    /// Merge recognized metadata into an item. Returns `false` (not an error)
    /// when the item has been deleted in the interim.
    async fn apply_recognized_metadata(
        &self,
        item_id: Uuid,
        metadata: &RecognizedMetadata,
    ) -> StoreResult<bool>;

    /// Delete an item and its child attachments.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<ItemChange>;
}
