//! In-memory reference implementation of [`ItemStore`].
//!
//! Backs the service in tests and standalone runs. A `RwLock<HashMap>` holds
//! the records; change events go out on a broadcast channel in creation
//! order, which is what pins the parent-before-children guarantee observable
//! by subscribers.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use refstash_core::models::RecognizedMetadata;

use crate::traits::{
    AttachmentInfo, ItemChange, ItemStore, NewAttachment, NewItem, StoreError, StoreResult,
    StoredItem,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct MemoryStore {
    items: RwLock<HashMap<Uuid, StoredItem>>,
    events: broadcast::Sender<ItemChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            items: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("items lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, change: ItemChange) {
        // No subscribers is fine; events are best-effort notifications.
        let _ = self.events.send(change);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create_item(&self, new: NewItem) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let mut collections = BTreeSet::new();
        if let Some(collection_id) = new.collection_id {
            collections.insert(collection_id);
        }
        let item = StoredItem {
            id,
            library_id: new.library_id,
            parent_id: None,
            item_type: new.item_type,
            fields: new.fields,
            creators: new.creators,
            tags: BTreeSet::new(),
            collections,
            attachment: None,
            added_at: Utc::now(),
        };
        self.items
            .write()
            .expect("items lock poisoned")
            .insert(id, item);
        tracing::debug!(item_id = %id, "Created item");
        self.publish(ItemChange::Added {
            id,
            parent_id: None,
        });
        Ok(id)
    }

    async fn create_attachment(&self, new: NewAttachment) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let mut items = self.items.write().expect("items lock poisoned");
        if let Some(parent_id) = new.parent_id {
            if !items.contains_key(&parent_id) {
                return Err(StoreError::ParentNotFound(parent_id));
            }
        }
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("title".to_string(), new.title);
        if let Some(ref url) = new.url {
            fields.insert("url".to_string(), url.clone());
        }
        let mut collections = BTreeSet::new();
        if let Some(collection_id) = new.collection_id {
            collections.insert(collection_id);
        }
        let item = StoredItem {
            id,
            library_id: new.library_id,
            parent_id: new.parent_id,
            item_type: "attachment".to_string(),
            fields,
            creators: Vec::new(),
            tags: BTreeSet::new(),
            collections,
            attachment: Some(AttachmentInfo {
                kind: new.kind,
                content_type: new.content_type,
                url: new.url,
                blob_key: new.blob_key,
            }),
            added_at: Utc::now(),
        };
        items.insert(id, item);
        drop(items);
        tracing::debug!(item_id = %id, parent_id = ?new.parent_id, "Created attachment");
        self.publish(ItemChange::Added {
            id,
            parent_id: new.parent_id,
        });
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<StoredItem>> {
        Ok(self
            .items
            .read()
            .expect("items lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn add_to_collection(&self, item_id: Uuid, collection_id: Uuid) -> StoreResult<()> {
        let mut items = self.items.write().expect("items lock poisoned");
        let item = items.get_mut(&item_id).ok_or(StoreError::NotFound(item_id))?;
        item.collections.insert(collection_id);
        Ok(())
    }

    async fn add_tags(&self, item_id: Uuid, tags: &[String]) -> StoreResult<()> {
        let mut items = self.items.write().expect("items lock poisoned");
        let item = items.get_mut(&item_id).ok_or(StoreError::NotFound(item_id))?;
        for tag in tags {
            item.tags.insert(tag.clone());
        }
        Ok(())
    }

    async fn apply_recognized_metadata(
        &self,
        item_id: Uuid,
        metadata: &RecognizedMetadata,
    ) -> StoreResult<bool> {
        let mut items = self.items.write().expect("items lock poisoned");
        let Some(item) = items.get_mut(&item_id) else {
            return Ok(false);
        };
        if let Some(ref title) = metadata.title {
            item.fields.insert("title".to_string(), title.clone());
        }
        if !metadata.authors.is_empty() {
            item.creators = metadata.authors.clone();
        }
        if let Some(ref year) = metadata.year {
            item.fields.insert("date".to_string(), year.clone());
        }
        if let Some(ref doi) = metadata.doi {
            item.fields.insert("DOI".to_string(), doi.clone());
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut items = self.items.write().expect("items lock poisoned");
        if items.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        let children: Vec<Uuid> = items
            .values()
            .filter(|item| item.parent_id == Some(id))
            .map(|item| item.id)
            .collect();
        for child in children {
            items.remove(&child);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ItemChange> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::AttachmentKind;
    use refstash_core::models::CreatorDraft;
    use std::collections::BTreeMap;

    fn new_item(library_id: Uuid) -> NewItem {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Title".to_string());
        NewItem {
            library_id,
            collection_id: None,
            item_type: "newspaperArticle".to_string(),
            fields,
            creators: vec![CreatorDraft::author("First", "Last")],
        }
    }

    fn new_attachment(library_id: Uuid, parent_id: Option<Uuid>) -> NewAttachment {
        NewAttachment {
            parent_id,
            library_id,
            collection_id: None,
            title: "Attachment".to_string(),
            url: Some("http://example.com/a".to_string()),
            content_type: "text/html".to_string(),
            kind: AttachmentKind::ImportedSnapshot,
            blob_key: Some("snap/a.html".to_string()),
        }
    }

    #[tokio::test]
    async fn create_and_read_back() {
        let store = MemoryStore::new();
        let library_id = Uuid::new_v4();
        let id = store.create_item(new_item(library_id)).await.unwrap();
        let item = store.get(id).await.unwrap().unwrap();
        assert_eq!(item.title(), "Title");
        assert_eq!(item.library_id, library_id);
        assert!(item.is_top_level());
        assert!(!item.is_attachment());
    }

    #[tokio::test]
    async fn attachment_requires_existing_parent() {
        let store = MemoryStore::new();
        let library_id = Uuid::new_v4();
        let err = store
            .create_attachment(new_attachment(library_id, Some(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ParentNotFound(_)));
    }

    #[tokio::test]
    async fn events_emit_parent_before_child() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();
        let library_id = Uuid::new_v4();
        let parent = store.create_item(new_item(library_id)).await.unwrap();
        let child = store
            .create_attachment(new_attachment(library_id, Some(parent)))
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            ItemChange::Added { id, parent_id } => {
                assert_eq!(id, parent);
                assert_eq!(parent_id, None);
            }
        }
        match events.recv().await.unwrap() {
            ItemChange::Added { id, parent_id } => {
                assert_eq!(id, child);
                assert_eq!(parent_id, Some(parent));
            }
        }
    }

    #[tokio::test]
    async fn tags_are_idempotent() {
        let store = MemoryStore::new();
        let id = store.create_item(new_item(Uuid::new_v4())).await.unwrap();
        store
            .add_tags(id, &["A".to_string(), "B".to_string()])
            .await
            .unwrap();
        store.add_tags(id, &["A".to_string()]).await.unwrap();
        let item = store.get(id).await.unwrap().unwrap();
        assert_eq!(item.tags.len(), 2);
    }

    #[tokio::test]
    async fn collection_membership_is_additive() {
        let store = MemoryStore::new();
        let id = store.create_item(new_item(Uuid::new_v4())).await.unwrap();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.add_to_collection(id, first).await.unwrap();
        store.add_to_collection(id, second).await.unwrap();
        let item = store.get(id).await.unwrap().unwrap();
        assert!(item.collections.contains(&first));
        assert!(item.collections.contains(&second));
    }

    #[tokio::test]
    async fn recognized_metadata_updates_live_item() {
        let store = MemoryStore::new();
        let id = store.create_item(new_item(Uuid::new_v4())).await.unwrap();
        let metadata = RecognizedMetadata {
            title: Some("Recognized".to_string()),
            authors: vec![CreatorDraft::author("Jane", "Doe")],
            year: Some("1999".to_string()),
            doi: None,
        };
        assert!(store.apply_recognized_metadata(id, &metadata).await.unwrap());
        let item = store.get(id).await.unwrap().unwrap();
        assert_eq!(item.title(), "Recognized");
        assert_eq!(item.fields.get("date").map(String::as_str), Some("1999"));
    }

    #[tokio::test]
    async fn recognized_metadata_skips_deleted_item() {
        let store = MemoryStore::new();
        let id = store.create_item(new_item(Uuid::new_v4())).await.unwrap();
        store.delete(id).await.unwrap();
        let applied = store
            .apply_recognized_metadata(id, &RecognizedMetadata::default())
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn delete_removes_children() {
        let store = MemoryStore::new();
        let library_id = Uuid::new_v4();
        let parent = store.create_item(new_item(library_id)).await.unwrap();
        let child = store
            .create_attachment(new_attachment(library_id, Some(parent)))
            .await
            .unwrap();
        store.delete(parent).await.unwrap();
        assert!(store.get(child).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
