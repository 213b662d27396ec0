//! Attachment payload storage
//!
//! Snapshot HTML and imported files are kept outside the item records, keyed
//! by a storage key the attachment record points at. [`LocalBlobStore`] lays
//! keys out as relative paths under a root directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a payload under a key, creating parent directories as needed.
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<()>;

    /// Read a payload back.
    async fn get(&self, key: &str) -> BlobResult<Bytes>;

    async fn exists(&self, key: &str) -> BlobResult<bool>;

    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Filesystem-backed blob store rooted at a directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(root: PathBuf) -> BlobResult<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are relative paths; anything that could escape the root is
    /// rejected.
    fn resolve(&self, key: &str) -> BlobResult<PathBuf> {
        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        tracing::debug!(key = %key, bytes = data.len(), "Stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Bytes> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalBlobStore::new(dir.path().to_path_buf())
            .await
            .expect("blob store");
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let (_dir, store) = store().await;
        store
            .put("snapshots/a.html", Bytes::from_static(b"<html></html>"))
            .await
            .unwrap();
        let data = store.get("snapshots/a.html").await.unwrap();
        assert_eq!(&data[..], b"<html></html>");
        assert!(store.exists("snapshots/a.html").await.unwrap());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.get("nope.bin").await.unwrap_err(),
            BlobError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_dir, store) = store().await;
        for key in ["../escape", "/absolute", "a//b", ""] {
            assert!(matches!(
                store.put(key, Bytes::new()).await.unwrap_err(),
                BlobError::InvalidKey(_)
            ));
        }
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let (_dir, store) = store().await;
        store.put("f.pdf", Bytes::from_static(b"%PDF-")).await.unwrap();
        store.delete("f.pdf").await.unwrap();
        assert!(!store.exists("f.pdf").await.unwrap());
    }
}
