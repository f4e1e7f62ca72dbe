//! In-memory object store for tests and local development

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{ObjectStore, StorageError};

/// A stored object and its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Bytes,
}

/// Process-local object store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    /// Simulate write failures if true
    fail_writes: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly
    pub fn insert(&self, key: impl Into<String>, content_type: impl Into<String>, body: Bytes) {
        self.objects.write().insert(
            key.into(),
            StoredObject {
                content_type: content_type.into(),
                body,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Make every subsequent `put_object` fail
    pub fn set_fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::Relaxed);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .read()
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StorageError::Backend("Simulated write failure".to_string()));
        }
        self.insert(key, content_type, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryObjectStore::new();
        store
            .put_object("k", "image/png", Bytes::from_static(b"data"))
            .await
            .unwrap();

        assert_eq!(store.get_object("k").await.unwrap(), "data");
        assert_eq!(store.get("k").unwrap().content_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = MemoryObjectStore::new();
        assert!(store.get_object("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = MemoryObjectStore::new();
        let clone = store.clone();
        clone.insert("k", "image/jpeg", Bytes::from_static(b"j"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_write_failure() {
        let store = MemoryObjectStore::new();
        store.set_fail_writes(true);

        let err = store
            .put_object("k", "image/png", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
        assert!(store.is_empty());
    }
}
