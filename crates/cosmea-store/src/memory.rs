//! Process-local [`DocumentStore`].
//!
//! Collections are kept in ordered maps so `list` and `query_eq` return
//! documents by key, matching the SQLite backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::{
    apply_array_remove, apply_array_union, merge_fields, Document, DocumentRef, DocumentStore,
    Filter, Snapshot,
};
use crate::error::{Result, StoreError};

type Collection = BTreeMap<String, Document>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents currently stored in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    async fn modify<F>(&self, doc: &DocumentRef, f: F) -> Result<()>
    where
        F: FnOnce(&mut Document) + Send,
    {
        self.ensure_online()?;
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(&doc.collection)
            .and_then(|c| c.get_mut(&doc.id))
            .ok_or(StoreError::NotFound)?;
        f(target);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocumentRef) -> Result<Document> {
        self.ensure_online()?;
        self.collections
            .read()
            .await
            .get(&doc.collection)
            .and_then(|c| c.get(&doc.id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn set(&self, doc: &DocumentRef, data: Document) -> Result<()> {
        self.ensure_online()?;
        self.collections
            .write()
            .await
            .entry(doc.collection.clone())
            .or_default()
            .insert(doc.id.clone(), data);
        Ok(())
    }

    async fn update(&self, doc: &DocumentRef, fields: Document) -> Result<()> {
        self.modify(doc, |target| merge_fields(target, fields)).await
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<bool> {
        self.ensure_online()?;
        Ok(self
            .collections
            .write()
            .await
            .get_mut(&doc.collection)
            .and_then(|c| c.remove(&doc.id))
            .is_some())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Snapshot>> {
        self.query_eq(collection, &[]).await
    }

    async fn query_eq(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Snapshot>> {
        self.ensure_online()?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
            .map(|(id, data)| Snapshot {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn array_union(&self, doc: &DocumentRef, field: &str, values: Vec<Value>) -> Result<()> {
        self.modify(doc, |target| apply_array_union(target, field, &values))
            .await
    }

    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: Vec<Value>) -> Result<()> {
        self.modify(doc, |target| apply_array_remove(target, field, &values))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::conformance;

    #[tokio::test]
    async fn test_get_set_delete() {
        conformance::get_set_delete(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_update() {
        conformance::update_merges_and_requires_existing(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_list_and_query() {
        conformance::list_and_query(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_array_operations() {
        conformance::array_operations(&MemoryStore::new()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_array_union() {
        conformance::concurrent_array_union(std::sync::Arc::new(MemoryStore::new())).await;
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let store = MemoryStore::new();
        let key = DocumentRef::new("users", "u1");
        store.set(&key, Document::new()).await.unwrap();

        store.set_offline(true);
        assert!(matches!(store.get(&key).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.list("users").await, Err(StoreError::Unavailable(_))));

        store.set_offline(false);
        assert!(store.get(&key).await.is_ok());
        assert_eq!(store.count("users").await, 1);
    }
}
