//! The document-store contract.
//!
//! A document is a JSON object addressed by a collection path and a key.
//! Nested addressing (channels under a server) is expressed through the
//! collection path, e.g. `channels/{serverId}`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// A document body.
pub type Document = Map<String, Value>;

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A single-field equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// A document read back from a collection together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Document,
}

impl Snapshot {
    /// Decode the body into a typed model.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        crate::models::from_document(self.data)
    }
}

/// Operations the data-access layer needs from a document database.
///
/// No operation spans more than one document, and only the array
/// operations are atomic with respect to concurrent writers of the same
/// document.  Everything else is last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. [`StoreError::NotFound`] when absent.
    async fn get(&self, doc: &DocumentRef) -> Result<Document>;

    /// Create or fully overwrite a document.
    async fn set(&self, doc: &DocumentRef, data: Document) -> Result<()>;

    /// Merge `fields` into an existing document.
    /// [`StoreError::NotFound`] when the document does not exist.
    async fn update(&self, doc: &DocumentRef, fields: Document) -> Result<()>;

    /// Delete a document. Returns `true` if one existed.
    async fn delete(&self, doc: &DocumentRef) -> Result<bool>;

    /// Every document of a collection, ordered by key.
    async fn list(&self, collection: &str) -> Result<Vec<Snapshot>>;

    /// Documents matching all `filters`, ordered by key.
    async fn query_eq(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Snapshot>>;

    /// Append each of `values` to the list `field` unless already present.
    async fn array_union(&self, doc: &DocumentRef, field: &str, values: Vec<Value>) -> Result<()>;

    /// Remove every occurrence of each of `values` from the list `field`.
    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: Vec<Value>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Field mutation helpers shared by the backends
// ---------------------------------------------------------------------------

/// Overwrite each field of `fields` in `target`, leaving the rest intact.
pub fn merge_fields(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

/// Missing or non-array fields are replaced by an empty list first.
pub fn apply_array_union(target: &mut Document, field: &str, values: &[Value]) {
    let entry = target
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    if let Value::Array(items) = entry {
        for value in values {
            if !items.contains(value) {
                items.push(value.clone());
            }
        }
    }
}

pub fn apply_array_remove(target: &mut Document, field: &str, values: &[Value]) {
    match target.get_mut(field) {
        Some(Value::Array(items)) => items.retain(|item| !values.contains(item)),
        _ => {
            target.insert(field.to_string(), Value::Array(Vec::new()));
        }
    }
}

/// Parse a stored JSON body, rejecting anything that is not an object.
pub fn parse_body(body: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected object, found {other}"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod conformance {
    //! Behaviour every [`DocumentStore`] backend must share.

    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    pub async fn get_set_delete(store: &dyn DocumentStore) {
        let key = DocumentRef::new("users", "u1");
        assert!(matches!(store.get(&key).await, Err(StoreError::NotFound)));

        store
            .set(&key, doc(json!({"username": "alice", "friends": []})))
            .await
            .unwrap();
        let read = store.get(&key).await.unwrap();
        assert_eq!(read["username"], "alice");

        // set is a full overwrite
        store.set(&key, doc(json!({"email": "a@e.com"}))).await.unwrap();
        let read = store.get(&key).await.unwrap();
        assert!(read.get("username").is_none());

        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
    }

    pub async fn update_merges_and_requires_existing(store: &dyn DocumentStore) {
        let key = DocumentRef::new("profiles", "u1");
        let err = store
            .update(&key, doc(json!({"avatar": "https://a"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        store
            .set(&key, doc(json!({"displayName": "alice", "avatar": null})))
            .await
            .unwrap();
        store
            .update(&key, doc(json!({"avatar": "https://a"})))
            .await
            .unwrap();
        let read = store.get(&key).await.unwrap();
        assert_eq!(read["displayName"], "alice");
        assert_eq!(read["avatar"], "https://a");
    }

    pub async fn list_and_query(store: &dyn DocumentStore) {
        for (id, name, email) in [("b", "bob", "b@e.com"), ("a", "alice", "a@e.com"), ("c", "bob", "c@e.com")] {
            store
                .set(
                    &DocumentRef::new("users", id),
                    doc(json!({"username": name, "email": email})),
                )
                .await
                .unwrap();
        }
        store
            .set(&DocumentRef::new("servers", "s1"), doc(json!({"name": "x"})))
            .await
            .unwrap();

        let all: Vec<String> = store
            .list("users")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(all, vec!["a", "b", "c"]);

        let bobs = store
            .query_eq("users", &[Filter::eq("username", "bob")])
            .await
            .unwrap();
        assert_eq!(bobs.len(), 2);
        assert_eq!(bobs[0].id, "b");

        let both = store
            .query_eq(
                "users",
                &[Filter::eq("username", "bob"), Filter::eq("email", "c@e.com")],
            )
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, "c");

        assert!(store
            .query_eq("users", &[Filter::eq("username", "carol")])
            .await
            .unwrap()
            .is_empty());
        assert!(store.list("nothing").await.unwrap().is_empty());
    }

    pub async fn array_operations(store: &dyn DocumentStore) {
        let key = DocumentRef::new("users", "u2");
        let err = store
            .array_union(&key, "pendingFriends", vec![json!("u1")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        store.set(&key, doc(json!({"username": "bob"}))).await.unwrap();
        store
            .array_union(&key, "pendingFriends", vec![json!("u1")])
            .await
            .unwrap();
        store
            .array_union(&key, "pendingFriends", vec![json!("u1"), json!("u3")])
            .await
            .unwrap();
        let read = store.get(&key).await.unwrap();
        assert_eq!(read["pendingFriends"], json!(["u1", "u3"]));

        store
            .array_remove(&key, "pendingFriends", vec![json!("u1"), json!("zz")])
            .await
            .unwrap();
        let read = store.get(&key).await.unwrap();
        assert_eq!(read["pendingFriends"], json!(["u3"]));
        assert_eq!(read["username"], "bob");
    }

    /// Writers racing on one list field must not drop each other's entries.
    pub async fn concurrent_array_union(store: Arc<dyn DocumentStore>) {
        const WRITERS: usize = 32;
        let key = DocumentRef::new("users", "target");
        store.set(&key, doc(json!({"username": "target"}))).await.unwrap();

        let tasks: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    store
                        .array_union(&key, "pendingFriends", vec![json!(format!("u{i}"))])
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let read = store.get(&key).await.unwrap();
        let pending = read["pendingFriends"].as_array().unwrap();
        assert_eq!(pending.len(), WRITERS);

        let tasks: Vec<_> = (0..WRITERS / 2)
            .map(|i| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    store
                        .array_remove(&key, "pendingFriends", vec![json!(format!("u{i}"))])
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let read = store.get(&key).await.unwrap();
        assert_eq!(read["pendingFriends"].as_array().unwrap().len(), WRITERS / 2);
    }
}
