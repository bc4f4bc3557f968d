use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, Fields, StoreError, StoreResult};

/// Process-local document store. IndexMap keeps listing in insertion order.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    collection: String,
    docs: RwLock<IndexMap<String, Fields>>,
}

impl MemoryDocumentStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            docs: RwLock::new(IndexMap::new()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Document>> {
        Ok(self.docs.read().await.get(key).map(|fields| Document {
            key: key.to_string(),
            fields: fields.clone(),
        }))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.docs.read().await.contains_key(key))
    }

    async fn set(&self, key: &str, fields: Fields) -> StoreResult<()> {
        self.docs.write().await.insert(key.to_string(), fields);
        Ok(())
    }

    async fn create(&self, key: &str, fields: Fields) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(key) {
            return Err(StoreError::already_exists(&self.collection, key));
        }
        docs.insert(key.to_string(), fields);
        Ok(())
    }

    async fn update(&self, key: &str, fields: Fields) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        let existing = docs
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(&self.collection, key))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.docs
            .write()
            .await
            .shift_remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(&self.collection, key))
    }

    async fn stream(&self) -> StoreResult<Vec<Document>> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .map(|(key, fields)| Document {
                key: key.clone(),
                fields: fields.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = MemoryDocumentStore::new("items");
        assert!(store.get("ghost").await.unwrap().is_none());
        assert!(!store.exists("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn create_refuses_existing_key() {
        let store = MemoryDocumentStore::new("items");
        store.create("bolt", fields(json!({ "quantity": 1 }))).await.unwrap();

        let err = store
            .create("bolt", fields(json!({ "quantity": 9 })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let doc = store.get("bolt").await.unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({ "quantity": 1 })));
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryDocumentStore::new("items");
        store
            .set("nut", fields(json!({ "quantity": 1, "bin": "A3" })))
            .await
            .unwrap();
        store.update("nut", fields(json!({ "quantity": 7 }))).await.unwrap();

        let doc = store.get("nut").await.unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({ "quantity": 7, "bin": "A3" })));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = MemoryDocumentStore::new("items");
        let err = store
            .update("nut", fields(json!({ "quantity": 7 })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No document found: items/nut");
        assert!(!store.exists("nut").await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = MemoryDocumentStore::new("items");
        let err = store.delete("nut").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn stream_keeps_insertion_order_after_delete() {
        let store = MemoryDocumentStore::new("items");
        for (i, key) in ["zeta", "alpha", "mid"].iter().enumerate() {
            store.set(key, fields(json!({ "quantity": i }))).await.unwrap();
        }
        store.delete("alpha").await.unwrap();

        let keys: Vec<String> = store
            .stream()
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.key)
            .collect();
        assert_eq!(keys, vec!["zeta", "mid"]);
    }
}
