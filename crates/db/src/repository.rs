use futures::future::try_join_all;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::document::{DocId, Document, Filter, Query, RawDocument, Record};
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

/// Typed access to one collection of a [`DocumentStore`].
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    fn decode(raw: RawDocument) -> StoreResult<Record<T>> {
        let RawDocument { id, body } = raw;
        let data = serde_json::from_value(body).map_err(|source| StoreError::Malformed {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
            source,
        })?;
        Ok(Record { id, data })
    }

    fn encode(data: &T) -> StoreResult<Value> {
        Ok(serde_json::to_value(data)?)
    }

    pub async fn find_by_id(&self, id: &DocId) -> StoreResult<Option<Record<T>>> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn find_many(&self, query: Query) -> StoreResult<Vec<Record<T>>> {
        self.store
            .find_many(T::COLLECTION, &query)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// First match in insertion order.
    pub async fn find_one(&self, filter: Filter) -> StoreResult<Option<Record<T>>> {
        let found = self.find_many(Query::filter(filter)).await?;
        Ok(found.into_iter().next())
    }

    /// Look up several ids concurrently. Missing ids are skipped; order follows `ids`.
    pub async fn find_by_ids(&self, ids: &[DocId]) -> StoreResult<Vec<Record<T>>> {
        let found = try_join_all(ids.iter().map(|id| self.find_by_id(id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    pub async fn count(&self, filter: Filter) -> StoreResult<u64> {
        self.store.count(T::COLLECTION, &filter).await
    }

    /// Persist a new document; the store assigns its identifier.
    pub async fn save(&self, data: T) -> StoreResult<Record<T>> {
        let id = self.store.insert(T::COLLECTION, Self::encode(&data)?).await?;
        tracing::debug!(collection = T::COLLECTION, id = %id, "document inserted");
        Ok(Record { id, data })
    }

    /// Replace every field of the document carrying `record.id`.
    /// Returns `false` when no such document exists.
    pub async fn update_by_id(&self, record: &Record<T>) -> StoreResult<bool> {
        let replaced = self
            .store
            .replace(T::COLLECTION, &record.id, Self::encode(&record.data)?)
            .await?;
        tracing::debug!(collection = T::COLLECTION, id = %record.id, replaced, "document replaced");
        Ok(replaced)
    }

    pub async fn delete_by_id(&self, id: &DocId) -> StoreResult<bool> {
        let deleted = self.store.delete(T::COLLECTION, id).await?;
        tracing::debug!(collection = T::COLLECTION, id = %id, deleted, "document deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Shelf {
        label: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    impl Document for Shelf {
        const COLLECTION: &'static str = "shelves";
    }

    fn shelf(label: &str) -> Shelf {
        Shelf {
            label: label.to_string(),
            tags: vec![],
        }
    }

    fn repo() -> Repository<Shelf> {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn save_assigns_id_and_update_keeps_it() {
        let repo = repo();
        let saved = repo.save(shelf("A")).await.unwrap();

        let updated = Record::new(saved.id.clone(), shelf("B"));
        assert!(repo.update_by_id(&updated).await.unwrap());

        let fetched = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(repo.count(Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_document_reports_false() {
        let repo = repo();
        let ghost = Record::new(DocId::from("ghost"), shelf("x"));
        assert!(!repo.update_by_id(&ghost).await.unwrap());
        assert_eq!(repo.count(Filter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_ids_skips_missing_and_keeps_order() {
        let repo = repo();
        let a = repo.save(shelf("A")).await.unwrap();
        let b = repo.save(shelf("B")).await.unwrap();

        let found = repo
            .find_by_ids(&[b.id.clone(), DocId::from("missing"), a.id.clone()])
            .await
            .unwrap();
        let labels: Vec<_> = found.iter().map(|r| r.data.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn find_one_uses_exact_match() {
        let repo = repo();
        repo.save(shelf("Poetry")).await.unwrap();

        assert!(repo
            .find_one(Filter::eq("label", "Poetry"))
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_one(Filter::eq("label", "poetry"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn malformed_documents_surface_as_errors() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let id = store
            .insert("shelves", serde_json::json!({"tags": ["x"]}))
            .await
            .unwrap();

        let repo: Repository<Shelf> = Repository::new(store);
        let err = repo.find_by_id(&id).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
