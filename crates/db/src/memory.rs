//! Process-local store used for development and tests.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::document::{check_field, DocId, Filter, Query, RawDocument};
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

/// Collections kept in insertion order behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Missing and non-string values sort before strings, like null in a document store.
fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (
        a.get(field).and_then(Value::as_str),
        b.get(field).and_then(Value::as_str),
    ) {
        (Some(x), Some(y)) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ensure_object(collection: &str, body: &Value) -> StoreResult<()> {
    if body.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject(collection.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn find_by_id(&self, collection: &str, id: &DocId) -> StoreResult<Option<RawDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| &doc.id == id))
            .cloned())
    }

    async fn find_many(&self, collection: &str, query: &Query) -> StoreResult<Vec<RawDocument>> {
        if let Some(field) = query.sort {
            check_field(field)?;
        }

        let collections = self.collections.read().await;
        let mut found: Vec<RawDocument> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.filter.matches(&doc.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(field) = query.sort {
            // Stable sort keeps insertion order among equal keys.
            found.sort_by(|a, b| compare_field(&a.body, &b.body, field));
        }
        Ok(found)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(&doc.body)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, collection: &str, body: Value) -> StoreResult<DocId> {
        ensure_object(collection, &body)?;
        let id = DocId::generate();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(RawDocument {
                id: id.clone(),
                body,
            });
        Ok(id)
    }

    async fn replace(&self, collection: &str, id: &DocId, body: Value) -> StoreResult<bool> {
        ensure_object(collection, &body)?;
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| &doc.id == id));
        match slot {
            Some(doc) => {
                doc.body = body;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &DocId) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| &doc.id != id);
        Ok(docs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStore::new();
        let id = store
            .insert("genres", json!({"name": "Fantasy"}))
            .await
            .unwrap();

        let doc = store.find_by_id("genres", &id).await.unwrap().unwrap();
        assert_eq!(doc.body, json!({"name": "Fantasy"}));
        assert!(store
            .find_by_id("genres", &DocId::from("nope"))
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_id("authors", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_many_sorts_and_filters() {
        let store = MemoryStore::new();
        for (title, author) in [("Zeta", "a1"), ("Alpha", "a2"), ("Mid", "a1")] {
            store
                .insert("books", json!({"title": title, "author": author}))
                .await
                .unwrap();
        }

        let unsorted = store.find_many("books", &Query::all()).await.unwrap();
        let titles: Vec<_> = unsorted.iter().map(|d| d.body["title"].clone()).collect();
        assert_eq!(titles, vec!["Zeta", "Alpha", "Mid"]);

        let sorted = store
            .find_many(
                "books",
                &Query::filter(Filter::eq("author", "a1")).sort_by("title"),
            )
            .await
            .unwrap();
        let titles: Vec<_> = sorted.iter().map(|d| d.body["title"].clone()).collect();
        assert_eq!(titles, vec!["Mid", "Zeta"]);

        assert_eq!(store.count("books", &Filter::All).await.unwrap(), 3);
        assert_eq!(
            store.count("books", &Filter::eq("author", "a2")).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn replace_and_delete_report_presence() {
        let store = MemoryStore::new();
        let id = store.insert("genres", json!({"name": "Poetry"})).await.unwrap();

        assert!(store
            .replace("genres", &id, json!({"name": "Verse"}))
            .await
            .unwrap());
        assert!(!store
            .replace("genres", &DocId::from("gone"), json!({"name": "x"}))
            .await
            .unwrap());

        assert!(store.delete("genres", &id).await.unwrap());
        assert!(!store.delete("genres", &id).await.unwrap());
        assert_eq!(store.count("genres", &Filter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_non_object_bodies() {
        let store = MemoryStore::new();
        let err = store.insert("genres", json!("Poetry")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject(_)));
    }
}
