use async_trait::async_trait;
use serde_json::Value;

use crate::document::{DocId, Filter, Query, RawDocument};
use crate::error::StoreResult;

/// Untyped document store. Bodies are JSON objects without the identifier.
///
/// Every call is atomic for the single document it touches; nothing spans
/// more than one document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs.
    fn kind(&self) -> &'static str;

    async fn find_by_id(&self, collection: &str, id: &DocId) -> StoreResult<Option<RawDocument>>;

    async fn find_many(&self, collection: &str, query: &Query) -> StoreResult<Vec<RawDocument>>;

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Store a new document and return its freshly assigned identifier.
    async fn insert(&self, collection: &str, body: Value) -> StoreResult<DocId>;

    /// Replace the body of an existing document. Returns `false` if absent.
    async fn replace(&self, collection: &str, id: &DocId, body: Value) -> StoreResult<bool>;

    /// Returns `false` if the document was already gone.
    async fn delete(&self, collection: &str, id: &DocId) -> StoreResult<bool>;
}
