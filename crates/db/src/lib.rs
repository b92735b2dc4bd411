//! Document storage for the catalog: a small store trait with in-memory and
//! SQLite backends, plus typed repositories on top.

use std::sync::Arc;

use catalog_kernel::settings::DatabaseSettings;

pub mod document;
pub mod error;
pub mod memory;
pub mod repository;
pub mod sqlite;
pub mod store;

pub use document::{DocId, Document, Filter, Query, RawDocument, Record};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repository::Repository;
pub use sqlite::SqliteStore;
pub use store::DocumentStore;

/// Open the store named by `settings.endpoint`.
pub async fn connect(settings: &DatabaseSettings) -> StoreResult<Arc<dyn DocumentStore>> {
    let endpoint = settings.endpoint.trim();
    let store: Arc<dyn DocumentStore> = if endpoint == "memory" || endpoint == "memory://" {
        Arc::new(MemoryStore::new())
    } else if endpoint.starts_with("sqlite:") {
        Arc::new(SqliteStore::connect(endpoint, settings.max_connections).await?)
    } else {
        return Err(StoreError::UnsupportedEndpoint(endpoint.to_string()));
    };

    tracing::info!(target: "catalog-db", backend = store.kind(), "document store connected");
    Ok(store)
}
