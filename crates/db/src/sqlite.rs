//! SQLite-backed document store. Bodies are JSON text; filters and sorting
//! run through SQLite's JSON functions.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::document::{check_field, DocId, Filter, Query, RawDocument};
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        seq        INTEGER PRIMARY KEY AUTOINCREMENT,
        collection TEXT NOT NULL,
        id         TEXT NOT NULL,
        body       TEXT NOT NULL,
        UNIQUE (collection, id)
    )
"#;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if url.contains(":memory:") {
            // Every connection to `sqlite::memory:` is its own database; keep exactly one alive.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        tracing::info!(target: "catalog-db", url, "sqlite document store ready");

        Ok(Self { pool })
    }
}

/// SQL fragment and bind value for a filter, appended after `collection = ?`.
fn filter_clause(filter: &Filter) -> StoreResult<Option<(String, &str)>> {
    match filter {
        Filter::All => Ok(None),
        Filter::Eq { field, value } => {
            check_field(field)?;
            // json_each yields one row for a scalar and one per element for an array.
            let clause = format!(
                " AND EXISTS (SELECT 1 FROM json_each(documents.body, '$.{field}') WHERE json_each.value = ?)"
            );
            Ok(Some((clause, value.as_str())))
        }
    }
}

fn decode(collection: &str, id: String, body: String) -> StoreResult<RawDocument> {
    let body: Value = serde_json::from_str(&body).map_err(|source| StoreError::Malformed {
        collection: collection.to_string(),
        id: id.clone(),
        source,
    })?;
    Ok(RawDocument {
        id: DocId::from(id),
        body,
    })
}

fn encode(collection: &str, body: &Value) -> StoreResult<String> {
    if !body.is_object() {
        return Err(StoreError::NotAnObject(collection.to_string()));
    }
    Ok(serde_json::to_string(body)?)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn find_by_id(&self, collection: &str, id: &DocId) -> StoreResult<Option<RawDocument>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(id, body)| decode(collection, id, body))
            .transpose()
    }

    async fn find_many(&self, collection: &str, query: &Query) -> StoreResult<Vec<RawDocument>> {
        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
        let clause = filter_clause(&query.filter)?;
        if let Some((fragment, _)) = &clause {
            sql.push_str(fragment);
        }
        match query.sort {
            Some(field) => {
                check_field(field)?;
                sql.push_str(&format!(
                    " ORDER BY json_extract(body, '$.{field}') ASC, seq ASC"
                ));
            }
            None => sql.push_str(" ORDER BY seq ASC"),
        }

        let mut statement = sqlx::query_as::<_, (String, String)>(&sql).bind(collection);
        if let Some((_, value)) = clause {
            statement = statement.bind(value);
        }
        let rows = statement.fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(id, body)| decode(collection, id, body))
            .collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM documents WHERE collection = ?");
        let clause = filter_clause(filter)?;
        if let Some((fragment, _)) = &clause {
            sql.push_str(fragment);
        }

        let mut statement = sqlx::query_scalar::<_, i64>(&sql).bind(collection);
        if let Some((_, value)) = clause {
            statement = statement.bind(value);
        }
        let count = statement.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn insert(&self, collection: &str, body: Value) -> StoreResult<DocId> {
        let text = encode(collection, &body)?;
        let id = DocId::generate();
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(id.as_str())
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn replace(&self, collection: &str, id: &DocId, body: Value) -> StoreResult<bool> {
        let text = encode(collection, &body)?;
        let result = sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
            .bind(text)
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: &DocId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
