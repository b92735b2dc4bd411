//! Identifiers, records and query descriptions shared by all backends.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Store-assigned document identifier. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Allocate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A persisted type. Each implementor lives in its own collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
}

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: DocId,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Record<T> {
    pub fn new(id: DocId, data: T) -> Self {
        Self { id, data }
    }
}

/// A raw stored document: identifier plus JSON object body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: DocId,
    pub body: Value,
}

/// Selection criteria for `find_many` and `count`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    /// Field equals value; on array fields, any element equals value.
    Eq { field: &'static str, value: String },
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Filter::Eq {
            field,
            value: value.into(),
        }
    }

    /// Evaluate the filter against a document body.
    pub fn matches(&self, body: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => match body.get(*field) {
                Some(Value::String(found)) => found == value,
                Some(Value::Array(items)) => {
                    items.iter().any(|item| item.as_str() == Some(value.as_str()))
                }
                _ => false,
            },
        }
    }
}

/// A filter plus an optional ascending sort field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<&'static str>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(filter: Filter) -> Self {
        Self { filter, sort: None }
    }

    pub fn sort_by(mut self, field: &'static str) -> Self {
        self.sort = Some(field);
        self
    }
}

/// Field names are interpolated into backend queries, so only plain identifiers pass.
pub(crate) fn check_field(field: &str) -> StoreResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}
