use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures raised by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed document '{id}' in collection '{collection}': {source}")]
    Malformed {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document for collection '{0}' is not a JSON object")]
    NotAnObject(String),

    #[error("invalid field name '{0}'")]
    InvalidField(String),

    #[error("unsupported database endpoint '{0}'; expected 'memory' or 'sqlite://...'")]
    UnsupportedEndpoint(String),
}
