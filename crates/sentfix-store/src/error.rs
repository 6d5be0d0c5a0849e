use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no pattern with id {0}")]
    NotFound(i64),

    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("diff details encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store connection lock poisoned")]
    LockPoisoned,

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("{0}")]
    Other(String),
}
