use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record absent. A sentinel, not a failure, when absence is expected
    /// (no computors yet for an epoch, a skipped tick, ...).
    #[error("store resource not found")]
    NotFound,

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("invalid key component: {0}")]
    InvalidKey(String),

    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("record decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}
