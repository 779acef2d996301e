//! Persistence errors, mapped from the embedded KV engine's own error type
//! into the semantic variants the rest of the client reasons about.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,

    #[error("state data store write count exceeded its cap ({cap}); this deployment is looping")]
    StateDataStoreCountExceeded { cap: u32 },

    #[error("transaction conflict, retry")]
    Conflict,

    #[error("io/database error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::CollectionNotFound(_) => StoreError::NotFound,
            other => StoreError::Io(other.to_string()),
        }
    }
}

impl<E> From<sled::transaction::TransactionError<E>> for StoreError
where
    E: Into<StoreError>,
{
    fn from(err: sled::transaction::TransactionError<E>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner.into(),
            sled::transaction::TransactionError::Storage(e) => StoreError::Io(e.to_string()),
        }
    }
}
