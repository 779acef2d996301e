//! The narrow key-value contract the rest of the client is built against.
//! `uc-store` is the only crate allowed to know this is backed by `sled`
//! rather than, say, a journal file -- everyone else programs to this
//! trait.

use crate::error::StoreError;

/// A single mutation visible inside a [`Kv::write_transaction`] closure.
/// Exposes the same read/write/remove surface as the outer store so callers
/// cannot tell the difference except that either every mutation they make
/// becomes visible, or none do.
pub trait Txn {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn remove(&self, key: &[u8]) -> Result<(), StoreError>;
}

pub trait Kv {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn remove(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Runs `f` against a transactional view; on return every mutation made
    /// through `txn` is committed atomically, or (if `f` returns an error)
    /// none of them are.
    fn write_transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: Fn(&dyn Txn) -> Result<T, StoreError>;
}
