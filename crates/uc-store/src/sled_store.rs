use sled::transaction::{ConflictableTransactionError, TransactionalTree};
use sled::Tree;
use std::path::Path;

use crate::error::StoreError;
use crate::kv::{Kv, Txn};

/// Embedded, durable key-value engine. No external database server is
/// assumed to exist -- the device may be offline entirely -- so persistence
/// is a single on-disk `sled` database rather than anything that needs a
/// running daemon of its own.
#[derive(Clone)]
pub struct SledStore {
    tree: Tree,
}

impl SledStore {
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let db = sled::open(data_dir.join("store"))?;
        let tree = db.open_tree("state")?;
        Ok(Self { tree })
    }

    /// In-memory variant for tests; behaves identically except nothing
    /// survives process exit.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree("state")?;
        Ok(Self { tree })
    }
}

struct SledTxn<'a>(&'a TransactionalTree);

impl<'a> Txn for SledTxn<'a> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.0.get(key).map_err(|e| StoreError::Io(e.to_string()))?.map(|v| v.to_vec()))
    }

    fn write(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.0.insert(key, value).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<(), StoreError> {
        self.0.remove(key).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

impl Kv for SledStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn write(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.tree.insert(key, value)?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<(), StoreError> {
        self.tree.remove(key)?;
        Ok(())
    }

    fn write_transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: Fn(&dyn Txn) -> Result<T, StoreError>,
    {
        let result = self.tree.transaction(|tx_tree| {
            let txn = SledTxn(tx_tree);
            f(&txn).map_err(ConflictableTransactionError::Abort)
        });
        result.map_err(StoreError::from)
    }
}
