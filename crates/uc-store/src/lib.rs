//! Component A: the persistent state store. An embedded, transactional
//! key-value engine holding the in-flight `StateData` record and the
//! installed-artifact `Provides` record, with a built-in write counter that
//! breaks state-machine loops before they can spin forever.

pub mod error;
pub mod kv;
pub mod provides;
pub mod sled_store;
pub mod state_store;

pub use error::StoreError;
pub use kv::{Kv, Txn};
pub use provides::{ProvidesRecord, ProvidesStore};
pub use sled_store::SledStore;
pub use state_store::StateStore;
