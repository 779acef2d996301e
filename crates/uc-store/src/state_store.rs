use uc_model::state_data::StateData;

use crate::error::StoreError;
use crate::kv::Kv;

const STATE_DATA_KEY: &[u8] = b"state_data";
const WRITE_COUNT_KEY: &[u8] = b"state_data_write_count";

/// The durable half of the deployment loop-breaker: counts writes to the
/// `StateData` record within a single deployment run and refuses the write
/// once the configured cap would be exceeded, so a caller can never observe
/// a written-but-uncounted state.
pub struct StateStore<K: Kv> {
    kv: K,
    cap: u32,
}

impl<K: Kv> StateStore<K> {
    pub fn new(kv: K, cap: u32) -> Self {
        Self { kv, cap }
    }

    pub fn load(&self) -> Result<Option<StateData>, StoreError> {
        match self.kv.read(STATE_DATA_KEY)? {
            Some(bytes) => {
                let data = uc_model::state_data::StateData::load_compatible(&bytes)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Starts a fresh deployment: resets the write counter to zero before
    /// the first save so a new deployment never inherits a previous one's
    /// near-exhausted budget.
    pub fn begin_deployment(&self, first: &StateData) -> Result<(), StoreError> {
        self.kv.write_transaction(|txn| {
            txn.write(WRITE_COUNT_KEY, &0u32.to_be_bytes())?;
            let bytes = first.to_canonical_bytes().map_err(|e| StoreError::Io(e.to_string()))?;
            txn.write(STATE_DATA_KEY, &bytes)?;
            txn.write(WRITE_COUNT_KEY, &1u32.to_be_bytes())?;
            Ok(())
        })
    }

    /// Persists a transition. Fails with
    /// [`StoreError::StateDataStoreCountExceeded`] without writing anything
    /// if the cap would be exceeded -- the caller lifts this straight into
    /// `StateLoopDetected`.
    pub fn save(&self, data: &StateData) -> Result<(), StoreError> {
        let cap = self.cap;
        self.kv.write_transaction(|txn| {
            let current = txn
                .read(WRITE_COUNT_KEY)?
                .map(|b| u32::from_be_bytes(b.try_into().unwrap_or([0; 4])))
                .unwrap_or(0);
            if current >= cap {
                return Err(StoreError::StateDataStoreCountExceeded { cap });
            }
            let bytes = data.to_canonical_bytes().map_err(|e| StoreError::Io(e.to_string()))?;
            txn.write(STATE_DATA_KEY, &bytes)?;
            txn.write(WRITE_COUNT_KEY, &(current + 1).to_be_bytes())?;
            Ok(())
        })
    }

    /// Removes the record entirely; called from `ClearArtifactData`.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.kv.write_transaction(|txn| {
            txn.remove(STATE_DATA_KEY)?;
            txn.remove(WRITE_COUNT_KEY)?;
            Ok(())
        })
    }

    pub fn write_count(&self) -> Result<u32, StoreError> {
        Ok(self
            .kv
            .read(WRITE_COUNT_KEY)?
            .map(|b| u32::from_be_bytes(b.try_into().unwrap_or([0; 4])))
            .unwrap_or(0))
    }
}
