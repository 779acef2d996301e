use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uc_model::update_info::UpdateInfo;

use crate::error::StoreError;
use crate::kv::Kv;

const ARTIFACT_NAME_KEY: &[u8] = b"artifact_name";
const ARTIFACT_GROUP_KEY: &[u8] = b"artifact_group";
const PROVIDES_KEY: &[u8] = b"provides";
const STATE_DATA_KEY: &[u8] = b"state_data";
const WRITE_COUNT_KEY: &[u8] = b"state_data_write_count";

const INCONSISTENT_SUFFIX: &str = "_INCONSISTENT";

/// The currently installed artifact, as recorded after the last successful
/// (or successfully-rolled-back) deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvidesRecord {
    pub artifact_name: String,
    pub artifact_group: String,
    pub provides: BTreeMap<String, String>,
}

fn clears_pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

pub struct ProvidesStore<K: Kv> {
    kv: K,
}

impl<K: Kv> ProvidesStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> Result<ProvidesRecord, StoreError> {
        let artifact_name = self
            .kv
            .read(ARTIFACT_NAME_KEY)?
            .map(|b| String::from_utf8_lossy(&b).to_string())
            .unwrap_or_default();
        let artifact_group = self
            .kv
            .read(ARTIFACT_GROUP_KEY)?
            .map(|b| String::from_utf8_lossy(&b).to_string())
            .unwrap_or_default();
        let provides = match self.kv.read(PROVIDES_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => BTreeMap::new(),
        };
        Ok(ProvidesRecord { artifact_name, artifact_group, provides })
    }

    /// Commits a successful deployment: rewrites name/group, unions the new
    /// provides after removing anything matching `clears_artifact_provides`,
    /// and clears the `StateData` record -- all in one transaction, because
    /// a crash between the two halves would leave the device's running
    /// artifact disagreeing with what it claims to have installed.
    pub fn commit_success(&self, update_info: &UpdateInfo) -> Result<(), StoreError> {
        self.kv.write_transaction(|txn| {
            let mut provides: BTreeMap<String, String> = match txn.read(PROVIDES_KEY)? {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => BTreeMap::new(),
            };
            provides.retain(|k, _| {
                !update_info.clears_artifact_provides.iter().any(|pat| clears_pattern_matches(pat, k))
            });
            for (k, v) in &update_info.type_info_provides {
                provides.insert(k.clone(), v.clone());
            }
            txn.write(ARTIFACT_NAME_KEY, update_info.artifact_name.as_bytes())?;
            let group = provides.get("artifact_group").cloned().unwrap_or_default();
            txn.write(ARTIFACT_GROUP_KEY, group.as_bytes())?;
            txn.write(PROVIDES_KEY, &serde_json::to_vec(&provides)?)?;
            txn.remove(STATE_DATA_KEY)?;
            txn.remove(WRITE_COUNT_KEY)?;
            Ok(())
        })
    }

    /// Marks the device state uncertain after a failed rollback: the
    /// current `artifact_name` gets `_INCONSISTENT` appended (idempotent --
    /// calling this twice does not double-append), provides are left
    /// untouched, and `StateData` is cleared.
    pub fn commit_inconsistent(&self) -> Result<(), StoreError> {
        self.kv.write_transaction(|txn| {
            let current = txn
                .read(ARTIFACT_NAME_KEY)?
                .map(|b| String::from_utf8_lossy(&b).to_string())
                .unwrap_or_default();
            if !current.ends_with(INCONSISTENT_SUFFIX) {
                let marked = format!("{current}{INCONSISTENT_SUFFIX}");
                txn.write(ARTIFACT_NAME_KEY, marked.as_bytes())?;
            }
            txn.remove(STATE_DATA_KEY)?;
            txn.remove(WRITE_COUNT_KEY)?;
            Ok(())
        })
    }

    /// A failed deployment that rolled back successfully: provides and name
    /// are left untouched, only `StateData` is cleared.
    pub fn commit_rolled_back(&self) -> Result<(), StoreError> {
        self.kv.write_transaction(|txn| {
            txn.remove(STATE_DATA_KEY)?;
            txn.remove(WRITE_COUNT_KEY)?;
            Ok(())
        })
    }
}
