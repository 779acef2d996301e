use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::update_info::UpdateInfo;

/// Current schema version written by this implementation. A record loaded
/// with a different version is not upgraded silently -- see
/// [`StateData::load_compatible`].
pub const STATE_DATA_VERSION: u32 = 2;

/// The DB token recorded in [`StateData::name`] at every save-state entry.
/// Re-entering the machine after a crash dispatches purely on this string,
/// so the variants are exhaustive over every save point the state machine
/// defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateName {
    Download,
    ArtifactInstall,
    ArtifactReboot,
    ArtifactVerifyReboot,
    ArtifactCommit,
    UpdateAfterFirstCommit,
    ArtifactRollback,
    ArtifactRollbackReboot,
    ArtifactVerifyRollbackReboot,
    ArtifactFailure,
    Cleanup,
}

/// The single authoritative record of an in-flight deployment. Persisted as
/// one opaque blob under a well-known key and overwritten in a transaction
/// at every transition; see `uc-store` for the write-counted, atomic half of
/// that contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateData {
    pub version: u32,
    pub name: StateName,
    pub update_info: UpdateInfo,
}

impl StateData {
    pub fn new(name: StateName, update_info: UpdateInfo) -> Self {
        Self { version: STATE_DATA_VERSION, name, update_info }
    }

    /// Deserializes a persisted record, accepting the current version only.
    /// The v1-to-v2 compatibility question named in the design notes is
    /// resolved here: this implementation does not attempt to upgrade an
    /// old-schema record in place, it surfaces `UnsupportedStateVersion` so
    /// the caller can route straight to the loop-protection state rather
    /// than guess at a translation.
    pub fn load_compatible(bytes: &[u8]) -> Result<Self, ModelError> {
        let raw: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Malformed(e.to_string()))?;
        let found = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        if found != STATE_DATA_VERSION {
            return Err(ModelError::UnsupportedStateVersion { found, expected: STATE_DATA_VERSION });
        }
        serde_json::from_value(raw).map_err(|e| ModelError::Malformed(e.to_string()))
    }

    /// Canonical encoding used both for persistence and for the round-trip
    /// invariant: equal content always serializes to equal bytes.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(self).map_err(|e| ModelError::Malformed(e.to_string()))
    }
}
