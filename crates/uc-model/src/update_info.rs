use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a payload wants to be rebooted into, mirrored 1:1 off the artifact's
/// `reboot_requested` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebootAction {
    No,
    Yes,
    Automatic,
}

/// Cached answer from the update module's `SupportsRollback` call. `Unknown`
/// means the module has not been asked yet this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackSupport {
    Unknown,
    Yes,
    No,
}

impl Default for RollbackSupport {
    fn default() -> Self {
        RollbackSupport::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSource {
    pub uri: String,
    #[serde(default)]
    pub expire: Option<String>,
}

/// The artifact metadata a server hands back from `deployments/next`, plus
/// whatever the update module tells us about itself along the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub id: String,
    pub artifact_name: String,
    pub source: ArtifactSource,
    /// Exactly one entry is supported; more than one fails the deployment
    /// with `NotSupported` before any state transition begins.
    pub payload_types: Vec<String>,
    pub type_info_provides: BTreeMap<String, String>,
    pub clears_artifact_provides: Vec<String>,
    pub reboot_requested: Vec<RebootAction>,
    #[serde(default)]
    pub supports_rollback: RollbackSupport,
    #[serde(default)]
    pub all_rollbacks_successful: bool,
    #[serde(default)]
    pub has_db_schema_update: bool,
}

impl UpdateInfo {
    /// The one payload type this deployment carries, or `None` if the
    /// artifact declared zero or more than one (a boundary case that must
    /// fail fast rather than pick arbitrarily).
    pub fn single_payload_type(&self) -> Option<&str> {
        match self.payload_types.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}
