use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct NextDeploymentRequest {
    pub device_type: String,
    pub artifact_name: String,
    pub provides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextDeploymentResponse {
    pub id: String,
    pub artifact: NextDeploymentArtifact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextDeploymentArtifact {
    pub artifact_name: String,
    pub source: NextDeploymentSource,
    pub device_types_compatible: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextDeploymentSource {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStatus {
    Downloading,
    Installing,
    Rebooting,
    Success,
    Failure,
    AlreadyInstalled,
    PauseBeforeInstalling,
    PauseBeforeCommitting,
    PauseBeforeRebooting,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogReport {
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryAttribute {
    pub name: String,
    pub value: String,
}
