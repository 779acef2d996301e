use std::collections::BTreeMap;

use uc_model::update_info::UpdateInfo;
use uc_runner::{PayloadSpec, PayloadWriter};

/// What the deployment machine consumes from an already-parsed artifact:
/// the header view and a lazy payload byte stream. Producing this from the
/// wire bytes (tar parsing, signature verification) is out of scope here;
/// the CLI/daemon wiring constructs one of these after the resumable
/// downloader has the artifact stream in hand.
pub trait DeploymentInputs {
    fn update_info(&self) -> &UpdateInfo;
    fn device_type(&self) -> &str;
    fn header_files(&self) -> &BTreeMap<String, Vec<u8>>;
    fn payloads(&self) -> &[PayloadSpec];
    fn payload_writer(&mut self) -> &mut dyn PayloadWriter;
}

/// Triggers a reboot and blocks until the process dies, or returns an error
/// if the reboot could not be initiated. Device-type-specific rootfs
/// handling lives behind this seam, out of this crate's scope.
#[async_trait::async_trait]
pub trait Rebooter: Send + Sync {
    async fn reboot(&self) -> Result<(), crate::error::CoreError>;
}

pub struct SystemReboot;

#[async_trait::async_trait]
impl Rebooter for SystemReboot {
    async fn reboot(&self) -> Result<(), crate::error::CoreError> {
        let status = tokio::process::Command::new("reboot")
            .status()
            .await
            .map_err(|e| crate::error::CoreError::Module(uc_runner::ModuleError::Io(e.to_string())))?;
        if status.success() {
            Ok(())
        } else {
            Err(crate::error::CoreError::Module(uc_runner::ModuleError::NonZeroExitStatus(
                status.code().unwrap_or(-1),
            )))
        }
    }
}
