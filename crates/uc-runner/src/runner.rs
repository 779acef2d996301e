use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use uc_model::update_info::{RebootAction, RollbackSupport};

use crate::error::ModuleError;
use crate::fifo::{self, PayloadSpec, PayloadWriter};
use crate::process::{self, parse_one_line};
use crate::subcommand::SubCommand;
use crate::workdir::WorkDir;

/// Component D: discovers update modules on disk and invokes them under the
/// sub-command protocol, enforcing the configured per-call timeout.
pub struct ModuleRunner {
    modules_dir: PathBuf,
    timeout: Duration,
}

impl ModuleRunner {
    pub fn new(data_dir: &Path, timeout: Duration) -> Self {
        Self { modules_dir: data_dir.join("modules").join("v3"), timeout }
    }

    /// Resolves the module to invoke for a payload type by exact name
    /// match. A missing module is a startup-time error, never a panic.
    pub fn resolve(&self, payload_type: &str) -> Result<PathBuf, ModuleError> {
        let candidate = self.modules_dir.join(payload_type);
        let is_executable = std::fs::metadata(&candidate)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false);
        if is_executable {
            Ok(candidate)
        } else {
            Err(ModuleError::NotSupported(payload_type.to_string()))
        }
    }

    pub async fn supports_file_sizes(&self, module: &Path, work_dir: &WorkDir) -> Result<bool, ModuleError> {
        match process::run_to_completion(module, SubCommand::ProvidePayloadFileSizes, work_dir.root(), self.timeout)
            .await
        {
            Ok(stdout) => Ok(parse_one_line(&stdout, &["Yes", "No"]).unwrap_or("No") == "Yes"),
            // A module that doesn't implement this optional sub-command at
            // all is treated as "No" rather than a hard failure.
            Err(_) => Ok(false),
        }
    }

    pub async fn download(
        &self,
        module: &Path,
        work_dir: &WorkDir,
        with_file_sizes: bool,
        payloads: &[PayloadSpec],
        writer: &mut dyn PayloadWriter,
        always_persist_to_disk: bool,
    ) -> Result<(), ModuleError> {
        fifo::run_download(module, work_dir, with_file_sizes, payloads, writer, self.timeout, always_persist_to_disk)
            .await
    }

    pub async fn supports_rollback(&self, module: &Path, work_dir: &WorkDir) -> Result<RollbackSupport, ModuleError> {
        let stdout =
            process::run_to_completion(module, SubCommand::SupportsRollback, work_dir.root(), self.timeout).await?;
        match parse_one_line(&stdout, &["Yes", "No"])? {
            "Yes" => Ok(RollbackSupport::Yes),
            _ => Ok(RollbackSupport::No),
        }
    }

    pub async fn needs_artifact_reboot(&self, module: &Path, work_dir: &WorkDir) -> Result<RebootAction, ModuleError> {
        let stdout =
            process::run_to_completion(module, SubCommand::NeedsArtifactReboot, work_dir.root(), self.timeout)
                .await?;
        match parse_one_line(&stdout, &["Yes", "No", "Automatic"])? {
            "Yes" => Ok(RebootAction::Yes),
            "Automatic" => Ok(RebootAction::Automatic),
            _ => Ok(RebootAction::No),
        }
    }

    /// Runs one of the no-stdout-contract lifecycle sub-commands
    /// (`ArtifactInstall`, `ArtifactCommit`, `ArtifactRollback`, ...),
    /// propagating the exit status as the transition event.
    pub async fn run_lifecycle_step(
        &self,
        module: &Path,
        sub_command: SubCommand,
        work_dir: &WorkDir,
    ) -> Result<(), ModuleError> {
        process::run_to_completion(module, sub_command, work_dir.root(), self.timeout).await.map(|_| ())
    }
}
