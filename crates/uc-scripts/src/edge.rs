use std::fmt;

/// A lifecycle edge a deployed artifact may ship scripts for. Named after
/// the phase they guard plus `Enter`/`Leave`/`Error`, mirroring the naming
/// an artifact's own `ArtifactInstall_Enter_00`-style script files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptEdge {
    IdleEnter,
    IdleLeave,
    SyncEnter,
    SyncLeave,
    DownloadEnter,
    DownloadLeave,
    DownloadError,
    ArtifactInstallEnter,
    ArtifactInstallLeave,
    ArtifactInstallError,
    ArtifactRebootEnter,
    ArtifactRebootLeave,
    ArtifactRebootError,
    ArtifactCommitEnter,
    ArtifactCommitLeave,
    ArtifactCommitError,
    ArtifactRollbackEnter,
    ArtifactRollbackLeave,
    ArtifactRollbackRebootEnter,
    ArtifactRollbackRebootLeave,
    ArtifactFailureEnter,
    ArtifactFailureLeave,
}

impl ScriptEdge {
    /// The name fragment an artifact's script files are prefixed with
    /// (e.g. `ArtifactInstall_Enter`, before the trailing `_NN` ordinal).
    pub fn name(self) -> &'static str {
        match self {
            ScriptEdge::IdleEnter => "Idle_Enter",
            ScriptEdge::IdleLeave => "Idle_Leave",
            ScriptEdge::SyncEnter => "Sync_Enter",
            ScriptEdge::SyncLeave => "Sync_Leave",
            ScriptEdge::DownloadEnter => "Download_Enter",
            ScriptEdge::DownloadLeave => "Download_Leave",
            ScriptEdge::DownloadError => "Download_Error",
            ScriptEdge::ArtifactInstallEnter => "ArtifactInstall_Enter",
            ScriptEdge::ArtifactInstallLeave => "ArtifactInstall_Leave",
            ScriptEdge::ArtifactInstallError => "ArtifactInstall_Error",
            ScriptEdge::ArtifactRebootEnter => "ArtifactReboot_Enter",
            ScriptEdge::ArtifactRebootLeave => "ArtifactReboot_Leave",
            ScriptEdge::ArtifactRebootError => "ArtifactReboot_Error",
            ScriptEdge::ArtifactCommitEnter => "ArtifactCommit_Enter",
            ScriptEdge::ArtifactCommitLeave => "ArtifactCommit_Leave",
            ScriptEdge::ArtifactCommitError => "ArtifactCommit_Error",
            ScriptEdge::ArtifactRollbackEnter => "ArtifactRollback_Enter",
            ScriptEdge::ArtifactRollbackLeave => "ArtifactRollback_Leave",
            ScriptEdge::ArtifactRollbackRebootEnter => "ArtifactRollbackReboot_Enter",
            ScriptEdge::ArtifactRollbackRebootLeave => "ArtifactRollbackReboot_Leave",
            ScriptEdge::ArtifactFailureEnter => "ArtifactFailure_Enter",
            ScriptEdge::ArtifactFailureLeave => "ArtifactFailure_Leave",
        }
    }

    /// `*_Error` edges run best-effort: failures are logged, never retried,
    /// and never turn into a `Failure` event for the deployment machine.
    pub fn is_error_edge(self) -> bool {
        self.name().ends_with("_Error")
    }
}

impl fmt::Display for ScriptEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
