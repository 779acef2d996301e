/// The update-module sub-command protocol. Variants map 1:1 onto the
/// string argument passed as `module <sub-command> <work-dir>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubCommand {
    ProvidePayloadFileSizes,
    Download,
    DownloadWithFileSizes,
    ArtifactInstall,
    ArtifactReboot,
    ArtifactVerifyReboot,
    ArtifactCommit,
    ArtifactRollback,
    ArtifactRollbackReboot,
    ArtifactVerifyRollbackReboot,
    ArtifactFailure,
    Cleanup,
    SupportsRollback,
    NeedsArtifactReboot,
}

impl SubCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            SubCommand::ProvidePayloadFileSizes => "ProvidePayloadFileSizes",
            SubCommand::Download => "Download",
            SubCommand::DownloadWithFileSizes => "DownloadWithFileSizes",
            SubCommand::ArtifactInstall => "ArtifactInstall",
            SubCommand::ArtifactReboot => "ArtifactReboot",
            SubCommand::ArtifactVerifyReboot => "ArtifactVerifyReboot",
            SubCommand::ArtifactCommit => "ArtifactCommit",
            SubCommand::ArtifactRollback => "ArtifactRollback",
            SubCommand::ArtifactRollbackReboot => "ArtifactRollbackReboot",
            SubCommand::ArtifactVerifyRollbackReboot => "ArtifactVerifyRollbackReboot",
            SubCommand::ArtifactFailure => "ArtifactFailure",
            SubCommand::Cleanup => "Cleanup",
            SubCommand::SupportsRollback => "SupportsRollback",
            SubCommand::NeedsArtifactReboot => "NeedsArtifactReboot",
        }
    }

    /// Whether this sub-command uses the FIFO streaming protocol rather
    /// than a one-line stdout contract or no contract at all.
    pub fn is_streaming(self) -> bool {
        matches!(self, SubCommand::Download | SubCommand::DownloadWithFileSizes)
    }
}
