use uc_model::state_data::StateName;

/// The deployment lifecycle's tagged variant: one concrete state kind per
/// phase, dispatched through a single function rather than a virtual
/// `OnEnter` hierarchy (see the design notes on re-architecting that
/// pattern). Phases whose entry is a save point carry the
/// [`StateName`] token this implementation writes to the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PollForDeployment,
    Download,
    ArtifactInstall,
    CheckReboot,
    Reboot,
    VerifyReboot,
    BeforeCommit,
    Commit,
    AfterCommit,
    CommitErrorSaveProvides,
    CheckRollback,
    Rollback,
    RollbackReboot,
    VerifyRollbackReboot,
    Failure,
    SaveProvides,
    Cleanup,
    StateLoop,
    SendFinalStatus,
    ClearArtifactData,
    EndOfDeployment,
}

impl Phase {
    /// The `StateData.name` token a save-state phase persists on entry, or
    /// `None` for phases that never write state data.
    pub fn save_token(self) -> Option<StateName> {
        match self {
            Phase::Download => Some(StateName::Download),
            Phase::ArtifactInstall => Some(StateName::ArtifactInstall),
            Phase::Reboot => Some(StateName::ArtifactReboot),
            Phase::VerifyReboot => Some(StateName::ArtifactVerifyReboot),
            Phase::Commit => Some(StateName::ArtifactCommit),
            Phase::AfterCommit => Some(StateName::UpdateAfterFirstCommit),
            Phase::Rollback => Some(StateName::ArtifactRollback),
            Phase::RollbackReboot => Some(StateName::ArtifactRollbackReboot),
            Phase::VerifyRollbackReboot => Some(StateName::ArtifactVerifyRollbackReboot),
            Phase::Failure => Some(StateName::ArtifactFailure),
            Phase::Cleanup => Some(StateName::Cleanup),
            _ => None,
        }
    }

    pub fn is_save_state(self) -> bool {
        self.save_token().is_some()
    }
}
