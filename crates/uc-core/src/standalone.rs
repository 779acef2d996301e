use uc_model::state_data::StateName;

use crate::phase::Phase;
use crate::resume::resume_phase;

/// The CLI-driven counterpart to the daemon's lifecycle: narrower
/// transitions, explicit stop points, and no network polling or final
/// status push (there is no server to report to). Uses the same
/// `StateData` layout as the daemon so resumption across separate CLI
/// invocations works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandaloneCommand {
    Install,
    Commit,
    Rollback,
    Resume,
}

impl StandaloneCommand {
    /// Where this command starts driving the machine from, given whatever
    /// `StateData` (if any) is already on disk.
    pub fn entry_phase(self, persisted: Option<StateName>) -> Option<Phase> {
        match (self, persisted) {
            (StandaloneCommand::Install, None) => Some(Phase::Download),
            // An `install` that stopped before committing leaves `StateData`
            // at whichever save state it last entered on the way there:
            // `ArtifactInstall` if no reboot was needed, `ArtifactVerifyReboot`
            // if it rebooted and the reboot already verified. Either way the
            // reboot question is already settled, so `commit` re-enters at
            // `CheckReboot` rather than re-running the install itself, and
            // falls straight through to `Commit` once it confirms no reboot
            // is still pending.
            (StandaloneCommand::Commit, Some(StateName::ArtifactInstall | StateName::ArtifactVerifyReboot)) => {
                Some(Phase::CheckReboot)
            }
            (StandaloneCommand::Commit, Some(StateName::UpdateAfterFirstCommit)) => Some(Phase::Commit),
            (StandaloneCommand::Rollback, Some(_)) => Some(Phase::CheckRollback),
            (StandaloneCommand::Resume, Some(name)) => Some(resume_phase(name)),
            _ => None,
        }
    }

    /// Where a standalone run stops rather than continuing automatically.
    /// `install` never auto-commits, so the operator (or their
    /// orchestration) gets to inspect the installed-but-uncommitted state
    /// first; when `reboot_exit_code` is set it also stops at `Reboot`
    /// itself, before the reboot is performed, so the caller can report a
    /// distinct "reboot needed" exit status and hand control of the actual
    /// reboot to external orchestration.
    pub fn auto_stop_phases(self, reboot_exit_code: bool) -> Vec<Phase> {
        match self {
            StandaloneCommand::Install if reboot_exit_code => vec![Phase::BeforeCommit, Phase::Reboot],
            StandaloneCommand::Install => vec![Phase::BeforeCommit],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_with_no_prior_state_starts_at_download() {
        assert_eq!(StandaloneCommand::Install.entry_phase(None), Some(Phase::Download));
    }

    #[test]
    fn install_stops_before_committing() {
        assert_eq!(StandaloneCommand::Install.auto_stop_phases(false), vec![Phase::BeforeCommit]);
    }

    #[test]
    fn install_with_reboot_exit_code_also_stops_before_rebooting() {
        let phases = StandaloneCommand::Install.auto_stop_phases(true);
        assert!(phases.contains(&Phase::BeforeCommit));
        assert!(phases.contains(&Phase::Reboot));
    }

    #[test]
    fn commit_with_no_pending_install_is_a_no_op() {
        assert_eq!(StandaloneCommand::Commit.entry_phase(None), None);
    }

    #[test]
    fn commit_with_a_pending_install_re_enters_at_check_reboot() {
        assert_eq!(
            StandaloneCommand::Commit.entry_phase(Some(StateName::ArtifactInstall)),
            Some(Phase::CheckReboot)
        );
        assert_eq!(
            StandaloneCommand::Commit.entry_phase(Some(StateName::ArtifactVerifyReboot)),
            Some(Phase::CheckReboot)
        );
    }
}
