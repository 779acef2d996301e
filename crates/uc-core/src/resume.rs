use uc_model::state_data::StateName;

use crate::phase::Phase;

/// Where to re-enter the machine after a restart, dispatched purely on the
/// persisted `StateData.name` token. Every arm is named after an explicit
/// resume-semantics decision (idempotent re-run vs. "just check if it
/// worked" vs. "discard and move on"); see the phase table for what each
/// destination does next.
pub fn resume_phase(name: StateName) -> Phase {
    match name {
        // Any partial download is discarded; rollback is a no-op at this
        // point because nothing was ever installed.
        StateName::Download => Phase::Cleanup,
        // We rebooted; just check whether it worked.
        StateName::ArtifactReboot => Phase::VerifyReboot,
        // Re-run; rollback must be idempotent.
        StateName::ArtifactRollback => Phase::Rollback,
        StateName::ArtifactRollbackReboot | StateName::ArtifactVerifyRollbackReboot => {
            Phase::VerifyRollbackReboot
        }
        // Re-run the commit-leave script; idempotent.
        StateName::UpdateAfterFirstCommit => Phase::AfterCommit,
        StateName::ArtifactFailure => Phase::Failure,
        StateName::Cleanup => Phase::Cleanup,
        // Installed, or committed partway through -- the only safe move is
        // to ask the module whether it can roll back.
        StateName::ArtifactInstall
        | StateName::ArtifactCommit
        | StateName::ArtifactVerifyReboot => Phase::CheckRollback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_resumes_to_cleanup_discarding_partial_state() {
        assert_eq!(resume_phase(StateName::Download), Phase::Cleanup);
    }

    #[test]
    fn reboot_resumes_to_verify_reboot() {
        assert_eq!(resume_phase(StateName::ArtifactReboot), Phase::VerifyReboot);
    }

    #[test]
    fn commit_resumes_to_check_rollback() {
        assert_eq!(resume_phase(StateName::ArtifactCommit), Phase::CheckRollback);
    }
}
