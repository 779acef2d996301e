use crate::event::Event;
use crate::phase::Phase;

/// The lifecycle graph as a pure `(phase, event) -> phase` table. This is
/// the entire re-architecture of the original virtual state hierarchy: one
/// dispatch function keyed on the tagged variant, instead of an `OnEnter`
/// override per state class.
pub fn next_phase(current: Phase, event: Event) -> Phase {
    use Event::*;
    use Phase::*;

    match (current, event) {
        (Idle, DeploymentPollingTriggered) => PollForDeployment,
        (Idle, InventoryPollingTriggered) => Idle,

        (PollForDeployment, Started) => Download,
        (PollForDeployment, NothingToDo) => Idle,
        (PollForDeployment, Failure) => Idle,

        (Download, Success) => ArtifactInstall,
        (Download, Failure) => Cleanup,

        (ArtifactInstall, Success) => CheckReboot,
        (ArtifactInstall, Failure) => CheckRollback,

        (CheckReboot, Success) => Reboot,
        (CheckReboot, NothingToDo) => BeforeCommit,
        (CheckReboot, Failure) => CheckRollback,

        (Reboot, Success) => VerifyReboot,
        (Reboot, Failure) => CheckRollback,

        (VerifyReboot, Success) => BeforeCommit,
        (VerifyReboot, Failure) => CheckRollback,

        (BeforeCommit, Started) => Commit,

        (Commit, Success) => AfterCommit,
        (Commit, Failure) => CheckRollback,

        (AfterCommit, Success) => SaveProvides,
        // The module's ArtifactCommit already ran successfully by the time
        // we're here; a failing commit-leave script cannot undo that, so
        // this is a distinct destination from the ordinary `SaveProvides`
        // that a pre-commit failure reaches, and it always persists the new
        // provides rather than treating the deployment as rolled back.
        (AfterCommit, Failure) => CommitErrorSaveProvides,

        (CommitErrorSaveProvides, Started) => Cleanup,

        (CheckRollback, Success) => Rollback,
        (CheckRollback, NothingToDo) => Failure,

        (Rollback, Success) => RollbackReboot,
        (Rollback, Failure) => Failure,

        (RollbackReboot, Success) => VerifyRollbackReboot,
        (RollbackReboot, Failure) => Failure,

        (VerifyRollbackReboot, Success) => SaveProvides,
        (VerifyRollbackReboot, Retry) => RollbackReboot,
        (VerifyRollbackReboot, Failure) => Failure,

        (Failure, Success) => SaveProvides,
        (Failure, Failure) => SaveProvides,

        (SaveProvides, Started) => Cleanup,

        (Cleanup, Success) => SendFinalStatus,
        (Cleanup, Failure) => SendFinalStatus,

        (StateLoop, Started) => Cleanup,

        (SendFinalStatus, Started) => ClearArtifactData,

        (ClearArtifactData, Started) => EndOfDeployment,

        (EndOfDeployment, DeploymentEnded) => Idle,

        (phase, StateLoopDetected) => {
            let _ = phase;
            StateLoop
        }

        (phase, _) => phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_install_path_reaches_send_final_status_without_rollback() {
        let mut phase = Phase::Idle;
        let script = [
            Event::DeploymentPollingTriggered,
            Event::Started,
            Event::Success, // Download -> ArtifactInstall
            Event::Success, // ArtifactInstall -> CheckReboot
            Event::NothingToDo, // CheckReboot -> BeforeCommit
            Event::Started, // BeforeCommit -> Commit
            Event::Success, // Commit -> AfterCommit
            Event::Success, // AfterCommit -> SaveProvides
            Event::Started, // SaveProvides -> Cleanup
            Event::Success, // Cleanup -> SendFinalStatus
        ];
        for event in script {
            phase = next_phase(phase, event);
        }
        assert_eq!(phase, Phase::SendFinalStatus);
    }

    #[test]
    fn install_failure_with_rollback_support_reaches_failure_phase() {
        let mut phase = Phase::ArtifactInstall;
        phase = next_phase(phase, Event::Failure); // -> CheckRollback
        assert_eq!(phase, Phase::CheckRollback);
        phase = next_phase(phase, Event::Success); // module supports rollback -> Rollback
        assert_eq!(phase, Phase::Rollback);
        phase = next_phase(phase, Event::Success); // -> RollbackReboot
        phase = next_phase(phase, Event::Success); // -> VerifyRollbackReboot
        phase = next_phase(phase, Event::Success); // -> SaveProvides
        assert_eq!(phase, Phase::SaveProvides);
    }

    #[test]
    fn a_failing_commit_leave_script_still_saves_provides_then_cleans_up() {
        let mut phase = Phase::AfterCommit;
        phase = next_phase(phase, Event::Failure);
        assert_eq!(phase, Phase::CommitErrorSaveProvides);
        phase = next_phase(phase, Event::Started);
        assert_eq!(phase, Phase::Cleanup);
    }

    #[test]
    fn any_phase_force_transitions_to_state_loop() {
        for phase in [Phase::Download, Phase::Commit, Phase::Rollback] {
            assert_eq!(next_phase(phase, Event::StateLoopDetected), Phase::StateLoop);
        }
    }

    #[test]
    fn retry_loops_on_verify_rollback_reboot() {
        assert_eq!(next_phase(Phase::VerifyRollbackReboot, Event::Retry), Phase::RollbackReboot);
    }
}
