use crate::event::Event;

/// The companion deployment-tracking machine that runs in lockstep with the
/// main phase machine, recording only whether the deployment (and its
/// rollback, if any) has failed. `SaveProvides` and the final status push
/// read `failed`/`rollback_failed` off of this to decide what to persist
/// and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    NoFailures,
    Failure,
    RollbackAttempted,
    RollbackFailed,
}

impl TrackingState {
    pub fn apply(self, event: Event) -> TrackingState {
        if event == Event::DeploymentEnded {
            return TrackingState::Idle;
        }
        match (self, event) {
            (TrackingState::Idle, Event::DeploymentStarted) => TrackingState::NoFailures,
            (TrackingState::NoFailures, Event::Failure) => TrackingState::Failure,
            (TrackingState::Failure, Event::RollbackStarted) => TrackingState::RollbackAttempted,
            (TrackingState::RollbackAttempted, Event::Failure) => TrackingState::RollbackFailed,
            (other, _) => other,
        }
    }

    pub fn failed(self) -> bool {
        !matches!(self, TrackingState::Idle | TrackingState::NoFailures)
    }

    pub fn rollback_failed(self) -> bool {
        matches!(self, TrackingState::RollbackFailed)
    }
}
