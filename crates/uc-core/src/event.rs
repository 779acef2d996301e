/// Events that drive the deployment state machine. The machine itself never
/// polls or spawns anything directly -- every phase action reports one of
/// these back to the driver, which looks up the next phase in the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started,
    Success,
    Failure,
    NothingToDo,
    Retry,
    DeploymentStarted,
    DeploymentEnded,
    StateLoopDetected,
    InventoryPollingTriggered,
    DeploymentPollingTriggered,
    RollbackStarted,
}
