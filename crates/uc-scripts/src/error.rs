use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// No scripts exist for the requested edge. Not a failure -- the
    /// deployment machine treats this the same as a clean run.
    #[error("no scripts registered for this edge")]
    NothingToDo,

    /// A script exited with code 21: skip the remaining scripts at this
    /// edge and continue the deployment without treating it as a failure.
    #[error("script requested skip-remaining")]
    SkipRemaining,

    #[error("script exited with status {0}")]
    NonZeroExitStatus(i32),

    #[error("script timed out")]
    TimedOut,

    #[error("io error running script: {0}")]
    Io(String),
}

impl From<std::io::Error> for ScriptError {
    fn from(e: std::io::Error) -> Self {
        ScriptError::Io(e.to_string())
    }
}
