use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("update module exited with status {0}")]
    NonZeroExitStatus(i32),

    #[error("update module protocol error: {0}")]
    ProtocolError(String),

    #[error("broken pipe talking to update module")]
    BrokenPipe,

    #[error("update module invocation timed out")]
    TimedOut,

    #[error("no update module registered for payload type {0}")]
    NotSupported(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ModuleError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::BrokenPipe {
            ModuleError::BrokenPipe
        } else {
            ModuleError::Io(err.to_string())
        }
    }
}
