use thiserror::Error;
use uc_transport::TransportError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("server aborted the deployment")]
    DeploymentAborted,

    #[error("server error ({0})")]
    ServerError(u16),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether a failed call is worth retrying under backoff, or whether
    /// it should propagate immediately (the server has already moved on).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApiError::DeploymentAborted | ApiError::Forbidden | ApiError::Unauthorized)
    }

    /// Maps a transport failure onto the API error taxonomy, pulling
    /// [`TransportError::Unauthorized`] (a failed re-authentication retry)
    /// up to its own sibling variant rather than burying it in `Transport`.
    pub fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => ApiError::Unauthorized,
            other => ApiError::Transport(other),
        }
    }
}
