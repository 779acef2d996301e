use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("connect error: {0}")]
    Connect(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("proxy error: {0}")]
    Proxy(String),

    #[error("request timed out")]
    TimedOut,

    #[error("request cancelled")]
    Cancelled,

    #[error("server returned unauthorized and re-authentication failed")]
    Unauthorized,

    #[error("response body missing where one was required")]
    BodyMissing,

    #[error("unexpected http status {0}")]
    UnexpectedStatus(u16),

    #[error("malformed Content-Range header: {0}")]
    MalformedContentRange(String),

    #[error("resume offset mismatch: expected {expected}, server resumed at {actual}")]
    ResumeOffsetMismatch { expected: u64, actual: u64 },

    #[error("download exhausted its retry budget after {attempts} attempts")]
    RetryBudgetExhausted { attempts: u32 },

    #[error("transport io error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::TimedOut
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidUrl(err.to_string())
        } else {
            TransportError::Io(err.to_string())
        }
    }
}
