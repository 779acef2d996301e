use async_trait::async_trait;

use crate::error::TransportError;

/// Narrow seam between the transport and whatever owns the authentication
/// protocol (bootstrapping, key exchange, JWT renewal). Kept this thin so
/// the transport never needs to know how a token was obtained, only how to
/// ask for a new one when a request comes back `401`.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn current_token(&self) -> Option<String>;

    /// Invoked exactly once per `401`; returns the new token on success.
    async fn reauthenticate(&self) -> Result<String, TransportError>;

    /// Invoked once per deployment, right before commit, so a cached token
    /// doesn't ride all the way through a reboot -- the next call asks
    /// fresh. Default no-op: a provider with nothing cached (like
    /// `NoAuth`) has nothing to expire.
    async fn invalidate(&self) {}
}

/// A provider that never re-authenticates; useful for unauthenticated
/// endpoints and for tests that don't exercise the 401 path.
pub struct NoAuth;

#[async_trait]
impl TokenProvider for NoAuth {
    async fn current_token(&self) -> Option<String> {
        None
    }

    async fn reauthenticate(&self) -> Result<String, TransportError> {
        Err(TransportError::Unauthorized)
    }
}
