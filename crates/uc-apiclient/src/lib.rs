//! Component E: the server API client -- polling for the next deployment,
//! pushing status and logs, and the retry/backoff machinery shared by both.

pub mod backoff;
pub mod client;
pub mod error;
pub mod poller;
pub mod wire;

pub use backoff::ExponentialBackoff;
pub use client::ApiClient;
pub use error::ApiError;
pub use poller::{call_with_backoff, poll_backoff};
