//! Components B and C: the authenticated HTTP transport and the resumable
//! downloader built on top of it.

pub mod client;
pub mod error;
pub mod resumable;
pub mod token;

pub use client::HttpTransport;
pub use error::TransportError;
pub use resumable::{ResumeConfig, Resumer};
pub use token::{NoAuth, TokenProvider};
