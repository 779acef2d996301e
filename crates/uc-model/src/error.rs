//! Errors shared across the data model itself (not the collaborators that
//! consume it -- those keep their own taxonomies per component).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("state data schema version {found} is not supported (expected {expected})")]
    UnsupportedStateVersion { found: u32, expected: u32 },

    #[error("malformed state data: {0}")]
    Malformed(String),
}
