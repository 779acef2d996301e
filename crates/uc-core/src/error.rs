use thiserror::Error;

use uc_apiclient::ApiError;
use uc_runner::ModuleError;
use uc_store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("state store: {0}")]
    Store(#[from] StoreError),

    #[error("update module: {0}")]
    Module(#[from] ModuleError),

    #[error("server api: {0}")]
    Api(#[from] ApiError),

    #[error("no update module registered for payload type {0}")]
    NotSupported(String),

    #[error("artifact declared {0} payload types; exactly one is supported")]
    UnsupportedPayloadCount(usize),
}
