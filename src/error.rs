// src/error.rs
use thiserror::Error;

use crate::config::Platform;

/// Failures that end a run (or a dispatch) and must reach the operator.
///
/// Feed and thumbnail failures are not here: they are recovered in place
/// via [`crate::ingest::types::FetchOutcome::Unavailable`].
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("required setting {0} is not set")]
    ConfigMissing(&'static str),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("{platform} rejected request with status {status}: {body}")]
    DispatchRejected {
        platform: Platform,
        status: u16,
        body: String,
    },

    #[error("{platform} request failed: {reason}")]
    Transport { platform: Platform, reason: String },
}

impl NotifierError {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            NotifierError::ConfigMissing(_) | NotifierError::ConfigInvalid(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;
