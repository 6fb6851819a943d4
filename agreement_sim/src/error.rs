//! Errors of the simulation harness.

use agreement_env::AgreementError;
use thiserror::Error;

/// Failures outside the protocol itself: files, JSON and engine setup.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Agreement(#[from] AgreementError),

    #[error("Invalid arguments: {0}")]
    Usage(String),
}

impl SimError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}
