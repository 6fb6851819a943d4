//! Error types for the Agreement Engine.

use crate::types::{ParticipantId, Round};
use thiserror::Error;

/// Errors surfaced to the caller of an agreement run.
///
/// Both variants are raised before (or, for overrides, while) a round is
/// assembled and are never retried: nothing about a bad `n` or a malformed
/// schedule is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgreementError {
    /// The run configuration is unusable (`n < 1`, `f >= n`, ids out of range, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A caller-supplied delivery cannot be applied as written
    #[error("Malformed message for participant {recipient} in round {round}: {reason}")]
    MalformedMessage {
        round: Round,
        recipient: ParticipantId,
        reason: String,
    },
}

impl AgreementError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a malformed message error.
    pub fn malformed(round: Round, recipient: ParticipantId, reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            round,
            recipient,
            reason: reason.into(),
        }
    }

    /// Returns true for configuration errors.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }

    /// Returns true for malformed message errors.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMessage { .. })
    }
}
