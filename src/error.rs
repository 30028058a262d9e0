#![cfg(feature = "std")]

use std::fmt;
use std::time::Duration;

use crate::correlator::CorrelationId;

/// Failures the orchestration layer distinguishes when deciding whether to
/// recover locally, degrade, or stop a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// A mutating ledger call still failed after every retry.
    TransientSubmissionFailure {
        operation: &'static str,
        attempts: u32,
        last_error: String,
    },
    /// No correlated oracle reply arrived in time.
    OracleTimeout { id: CorrelationId, after: Duration },
    OracleUnavailable(String),
    UnparsableSuggestion,
    EncryptionUnavailable(String),
    /// A required collaborator could not be reached during start-up.
    FatalSetupFailure(String),
    /// Every cell has been fired at or resolved.
    BoardExhausted,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::TransientSubmissionFailure {
                operation,
                attempts,
                last_error,
            } => write!(
                f,
                "{} failed after {} attempts: {}",
                operation, attempts, last_error
            ),
            AgentError::OracleTimeout { id, after } => {
                write!(f, "oracle request {} timed out after {:?}", id, after)
            }
            AgentError::OracleUnavailable(cause) => write!(f, "oracle unavailable: {}", cause),
            AgentError::UnparsableSuggestion => write!(f, "oracle reply held no valid shot"),
            AgentError::EncryptionUnavailable(cause) => {
                write!(f, "encryption unavailable: {}", cause)
            }
            AgentError::FatalSetupFailure(cause) => write!(f, "setup failed: {}", cause),
            AgentError::BoardExhausted => write!(f, "no unfired cells remain"),
        }
    }
}

impl std::error::Error for AgentError {}
