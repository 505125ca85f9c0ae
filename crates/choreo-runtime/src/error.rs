#![forbid(unsafe_code)]

//! Controller error taxonomy.
//!
//! Cancellation is deliberately a distinct variant rather than a generic
//! failure: an ad hoc callback can match on it to wind down quietly, while
//! engine failures carry through unchanged.

use choreo_core::EngineError;
use thiserror::Error;

/// Failures surfaced through the scoped animate function and intent runners.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimateError {
    /// The owning run was cancelled before this call was issued.
    #[error("animation call issued after its run was cancelled")]
    Cancelled,

    /// The engine rejected an invocation.
    #[error("animation engine error: {0}")]
    Engine(#[from] EngineError),

    /// A presence transition outside the supported `Present -> Exiting`
    /// order was attempted.
    #[error("unsupported presence transition: {0}")]
    PresenceViolation(&'static str),
}

impl AnimateError {
    /// Whether this is a cooperative-cancellation signal rather than a
    /// genuine failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnimateError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_distinguishable_from_engine_failure() {
        assert!(AnimateError::Cancelled.is_cancelled());
        assert!(!AnimateError::from(EngineError::EmptyRequest).is_cancelled());
    }

    #[test]
    fn engine_errors_convert_losslessly() {
        let err = AnimateError::from(EngineError::UnresolvedTarget);
        assert_eq!(err, AnimateError::Engine(EngineError::UnresolvedTarget));
    }
}
