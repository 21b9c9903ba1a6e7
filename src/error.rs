//! Error types for the wire-fit learner.

use thiserror::Error;

/// Errors raised by the interpolator, the approximator and the learner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireFitError {
    /// Reinforcement applied without a preceding action selection
    #[error("invalid call sequence: no action has been chosen since the last reinforcement")]
    InvalidSequence,

    /// An argument is outside its valid domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vector has the wrong length
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {0}")]
    Config(String),
}

impl WireFitError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Fail with a dimension mismatch unless `actual == expected`
    pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(what, expected, actual))
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, WireFitError>;
