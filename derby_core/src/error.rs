//! Error taxonomy for the race engines.
//!
//! Every variant is a precondition violation raised synchronously at the
//! call that broke it. Nothing here is transient, so nothing is retried.

use derby_env::EnvError;
use thiserror::Error;

/// Errors returned by the Derby engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerbyError {
    /// Random-source misuse, e.g. sampling more items than available
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A unique name/color pool ran dry while generating horses
    #[error("No unique {pool} available: all {available} already used")]
    ExhaustedPool {
        pool: &'static str,
        available: usize,
    },

    /// Round number outside 1..=TOTAL_ROUNDS
    #[error("Invalid round number: {0}")]
    InvalidRound(u32),

    /// Race built with the wrong number of horses
    #[error("Race must have exactly {expected} horses, got {actual}")]
    InvalidHorseCount { expected: usize, actual: usize },

    /// Schedule requested from a pool that cannot fill one race
    #[error("Need at least {required} horses, got {available}")]
    InsufficientHorses { required: usize, available: usize },
}

impl From<EnvError> for DerbyError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::InvalidArgument(msg) => Self::InvalidArgument(msg),
        }
    }
}

/// Result alias used across the core.
pub type Result<T> = std::result::Result<T, DerbyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_error_conversion() {
        let err: DerbyError = EnvError::invalid_argument("too many").into();
        assert_eq!(err, DerbyError::InvalidArgument("too many".to_string()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(DerbyError::InvalidRound(7).to_string(), "Invalid round number: 7");
        assert_eq!(
            DerbyError::InvalidHorseCount { expected: 10, actual: 5 }.to_string(),
            "Race must have exactly 10 horses, got 5"
        );
        assert_eq!(
            DerbyError::ExhaustedPool { pool: "colors", available: 20 }.to_string(),
            "No unique colors available: all 20 already used"
        );
    }
}
