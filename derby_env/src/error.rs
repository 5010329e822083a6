//! Error types for the Derby environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// A random-source primitive was called with arguments it cannot honor
    /// (e.g. sampling more items than available).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EnvError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
