//! Error types for host state operations.

use thiserror::Error;

/// Errors raised when building or querying a [`MultibodyState`](crate::MultibodyState).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A coordinate index outside the state's coordinate range.
    #[error("unknown coordinate {index} (state has {count})")]
    UnknownCoordinate {
        /// The offending index.
        index: usize,
        /// Number of coordinates in the state.
        count: usize,
    },

    /// The state was given data it cannot hold.
    #[error("invalid state: {reason}")]
    InvalidState {
        /// Description of what went wrong.
        reason: String,
    },
}

impl SimError {
    /// Create an unknown coordinate error.
    #[must_use]
    pub const fn unknown_coordinate(index: usize, count: usize) -> Self {
        Self::UnknownCoordinate { index, count }
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Check if this is an unknown coordinate error.
    #[must_use]
    pub fn is_unknown_coordinate(&self) -> bool {
        matches!(self, Self::UnknownCoordinate { .. })
    }
}
