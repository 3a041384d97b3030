//! Error types for ligament configuration and evaluation.

use crate::ligament::LifecycleStage;
use sim_types::SimError;
use thiserror::Error;

/// Errors that can occur while configuring or querying a ligament.
///
/// Per-step evaluation of a configured ligament never fails: non-finite
/// kinematics are propagated into the tension rather than reported here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LigamentError {
    /// A setter was given a value outside the parameter's valid range.
    ///
    /// The stored parameter is left unchanged.
    #[error("invalid {name} = {value}: must be {requirement}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable valid range.
        requirement: &'static str,
    },

    /// The parameter set as a whole cannot describe a physical ligament.
    ///
    /// Raised when the ligament is connected to a model; fatal to starting
    /// the simulation.
    #[error("ligament configuration error: {reason}")]
    Configuration {
        /// What is inconsistent.
        reason: String,
    },

    /// An operation was called before the ligament reached the required
    /// lifecycle stage.
    #[error("ligament is {actual}, operation requires {expected}")]
    Lifecycle {
        /// Minimum stage the operation needs.
        expected: LifecycleStage,
        /// Stage the ligament is in.
        actual: LifecycleStage,
    },

    /// The host state rejected a query.
    #[error(transparent)]
    State(#[from] SimError),
}

impl LigamentError {
    /// Create an invalid parameter error.
    #[must_use]
    pub const fn invalid_parameter(
        name: &'static str,
        value: f64,
        requirement: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value,
            requirement,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a lifecycle error.
    #[must_use]
    pub const fn lifecycle(expected: LifecycleStage, actual: LifecycleStage) -> Self {
        Self::Lifecycle { expected, actual }
    }

    /// Check if this is a setter rejection.
    #[must_use]
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result type for ligament operations.
pub type Result<T> = std::result::Result<T, LigamentError>;
