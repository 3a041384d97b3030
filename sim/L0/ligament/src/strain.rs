//! Strain and strain rate from path kinematics.
//!
//! ```text
//! ε  = (L - L_slack) / L_slack
//! ε̇ = v / L_slack
//! ```
//!
//! The slack length is checked once, when the model is built. Evaluating a
//! [`StrainModel`] never fails; non-finite lengths or speeds pass straight
//! through.

use crate::error::{LigamentError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strain and strain rate at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrainState {
    /// Relative elongation beyond slack length.
    pub strain: f64,
    /// Rate of strain change (1/s).
    pub strain_rate: f64,
}

impl StrainState {
    /// Create a strain state.
    #[must_use]
    pub const fn new(strain: f64, strain_rate: f64) -> Self {
        Self {
            strain,
            strain_rate,
        }
    }

    /// Whether the ligament is slack (carries no load).
    #[must_use]
    pub fn is_slack(&self) -> bool {
        self.strain <= 0.0
    }
}

/// Converts path length and lengthening speed into strain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrainModel {
    slack_length: f64,
}

impl StrainModel {
    /// Create a strain model. The slack length must be finite and positive.
    pub fn new(slack_length: f64) -> Result<Self> {
        if slack_length.is_finite() && slack_length > 0.0 {
            Ok(Self { slack_length })
        } else {
            Err(LigamentError::configuration(format!(
                "slack length must be finite and positive, got {slack_length}"
            )))
        }
    }

    /// Path length at zero strain (m).
    #[must_use]
    pub fn slack_length(&self) -> f64 {
        self.slack_length
    }

    /// Strain at the given path length.
    #[must_use]
    pub fn strain(&self, length: f64) -> f64 {
        (length - self.slack_length) / self.slack_length
    }

    /// Strain rate at the given lengthening speed.
    #[must_use]
    pub fn strain_rate(&self, lengthening_speed: f64) -> f64 {
        lengthening_speed / self.slack_length
    }

    /// Strain and strain rate together.
    #[must_use]
    pub fn evaluate(&self, length: f64, lengthening_speed: f64) -> StrainState {
        StrainState::new(self.strain(length), self.strain_rate(lengthening_speed))
    }
}
