//! Ligament parameter schema.
//!
//! [`LigamentParameters`] holds the five constants of the
//! Blankevoort–Huiskes ligament. Each constant has a getter and a
//! range-checked setter; a setter that rejects its input returns
//! [`LigamentError::InvalidParameter`] and leaves the stored value alone.
//!
//! | Parameter | Unit | Valid range |
//! |---|---|---|
//! | `linear_stiffness` | N | ≥ 0 |
//! | `ligament_transition_strain` | – | > 0 |
//! | `reference_strain` | – | > −1 |
//! | `reference_length` | m | > 0 |
//! | `normalized_damping_coefficient` | – | ≥ 0 |
//!
//! The slack length is derived, never stored:
//!
//! ```text
//! L_slack = L_ref / (1 + ε_ref)
//! ```
//!
//! Construction does not validate. A parameter set is checked as a whole by
//! [`LigamentParameters::validate`] when the ligament is connected to a
//! model.

use crate::error::{LigamentError, Result};
use crate::force_law::BlankevoortHuiskes;
use crate::strain::StrainModel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transition strain commonly used in the literature.
pub const DEFAULT_TRANSITION_STRAIN: f64 = 0.06;

/// Default normalized damping coefficient.
pub const DEFAULT_NORMALIZED_DAMPING: f64 = 0.003;

/// Constants of a Blankevoort–Huiskes ligament.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LigamentParameters {
    linear_stiffness: f64,
    ligament_transition_strain: f64,
    reference_strain: f64,
    reference_length: f64,
    normalized_damping_coefficient: f64,
}

impl Default for LigamentParameters {
    fn default() -> Self {
        Self {
            linear_stiffness: 0.0,
            ligament_transition_strain: DEFAULT_TRANSITION_STRAIN,
            reference_strain: 0.0,
            reference_length: 1.0,
            normalized_damping_coefficient: DEFAULT_NORMALIZED_DAMPING,
        }
    }
}

impl LigamentParameters {
    /// Create a parameter set. Values are not checked until
    /// [`validate`](Self::validate).
    #[must_use]
    pub const fn new(
        linear_stiffness: f64,
        ligament_transition_strain: f64,
        reference_strain: f64,
        reference_length: f64,
        normalized_damping_coefficient: f64,
    ) -> Self {
        Self {
            linear_stiffness,
            ligament_transition_strain,
            reference_strain,
            reference_length,
            normalized_damping_coefficient,
        }
    }

    /// Create a parameter set and validate it immediately.
    pub fn try_new(
        linear_stiffness: f64,
        ligament_transition_strain: f64,
        reference_strain: f64,
        reference_length: f64,
        normalized_damping_coefficient: f64,
    ) -> Result<Self> {
        let params = Self::new(
            linear_stiffness,
            ligament_transition_strain,
            reference_strain,
            reference_length,
            normalized_damping_coefficient,
        );
        params.validate()?;
        Ok(params)
    }

    /// Literature defaults (6% transition strain, no reference strain) for a
    /// ligament of the given stiffness and reference length.
    #[must_use]
    pub fn blankevoort(linear_stiffness: f64, reference_length: f64) -> Self {
        Self {
            linear_stiffness,
            reference_length,
            ..Self::default()
        }
    }

    /// Set the linear stiffness without checking.
    #[must_use]
    pub fn with_linear_stiffness(mut self, linear_stiffness: f64) -> Self {
        self.linear_stiffness = linear_stiffness;
        self
    }

    /// Set the transition strain without checking.
    #[must_use]
    pub fn with_transition_strain(mut self, transition_strain: f64) -> Self {
        self.ligament_transition_strain = transition_strain;
        self
    }

    /// Set the reference strain without checking.
    #[must_use]
    pub fn with_reference_strain(mut self, reference_strain: f64) -> Self {
        self.reference_strain = reference_strain;
        self
    }

    /// Set the reference length without checking.
    #[must_use]
    pub fn with_reference_length(mut self, reference_length: f64) -> Self {
        self.reference_length = reference_length;
        self
    }

    /// Set the normalized damping coefficient without checking.
    #[must_use]
    pub fn with_damping(mut self, normalized_damping_coefficient: f64) -> Self {
        self.normalized_damping_coefficient = normalized_damping_coefficient;
        self
    }

    /// Slope of the linear region of the force-strain curve (N).
    #[must_use]
    pub fn linear_stiffness(&self) -> f64 {
        self.linear_stiffness
    }

    /// Strain at which the curve turns from quadratic to linear is twice
    /// this value.
    #[must_use]
    pub fn ligament_transition_strain(&self) -> f64 {
        self.ligament_transition_strain
    }

    /// Strain of the ligament in the reference pose.
    #[must_use]
    pub fn reference_strain(&self) -> f64 {
        self.reference_strain
    }

    /// Path length in the reference pose (m).
    #[must_use]
    pub fn reference_length(&self) -> f64 {
        self.reference_length
    }

    /// Damping coefficient, normalized by stiffness and slack length.
    #[must_use]
    pub fn normalized_damping_coefficient(&self) -> f64 {
        self.normalized_damping_coefficient
    }

    /// Path length at which the ligament goes slack (m).
    #[must_use]
    pub fn slack_length(&self) -> f64 {
        slack_length(self.reference_length, self.reference_strain)
    }

    /// Set the linear stiffness. Rejects negative or non-finite values.
    pub fn set_linear_stiffness(&mut self, linear_stiffness: f64) -> Result<()> {
        check_non_negative("linear_stiffness", linear_stiffness)?;
        self.linear_stiffness = linear_stiffness;
        Ok(())
    }

    /// Set the transition strain. Rejects values ≤ 0 or non-finite.
    pub fn set_ligament_transition_strain(&mut self, transition_strain: f64) -> Result<()> {
        check_positive("ligament_transition_strain", transition_strain)?;
        self.ligament_transition_strain = transition_strain;
        Ok(())
    }

    /// Set the reference strain. Rejects values ≤ −1 (zero or negative slack
    /// length) or non-finite.
    pub fn set_reference_strain(&mut self, reference_strain: f64) -> Result<()> {
        check_reference_strain(reference_strain)?;
        check_slack_length(self.reference_length, reference_strain)
            .map_err(|_| invalid_slack("reference_strain", reference_strain))?;
        self.reference_strain = reference_strain;
        Ok(())
    }

    /// Set the reference length. Rejects values ≤ 0 or non-finite.
    pub fn set_reference_length(&mut self, reference_length: f64) -> Result<()> {
        check_positive("reference_length", reference_length)?;
        check_slack_length(reference_length, self.reference_strain)
            .map_err(|_| invalid_slack("reference_length", reference_length))?;
        self.reference_length = reference_length;
        Ok(())
    }

    /// Set the normalized damping coefficient. Rejects negative or
    /// non-finite values.
    pub fn set_normalized_damping_coefficient(&mut self, coefficient: f64) -> Result<()> {
        check_non_negative("normalized_damping_coefficient", coefficient)?;
        self.normalized_damping_coefficient = coefficient;
        Ok(())
    }

    /// Check the parameter set as a whole.
    ///
    /// Returns [`LigamentError::Configuration`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("linear_stiffness", self.linear_stiffness)
            .and_then(|()| {
                check_positive("ligament_transition_strain", self.ligament_transition_strain)
            })
            .and_then(|()| check_reference_strain(self.reference_strain))
            .and_then(|()| check_positive("reference_length", self.reference_length))
            .and_then(|()| {
                check_non_negative(
                    "normalized_damping_coefficient",
                    self.normalized_damping_coefficient,
                )
            })
            .and_then(|()| check_slack_length(self.reference_length, self.reference_strain))
            .map_err(|err| LigamentError::configuration(err.to_string()))
    }

    /// Strain model for this parameter set.
    pub fn strain_model(&self) -> Result<StrainModel> {
        StrainModel::new(self.slack_length())
    }

    /// Force law for this parameter set.
    #[must_use]
    pub fn force_law(&self) -> BlankevoortHuiskes {
        BlankevoortHuiskes::new(
            self.linear_stiffness,
            self.ligament_transition_strain,
            self.normalized_damping_coefficient,
        )
    }
}

fn slack_length(reference_length: f64, reference_strain: f64) -> f64 {
    reference_length / (1.0 + reference_strain)
}

fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LigamentError::invalid_parameter(name, value, "finite and >= 0"))
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LigamentError::invalid_parameter(name, value, "finite and > 0"))
    }
}

fn check_reference_strain(value: f64) -> Result<()> {
    if value.is_finite() && value > -1.0 {
        Ok(())
    } else {
        Err(LigamentError::invalid_parameter(
            "reference_strain",
            value,
            "finite and > -1",
        ))
    }
}

fn check_slack_length(reference_length: f64, reference_strain: f64) -> Result<()> {
    let slack = slack_length(reference_length, reference_strain);
    if slack.is_finite() && slack > 0.0 {
        Ok(())
    } else {
        Err(LigamentError::invalid_parameter(
            "slack_length",
            slack,
            "finite and > 0",
        ))
    }
}

fn invalid_slack(name: &'static str, value: f64) -> LigamentError {
    LigamentError::invalid_parameter(name, value, "a finite, positive slack length")
}
