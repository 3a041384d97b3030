//! Blankevoort–Huiskes ligament force law.
//!
//! The elastic force is quadratic in strain up to twice the transition
//! strain `εₜ` and linear beyond it:
//!
//! ```text
//!            ⎧ 0                       ε ≤ 0
//! F_elastic = ⎨ k ε² / (4 εₜ)           0 < ε ≤ 2εₜ
//!            ⎩ k (ε - εₜ)              ε > 2εₜ
//! ```
//!
//! Both branches meet at `ε = 2εₜ` with value `k εₜ` and slope `k`.
//!
//! Damping is proportional to strain rate and only acts while the ligament
//! is stretched:
//!
//! ```text
//! F_damping = c k ε̇    if ε > 0, else 0
//! ```
//!
//! The tension is `max(0, F_elastic + F_damping)`: a ligament can only pull.
//!
//! # References
//!
//! - Blankevoort, L. & Huiskes, R. (1991). Ligament-bone interaction in a
//!   three-dimensional model of the knee. J. Biomech. Eng. 113:263-269.

use crate::strain::StrainState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The Blankevoort–Huiskes piecewise spring with normalized damping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlankevoortHuiskes {
    /// Slope of the linear region (N).
    pub linear_stiffness: f64,
    /// Half the strain at which the curve becomes linear.
    pub transition_strain: f64,
    /// Damping coefficient normalized by stiffness.
    pub normalized_damping: f64,
}

impl BlankevoortHuiskes {
    /// Create a force law.
    #[must_use]
    pub const fn new(
        linear_stiffness: f64,
        transition_strain: f64,
        normalized_damping: f64,
    ) -> Self {
        Self {
            linear_stiffness,
            transition_strain,
            normalized_damping,
        }
    }

    /// Strain where the quadratic toe region ends.
    #[must_use]
    pub fn linear_onset(&self) -> f64 {
        2.0 * self.transition_strain
    }

    /// Elastic force at the given strain (N).
    #[must_use]
    pub fn elastic_force(&self, strain: f64) -> f64 {
        let k = self.linear_stiffness;
        let t = self.transition_strain;

        if strain <= 0.0 {
            0.0
        } else if strain <= self.linear_onset() {
            0.25 * k * strain * strain / t
        } else {
            // NaN strain lands here and stays NaN.
            k * (strain - t)
        }
    }

    /// Slope of the elastic force with respect to strain (N).
    #[must_use]
    pub fn elastic_stiffness(&self, strain: f64) -> f64 {
        let k = self.linear_stiffness;

        if strain <= 0.0 {
            0.0
        } else if strain <= self.linear_onset() {
            0.5 * k * strain / self.transition_strain
        } else {
            k
        }
    }

    /// Damping force (N). Zero unless the ligament is stretched.
    #[must_use]
    pub fn damping_force(&self, strain: f64, strain_rate: f64) -> f64 {
        if strain > 0.0 {
            self.normalized_damping * self.linear_stiffness * strain_rate
        } else {
            0.0
        }
    }

    /// Total tension (N), never negative.
    #[must_use]
    pub fn tension(&self, strain: f64, strain_rate: f64) -> f64 {
        clamp_tension(self.elastic_force(strain) + self.damping_force(strain, strain_rate))
    }

    /// Evaluate every term of the law at once.
    #[must_use]
    pub fn evaluate(&self, state: StrainState) -> TensionBreakdown {
        let elastic = self.elastic_force(state.strain);
        let damping = self.damping_force(state.strain, state.strain_rate);

        TensionBreakdown {
            strain: state.strain,
            strain_rate: state.strain_rate,
            elastic,
            damping,
            tension: clamp_tension(elastic + damping),
        }
    }
}

// `f64::max` would turn NaN into zero; keep it visible to the integrator.
fn clamp_tension(total: f64) -> f64 {
    if total < 0.0 { 0.0 } else { total }
}

/// Every term of one force-law evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TensionBreakdown {
    /// Strain the law was evaluated at.
    pub strain: f64,
    /// Strain rate the law was evaluated at (1/s).
    pub strain_rate: f64,
    /// Elastic force (N).
    pub elastic: f64,
    /// Damping force before clamping (N). May be negative while shortening.
    pub damping: f64,
    /// Clamped total tension (N).
    pub tension: f64,
}

impl TensionBreakdown {
    /// Whether the ligament is slack.
    #[must_use]
    pub fn is_slack(&self) -> bool {
        self.strain <= 0.0
    }

    /// Whether the strain is past the quadratic toe region.
    #[must_use]
    pub fn is_linear_region(&self, law: &BlankevoortHuiskes) -> bool {
        self.strain > law.linear_onset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn law() -> BlankevoortHuiskes {
        BlankevoortHuiskes::new(1000.0, 0.06, 0.003)
    }

    #[test]
    fn test_zero_strain_is_exactly_zero() {
        let law = BlankevoortHuiskes::new(1000.0, 0.06, 10.0);
        for rate in [-50.0, -1.0, 0.0, 1.0, 50.0] {
            assert_eq!(law.tension(0.0, rate), 0.0);
        }
    }

    #[test]
    fn test_slack_is_zero_for_any_rate() {
        let law = law();
        for strain in [-0.9, -0.2, -1e-9] {
            for rate in [-1e3, -0.5, 0.0, 0.5, 1e3] {
                assert_eq!(law.tension(strain, rate), 0.0);
                assert_eq!(law.damping_force(strain, rate), 0.0);
            }
        }
    }

    #[test]
    fn test_quadratic_region() {
        // 0.25 * 1000 * 0.06² / 0.06 = 15 N
        assert_relative_eq!(law().tension(0.06, 0.0), 15.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transition_continuity() {
        let law = law();
        let k = law.linear_stiffness;
        let t = law.transition_strain;
        let onset = law.linear_onset();

        // Value: both branch formulas give k·t at the boundary.
        let quadratic = 0.25 * k * onset * onset / t;
        let linear = k * (onset - t);
        assert_relative_eq!(quadratic, k * t, epsilon = 1e-10);
        assert_relative_eq!(linear, k * t, epsilon = 1e-10);
        assert_relative_eq!(law.elastic_force(onset), 60.0, epsilon = 1e-10);

        // Slope: analytic on both sides.
        assert_relative_eq!(law.elastic_stiffness(onset), k, epsilon = 1e-10);
        assert_relative_eq!(law.elastic_stiffness(onset + 1e-12), k, epsilon = 1e-10);

        // Slope: one-sided finite differences approach k.
        let h = 1e-7;
        let left = (law.elastic_force(onset) - law.elastic_force(onset - h)) / h;
        let right = (law.elastic_force(onset + h) - law.elastic_force(onset)) / h;
        assert_relative_eq!(left, k, max_relative = 1e-4);
        assert_relative_eq!(right, k, max_relative = 1e-4);
    }

    #[test]
    fn test_linear_region_with_damping() {
        // ε = 0.2, ε̇ = 0.02: 1000·(0.2 − 0.06) + 0.003·1000·0.02 = 140.06 N
        let breakdown = law().evaluate(StrainState::new(0.2, 0.02));
        assert_relative_eq!(breakdown.elastic, 140.0, epsilon = 1e-10);
        assert_relative_eq!(breakdown.damping, 0.06, epsilon = 1e-12);
        assert_relative_eq!(breakdown.tension, 140.06, epsilon = 1e-10);
        assert!(breakdown.is_linear_region(&law()));
        assert!(!breakdown.is_slack());
    }

    #[test]
    fn test_monotonic_in_strain() {
        let law = law();
        let mut previous = law.tension(0.0, 0.0);
        for i in 1..=2000 {
            let strain = f64::from(i) * 5e-4;
            let tension = law.tension(strain, 0.0);
            assert!(tension >= previous, "tension dropped at strain {strain}");
            previous = tension;
        }
    }

    #[test]
    fn test_never_negative() {
        let law = BlankevoortHuiskes::new(1000.0, 0.06, 0.5);
        for i in -20..=40 {
            let strain = f64::from(i) * 0.01;
            for j in -20..=20 {
                let rate = f64::from(j) * 10.0;
                assert!(law.tension(strain, rate) >= 0.0);
            }
        }
    }

    #[test]
    fn test_shortening_clamps_to_zero() {
        // Fast shortening in the toe region would push without the clamp.
        let law = BlankevoortHuiskes::new(1000.0, 0.06, 0.5);
        let breakdown = law.evaluate(StrainState::new(0.01, -10.0));
        assert!(breakdown.elastic + breakdown.damping < 0.0);
        assert_eq!(breakdown.tension, 0.0);
    }

    #[test]
    fn test_nan_propagates() {
        let law = law();
        assert!(law.tension(f64::NAN, 0.0).is_nan());
        assert!(law.tension(0.1, f64::NAN).is_nan());
    }

    #[test]
    fn test_zero_stiffness_is_inert() {
        let law = BlankevoortHuiskes::new(0.0, 0.06, 0.003);
        assert_eq!(law.tension(0.5, 3.0), 0.0);
    }
}
