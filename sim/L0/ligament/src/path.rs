//! The contract between a ligament and its path geometry.
//!
//! A ligament only knows its path through [`LigamentPath`]: length,
//! lengthening speed, moment arm and force application for a given state.
//! How the path is routed (straight segments, wrapping, moving points) is the
//! path's business.
//!
//! Display and scaling are optional capabilities a path may implement
//! ([`PathAppearance`], [`ScalablePath`]); the ligament uses them only where
//! the path type provides them.

use nalgebra::Vector3;
use sim_types::{BodyId, CoordinateId, MultibodyState};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::forces::ForceContributions;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometry a ligament is routed along.
pub trait LigamentPath {
    /// Current path length (m, non-negative).
    fn length(&self, state: &MultibodyState) -> f64;

    /// Rate of change of the path length (m/s, positive = lengthening).
    fn lengthening_speed(&self, state: &MultibodyState) -> f64;

    /// Derivative of the path length with respect to one coordinate.
    ///
    /// Positive means the path lengthens as the coordinate increases. A
    /// tension `F` then produces the generalized force `-F · moment_arm`.
    fn moment_arm(&self, state: &MultibodyState, coordinate: CoordinateId) -> Result<f64>;

    /// Forces on every body along the path produced by a tension.
    ///
    /// Must not modify the path.
    fn apply_tension(&self, state: &MultibodyState, tension: f64) -> ForceContributions;

    /// Bodies the path touches, each listed once.
    fn bodies(&self) -> Vec<BodyId>;
}

/// RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathColor {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl PathColor {
    /// Color of an unloaded ligament.
    pub const SLACK: Self = Self::new(0.2, 0.3, 0.9);

    /// Color of a ligament at or past the start of its linear region.
    pub const TAUT: Self = Self::new(0.9, 0.1, 0.1);

    /// Create a color.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Blend from `self` toward `other` by `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

/// A path that can be drawn.
pub trait PathAppearance {
    /// Set the display color.
    fn set_color(&mut self, color: PathColor);

    /// Current display color.
    fn color(&self) -> PathColor;
}

/// Per-body scale factors applied during model scaling.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleSet {
    factors: BTreeMap<BodyId, Vector3<f64>>,
}

impl ScaleSet {
    /// No scaling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scale `body` by per-axis factors in its local frame.
    #[must_use]
    pub fn with_body(mut self, body: BodyId, factors: Vector3<f64>) -> Self {
        self.factors.insert(body, factors);
        self
    }

    /// Scale `body` uniformly.
    #[must_use]
    pub fn with_uniform(self, body: BodyId, factor: f64) -> Self {
        self.with_body(body, Vector3::repeat(factor))
    }

    /// Factors for a body, if it is scaled.
    #[must_use]
    pub fn factors(&self, body: BodyId) -> Option<&Vector3<f64>> {
        self.factors.get(&body)
    }
}

/// A path whose geometry follows body scaling.
pub trait ScalablePath {
    /// Rescale path geometry attached to the scaled bodies.
    fn scale(&mut self, scale_set: &ScaleSet);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_color_lerp() {
        let mid = PathColor::SLACK.lerp(&PathColor::TAUT, 0.5);
        assert_relative_eq!(mid.r, 0.55, epsilon = 1e-12);
        assert_relative_eq!(mid.b, 0.5, epsilon = 1e-12);

        let below = PathColor::SLACK.lerp(&PathColor::TAUT, -1.0);
        assert_relative_eq!(below.r, PathColor::SLACK.r, epsilon = 1e-12);
        assert_relative_eq!(below.b, PathColor::SLACK.b, epsilon = 1e-12);

        let above = PathColor::SLACK.lerp(&PathColor::TAUT, 2.0);
        assert_relative_eq!(above.r, PathColor::TAUT.r, epsilon = 1e-12);
        assert_relative_eq!(above.g, PathColor::TAUT.g, epsilon = 1e-12);
        assert_relative_eq!(above.b, PathColor::TAUT.b, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_set() {
        let scales = ScaleSet::new().with_uniform(BodyId::new(1), 2.0);
        assert_eq!(scales.factors(BodyId::new(1)), Some(&Vector3::repeat(2.0)));
        assert_eq!(scales.factors(BodyId::new(2)), None);
    }
}
