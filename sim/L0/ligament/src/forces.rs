//! Body force contributions and their accumulation.
//!
//! A force element never writes into the host's force buffers. Applying a
//! tension returns a [`ForceContributions`] value; the host merges it into a
//! [`ForceAccumulator`], which sums per body and per coordinate. Several
//! elements acting on the same body therefore compose by addition.
//!
//! # Generalized Forces
//!
//! Body wrenches map to generalized forces through the transpose of the body
//! Jacobians stored in the [`MultibodyState`]:
//!
//! ```text
//! τ_c = Σ_b (v_b,c · f_b + ω_b,c · τ_b)
//! ```

use nalgebra::{Point3, Vector3};
use sim_types::{BodyId, CoordinateId, MultibodyState, SimError, SpatialForce};
use std::collections::BTreeMap;

use crate::error::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A force applied at a point on a body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyForce {
    /// Body the force acts on.
    pub body: BodyId,
    /// Application point in world coordinates.
    pub point: Point3<f64>,
    /// Force and its torque about the body origin.
    pub wrench: SpatialForce,
}

impl BodyForce {
    /// Force `force` at world point `point` on `body`, with the torque taken
    /// about `body_origin`.
    #[must_use]
    pub fn at_point(
        body: BodyId,
        point: Point3<f64>,
        body_origin: &Point3<f64>,
        force: Vector3<f64>,
    ) -> Self {
        Self {
            body,
            point,
            wrench: SpatialForce::at_offset(force, &(point - body_origin)),
        }
    }
}

/// The forces one element applies for one state.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceContributions {
    forces: Vec<BodyForce>,
}

impl ForceContributions {
    /// No forces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one force.
    pub fn push(&mut self, force: BodyForce) {
        self.forces.push(force);
    }

    /// All forces in application order.
    #[must_use]
    pub fn forces(&self) -> &[BodyForce] {
        &self.forces
    }

    /// Iterate over the forces.
    pub fn iter(&self) -> impl Iterator<Item = &BodyForce> {
        self.forces.iter()
    }

    /// Number of individual forces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// Whether no force is applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Sum of all force vectors. Zero for an internal element.
    #[must_use]
    pub fn net_force(&self) -> Vector3<f64> {
        self.forces
            .iter()
            .fold(Vector3::zeros(), |acc, f| acc + f.wrench.force)
    }

    /// Total wrench applied to one body.
    #[must_use]
    pub fn wrench_on(&self, body: BodyId) -> SpatialForce {
        self.forces
            .iter()
            .filter(|f| f.body == body)
            .fold(SpatialForce::zero(), |acc, f| acc + f.wrench)
    }

    /// Generalized force each coordinate receives from these body forces.
    ///
    /// Indexed by coordinate; length equals the state's coordinate count.
    #[must_use]
    pub fn generalized_forces(&self, state: &MultibodyState) -> Vec<f64> {
        (0..state.num_coordinates())
            .map(|c| {
                let coordinate = CoordinateId::new(c);
                self.forces
                    .iter()
                    .map(|f| state.jacobian_column(f.body, coordinate).power(&f.wrench))
                    .sum::<f64>()
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ForceContributions {
    type Item = &'a BodyForce;
    type IntoIter = std::slice::Iter<'a, BodyForce>;

    fn into_iter(self) -> Self::IntoIter {
        self.forces.iter()
    }
}

/// Host-side sum of force contributions.
///
/// Bodies are kept in id order so summation order, and with it every
/// floating-point result, is the same from run to run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceAccumulator {
    body_forces: BTreeMap<BodyId, SpatialForce>,
    generalized: Vec<f64>,
}

impl ForceAccumulator {
    /// Create an empty accumulator for a state with `num_coordinates`
    /// coordinates.
    #[must_use]
    pub fn new(num_coordinates: usize) -> Self {
        Self {
            body_forces: BTreeMap::new(),
            generalized: vec![0.0; num_coordinates],
        }
    }

    /// Add every body force of `contributions`.
    pub fn add(&mut self, contributions: &ForceContributions) {
        for force in contributions {
            *self.body_forces.entry(force.body).or_default() += force.wrench;
        }
    }

    /// Add a generalized force directly to one coordinate.
    pub fn add_generalized(&mut self, coordinate: CoordinateId, value: f64) -> Result<()> {
        let count = self.generalized.len();
        let slot = self.generalized.get_mut(coordinate.index()).ok_or(
            SimError::unknown_coordinate(coordinate.index(), count),
        )?;
        *slot += value;
        Ok(())
    }

    /// Accumulated wrench on one body (zero if none was applied).
    #[must_use]
    pub fn body_force(&self, body: BodyId) -> SpatialForce {
        self.body_forces.get(&body).copied().unwrap_or_default()
    }

    /// Bodies that received a force, in id order.
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.body_forces.keys().copied()
    }

    /// Generalized forces added with [`add_generalized`](Self::add_generalized).
    #[must_use]
    pub fn generalized(&self) -> &[f64] {
        &self.generalized
    }

    /// All body forces mapped to generalized forces, plus the directly added
    /// generalized forces.
    #[must_use]
    pub fn total_generalized(&self, state: &MultibodyState) -> Vec<f64> {
        (0..self.generalized.len())
            .map(|c| {
                let coordinate = CoordinateId::new(c);
                self.body_forces
                    .iter()
                    .map(|(&body, wrench)| state.jacobian_column(body, coordinate).power(wrench))
                    .sum::<f64>()
                    + self.generalized[c]
            })
            .collect()
    }

    /// Reset to zero, keeping the coordinate count.
    pub fn clear(&mut self) {
        self.body_forces.clear();
        self.generalized.iter_mut().for_each(|g| *g = 0.0);
    }
}
