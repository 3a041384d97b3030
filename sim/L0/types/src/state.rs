//! Realized multibody state handed to force elements.
//!
//! The host integrator owns a [`MultibodyState`] and lends it to force
//! elements for the duration of one evaluation. The state is assumed to be
//! realized through the velocity level: body poses, body Jacobians and
//! generalized speeds are all current.
//!
//! # Body Jacobians
//!
//! Each body stores one [`Twist`] column per generalized coordinate: the
//! motion of the body produced by a unit speed of that coordinate. The body
//! velocity is then
//!
//! ```text
//! twist_b = Σ_c J_b,c · u_c
//! ```
//!
//! and a generalized force is recovered from a body wrench by the transpose,
//! `τ_c = J_b,c · wrench_b`.
//!
//! # Revisions
//!
//! Every mutation bumps the [`StateRevision`]. Two evaluations that observe
//! the same revision observe the same state, which lets force elements
//! memoize per-state results.

use crate::{BodyId, CoordinateId, Pose, Result, SimError, Twist};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Monotonic token identifying a distinct simulation state.
///
/// Tokens are drawn from a process-wide counter, so two states only share a
/// revision when one is an unmodified clone of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateRevision(pub u64);

impl StateRevision {
    /// Draw a revision no other state has seen.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_REVISION.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Pose and Jacobian of a single body.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyFrame {
    /// World pose of the body.
    pub pose: Pose,
    /// Motion per unit speed of each coordinate, indexed by coordinate.
    ///
    /// Shorter than the coordinate count means the remaining columns are
    /// zero.
    pub jacobian: Vec<Twist>,
}

impl BodyFrame {
    /// A body frame that does not move with any coordinate.
    #[must_use]
    pub fn fixed(pose: Pose) -> Self {
        Self {
            pose,
            jacobian: Vec::new(),
        }
    }

    /// Set the Jacobian column for one coordinate.
    #[must_use]
    pub fn with_column(mut self, coordinate: CoordinateId, column: Twist) -> Self {
        let index = coordinate.index();
        if self.jacobian.len() <= index {
            self.jacobian.resize(index + 1, Twist::zero());
        }
        self.jacobian[index] = column;
        self
    }

    /// The Jacobian column for a coordinate (zero when absent).
    #[must_use]
    pub fn column(&self, coordinate: CoordinateId) -> Twist {
        self.jacobian
            .get(coordinate.index())
            .copied()
            .unwrap_or_default()
    }
}

/// Simulation state realized through the velocity level.
///
/// Bodies that were never inserted, including [`BodyId::GROUND`], are at
/// the world origin and do not move.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultibodyState {
    // Restored states never reuse a token from another state.
    #[cfg_attr(feature = "serde", serde(skip, default = "StateRevision::fresh"))]
    revision: StateRevision,
    time: f64,
    speeds: Vec<f64>,
    bodies: BTreeMap<BodyId, BodyFrame>,
}

impl MultibodyState {
    /// Create a state with `num_coordinates` generalized coordinates at rest.
    #[must_use]
    pub fn new(num_coordinates: usize) -> Self {
        Self {
            revision: StateRevision::fresh(),
            time: 0.0,
            speeds: vec![0.0; num_coordinates],
            bodies: BTreeMap::new(),
        }
    }

    /// Current revision token.
    #[must_use]
    pub fn revision(&self) -> StateRevision {
        self.revision
    }

    /// Mark the state as changed without touching its data.
    pub fn bump_revision(&mut self) {
        self.revision = StateRevision::fresh();
    }

    /// Simulation time (s).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Set the simulation time.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
        self.bump_revision();
    }

    /// Number of generalized coordinates.
    #[must_use]
    pub fn num_coordinates(&self) -> usize {
        self.speeds.len()
    }

    /// All generalized speeds.
    #[must_use]
    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    /// Check that a coordinate belongs to this state.
    pub fn check_coordinate(&self, coordinate: CoordinateId) -> Result<()> {
        if coordinate.index() < self.speeds.len() {
            Ok(())
        } else {
            Err(SimError::unknown_coordinate(
                coordinate.index(),
                self.speeds.len(),
            ))
        }
    }

    /// Generalized speed of one coordinate.
    pub fn speed(&self, coordinate: CoordinateId) -> Result<f64> {
        self.check_coordinate(coordinate)?;
        Ok(self.speeds[coordinate.index()])
    }

    /// Set the generalized speed of one coordinate.
    pub fn set_speed(&mut self, coordinate: CoordinateId, speed: f64) -> Result<()> {
        self.check_coordinate(coordinate)?;
        self.speeds[coordinate.index()] = speed;
        self.bump_revision();
        Ok(())
    }

    /// Insert or replace a body.
    ///
    /// Fails if the Jacobian has more columns than the state has
    /// coordinates.
    pub fn set_body(&mut self, body: BodyId, frame: BodyFrame) -> Result<()> {
        if frame.jacobian.len() > self.speeds.len() {
            return Err(SimError::invalid_state(format!(
                "{body} has {} jacobian columns but the state has {} coordinates",
                frame.jacobian.len(),
                self.speeds.len()
            )));
        }
        if body.is_ground() {
            return Err(SimError::invalid_state("the ground body cannot be moved"));
        }
        self.bodies.insert(body, frame);
        self.bump_revision();
        Ok(())
    }

    /// Builder form of [`set_body`](Self::set_body).
    pub fn with_body(mut self, body: BodyId, frame: BodyFrame) -> Result<Self> {
        self.set_body(body, frame)?;
        Ok(self)
    }

    /// Builder form of [`set_speed`](Self::set_speed).
    pub fn with_speed(mut self, coordinate: CoordinateId, speed: f64) -> Result<Self> {
        self.set_speed(coordinate, speed)?;
        Ok(self)
    }

    /// World pose of a body.
    #[must_use]
    pub fn pose(&self, body: BodyId) -> Pose {
        self.bodies
            .get(&body)
            .map_or_else(Pose::identity, |frame| frame.pose)
    }

    /// Motion of a body per unit speed of `coordinate`.
    #[must_use]
    pub fn jacobian_column(&self, body: BodyId, coordinate: CoordinateId) -> Twist {
        self.bodies
            .get(&body)
            .map_or_else(Twist::zero, |frame| frame.column(coordinate))
    }

    /// Body velocity assembled from the Jacobian and the generalized speeds.
    #[must_use]
    pub fn twist(&self, body: BodyId) -> Twist {
        let Some(frame) = self.bodies.get(&body) else {
            return Twist::zero();
        };

        frame
            .jacobian
            .iter()
            .zip(&self.speeds)
            .fold(Twist::zero(), |acc, (column, &u)| acc + column.scale(u))
    }

    /// Velocity of a world-space point rigidly attached to `body`.
    #[must_use]
    pub fn point_velocity(&self, body: BodyId, point: &Point3<f64>) -> Vector3<f64> {
        let offset = point - self.pose(body).position;
        self.twist(body).velocity_at_point(&offset)
    }

    /// Velocity of a world-space point on `body` per unit speed of
    /// `coordinate`.
    #[must_use]
    pub fn point_jacobian(
        &self,
        body: BodyId,
        point: &Point3<f64>,
        coordinate: CoordinateId,
    ) -> Vector3<f64> {
        let offset = point - self.pose(body).position;
        self.jacobian_column(body, coordinate)
            .velocity_at_point(&offset)
    }

    /// Bodies explicitly present in the state, in id order.
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    /// Check for `NaN` or `Inf` anywhere in the state.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.speeds.iter().all(|u| u.is_finite())
            && self.bodies.values().all(|frame| {
                frame.pose.is_finite() && frame.jacobian.iter().all(Twist::is_finite)
            })
    }
}
