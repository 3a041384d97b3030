//! Straight-segment path through attachment points.
//!
//! A [`PointPath`] runs from an origin attachment, through zero or more via
//! points, to an insertion attachment. Each attachment is fixed in the local
//! frame of a body. The length is the sum of the straight segment lengths:
//!
//! ```text
//! L = Σᵢ ||pᵢ₊₁ - pᵢ||
//! ```
//!
//! # Length Gradients
//!
//! Everything else follows from the gradient of `L` with respect to each
//! world-space point. With `dᵢ` the unit direction of segment `i`:
//!
//! ```text
//! ∂L/∂p₀     = -d₀                 (origin)
//! ∂L/∂pᵢ     = dᵢ₋₁ - dᵢ          (via point)
//! ∂L/∂pₙ     = dₙ₋₁                (insertion)
//! ```
//!
//! - lengthening speed: `Σᵢ ∂L/∂pᵢ · vᵢ`
//! - moment arm: `Σᵢ ∂L/∂pᵢ · Jᵢ,c`
//! - force at point `i` for tension `F`: `-F · ∂L/∂pᵢ`
//!
//! so the origin is pulled toward the next point, the insertion toward the
//! previous one, and the generalized force equals `-F · moment_arm` exactly.

use nalgebra::{Point3, Vector3};
use sim_types::{BodyId, CoordinateId, MultibodyState, Pose};

use crate::error::Result;
use crate::forces::{BodyForce, ForceContributions};
use crate::path::{LigamentPath, PathAppearance, PathColor, ScalablePath, ScaleSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Segments shorter than this have no defined direction.
const MIN_SEGMENT_LENGTH: f64 = 1e-10;

/// A point fixed on a body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttachmentPoint {
    /// The body this point is attached to.
    pub body: BodyId,

    /// Position in the body's local frame.
    pub local_position: Point3<f64>,
}

impl AttachmentPoint {
    /// Create a new attachment point.
    #[must_use]
    pub fn new(body: BodyId, local_position: Point3<f64>) -> Self {
        Self {
            body,
            local_position,
        }
    }

    /// Create an attachment point at the body origin.
    #[must_use]
    pub fn at_origin(body: BodyId) -> Self {
        Self::new(body, Point3::origin())
    }

    /// Transform the point to world coordinates.
    #[must_use]
    pub fn world_position(&self, body_pose: &Pose) -> Point3<f64> {
        body_pose.transform_point(&self.local_position)
    }
}

/// World-space geometry of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentGeometry {
    /// Start point.
    pub start: Point3<f64>,
    /// End point.
    pub end: Point3<f64>,
    /// Segment length.
    pub length: f64,
    /// Unit direction from start to end (zero for a degenerate segment).
    pub direction: Vector3<f64>,
}

impl SegmentGeometry {
    fn between(start: Point3<f64>, end: Point3<f64>) -> Self {
        let delta = end - start;
        let length = delta.norm();

        // A NaN length keeps a NaN direction so the speed stays NaN too.
        let direction = if length > MIN_SEGMENT_LENGTH || length.is_nan() {
            delta / length
        } else {
            Vector3::zeros()
        };

        Self {
            start,
            end,
            length,
            direction,
        }
    }
}

/// A ligament path of straight segments between attachment points.
///
/// # Example
///
/// ```
/// use sim_ligament::{AttachmentPoint, LigamentPath, PointPath};
/// use sim_types::{BodyId, MultibodyState};
/// use nalgebra::Point3;
///
/// let path = PointPath::straight(
///     BodyId::GROUND,
///     Point3::origin(),
///     BodyId::new(1),
///     Point3::new(0.0, 0.0, -0.05),
/// )
/// .with_via_point(AttachmentPoint::new(BodyId::new(1), Point3::new(0.01, 0.0, 0.0)));
///
/// assert_eq!(path.num_segments(), 2);
/// assert!(path.length(&MultibodyState::new(0)) > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointPath {
    /// The origin attachment point.
    pub origin: AttachmentPoint,

    /// Intermediate via points.
    pub via_points: Vec<AttachmentPoint>,

    /// The insertion attachment point.
    pub insertion: AttachmentPoint,

    color: PathColor,
}

impl PointPath {
    /// Create a new path from origin to insertion.
    #[must_use]
    pub fn new(origin: AttachmentPoint, insertion: AttachmentPoint) -> Self {
        Self {
            origin,
            via_points: Vec::new(),
            insertion,
            color: PathColor::SLACK,
        }
    }

    /// Create a single-segment path between two bodies.
    #[must_use]
    pub fn straight(
        origin_body: BodyId,
        origin_pos: Point3<f64>,
        insertion_body: BodyId,
        insertion_pos: Point3<f64>,
    ) -> Self {
        Self::new(
            AttachmentPoint::new(origin_body, origin_pos),
            AttachmentPoint::new(insertion_body, insertion_pos),
        )
    }

    /// Add a via point to the path.
    #[must_use]
    pub fn with_via_point(mut self, via_point: AttachmentPoint) -> Self {
        self.via_points.push(via_point);
        self
    }

    /// Add multiple via points to the path.
    #[must_use]
    pub fn with_via_points(
        mut self,
        via_points: impl IntoIterator<Item = AttachmentPoint>,
    ) -> Self {
        self.via_points.extend(via_points);
        self
    }

    /// Get the total number of points in the path.
    #[must_use]
    pub fn num_points(&self) -> usize {
        2 + self.via_points.len()
    }

    /// Get the number of segments in the path.
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.num_points() - 1
    }

    /// Get a point by index.
    ///
    /// Index 0 is origin, indices 1..n-1 are via points, index n-1 is
    /// insertion.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<&AttachmentPoint> {
        let n = self.num_points();
        if index >= n {
            return None;
        }

        if index == 0 {
            Some(&self.origin)
        } else if index == n - 1 {
            Some(&self.insertion)
        } else {
            self.via_points.get(index - 1)
        }
    }

    /// All attachment points in path order.
    pub fn points(&self) -> impl Iterator<Item = &AttachmentPoint> {
        std::iter::once(&self.origin)
            .chain(&self.via_points)
            .chain(std::iter::once(&self.insertion))
    }

    /// World positions of all points for a state.
    #[must_use]
    pub fn world_points(&self, state: &MultibodyState) -> Vec<Point3<f64>> {
        self.points()
            .map(|p| p.world_position(&state.pose(p.body)))
            .collect()
    }

    /// World-space segments for a state.
    #[must_use]
    pub fn segments(&self, state: &MultibodyState) -> Vec<SegmentGeometry> {
        Self::segments_through(&self.world_points(state))
    }

    fn segments_through(points: &[Point3<f64>]) -> Vec<SegmentGeometry> {
        points
            .windows(2)
            .map(|pair| SegmentGeometry::between(pair[0], pair[1]))
            .collect()
    }

    /// Gradient of the path length with respect to each world point.
    fn length_gradients(segments: &[SegmentGeometry]) -> Vec<Vector3<f64>> {
        let mut gradients = vec![Vector3::zeros(); segments.len() + 1];

        for (i, segment) in segments.iter().enumerate() {
            gradients[i] -= segment.direction;
            gradients[i + 1] += segment.direction;
        }

        gradients
    }

    /// World points, their length gradients and their bodies, in path order.
    fn point_gradients(
        &self,
        state: &MultibodyState,
    ) -> impl Iterator<Item = (BodyId, Point3<f64>, Vector3<f64>)> + '_ {
        let positions = self.world_points(state);
        let gradients = Self::length_gradients(&Self::segments_through(&positions));

        self.points()
            .zip(positions)
            .zip(gradients)
            .map(|((p, position), gradient)| (p.body, position, gradient))
    }
}

impl LigamentPath for PointPath {
    fn length(&self, state: &MultibodyState) -> f64 {
        self.segments(state).iter().map(|s| s.length).sum()
    }

    fn lengthening_speed(&self, state: &MultibodyState) -> f64 {
        self.point_gradients(state)
            .map(|(body, position, gradient)| gradient.dot(&state.point_velocity(body, &position)))
            .sum()
    }

    fn moment_arm(&self, state: &MultibodyState, coordinate: CoordinateId) -> Result<f64> {
        state.check_coordinate(coordinate)?;

        Ok(self
            .point_gradients(state)
            .map(|(body, position, gradient)| {
                gradient.dot(&state.point_jacobian(body, &position, coordinate))
            })
            .sum())
    }

    fn apply_tension(&self, state: &MultibodyState, tension: f64) -> ForceContributions {
        let mut contributions = ForceContributions::new();
        if tension.abs() < f64::MIN_POSITIVE {
            return contributions;
        }

        for (body, position, gradient) in self.point_gradients(state) {
            contributions.push(BodyForce::at_point(
                body,
                position,
                &state.pose(body).position,
                -tension * gradient,
            ));
        }

        contributions
    }

    fn bodies(&self) -> Vec<BodyId> {
        let mut bodies = Vec::with_capacity(self.num_points());
        for point in self.points() {
            if !bodies.contains(&point.body) {
                bodies.push(point.body);
            }
        }
        bodies
    }
}

impl PathAppearance for PointPath {
    fn set_color(&mut self, color: PathColor) {
        self.color = color;
    }

    fn color(&self) -> PathColor {
        self.color
    }
}

impl ScalablePath for PointPath {
    fn scale(&mut self, scale_set: &ScaleSet) {
        let scale_point = |point: &mut AttachmentPoint| {
            if let Some(factors) = scale_set.factors(point.body) {
                point.local_position =
                    Point3::from(point.local_position.coords.component_mul(factors));
            }
        };

        scale_point(&mut self.origin);
        self.via_points.iter_mut().for_each(&scale_point);
        scale_point(&mut self.insertion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use sim_types::{BodyFrame, Twist};

    const HINGE: CoordinateId = CoordinateId(0);

    /// Body 1 on a hinge about +Z through the world origin.
    fn hinge_state(angle: f64, rate: f64) -> MultibodyState {
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
        );
        MultibodyState::new(1)
            .with_body(
                BodyId::new(1),
                BodyFrame::fixed(pose).with_column(HINGE, Twist::angular(Vector3::z())),
            )
            .unwrap()
            .with_speed(HINGE, rate)
            .unwrap()
    }

    /// Body 1 sliding along +X, origin at `x`.
    fn slider_state(x: f64, rate: f64) -> MultibodyState {
        MultibodyState::new(1)
            .with_body(
                BodyId::new(1),
                BodyFrame::fixed(Pose::from_position(Point3::new(x, 0.0, 0.0)))
                    .with_column(CoordinateId::new(0), Twist::linear(Vector3::x())),
            )
            .unwrap()
            .with_speed(CoordinateId::new(0), rate)
            .unwrap()
    }

    fn hinge_path() -> PointPath {
        PointPath::straight(
            BodyId::GROUND,
            Point3::new(-0.1, 0.05, 0.0),
            BodyId::new(1),
            Point3::new(0.2, 0.03, 0.0),
        )
    }

    #[test]
    fn test_attachment_point() {
        let point = AttachmentPoint::new(BodyId::new(0), Point3::new(1.0, 0.0, 0.0));
        let world = point.world_position(&Pose::from_position(Point3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(world.x, 11.0, epsilon = 1e-10);
    }

    #[test]
    fn test_straight_path_length() {
        let path = PointPath::straight(
            BodyId::GROUND,
            Point3::origin(),
            BodyId::new(1),
            Point3::origin(),
        );
        assert_relative_eq!(path.length(&slider_state(1.0, 0.0)), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_path_with_via_point() {
        let path = PointPath::straight(
            BodyId::new(0),
            Point3::new(0.0, 0.0, 0.0),
            BodyId::new(2),
            Point3::new(2.0, 0.0, 0.0),
        )
        .with_via_point(AttachmentPoint::new(BodyId::new(1), Point3::new(1.0, 1.0, 0.0)));

        // sqrt(2) + sqrt(2)
        let length = path.length(&MultibodyState::new(0));
        assert_relative_eq!(length, 2.0 * std::f64::consts::SQRT_2, epsilon = 1e-10);
        assert_eq!(path.num_points(), 3);
        assert_eq!(path.point(1).map(|p| p.body), Some(BodyId::new(1)));
        assert!(path.point(3).is_none());
    }

    #[test]
    fn test_point_gradients_follow_posed_points() {
        let path = hinge_path()
            .with_via_point(AttachmentPoint::new(BodyId::GROUND, Point3::new(0.05, 0.1, 0.0)));
        let state = hinge_state(0.4, 0.0);

        let world = path.world_points(&state);
        let segments = path.segments(&state);
        let gradients: Vec<_> = path.point_gradients(&state).collect();
        assert_eq!(gradients.len(), world.len());

        for ((body, position, _), (point, expected)) in
            gradients.iter().zip(path.points().zip(&world))
        {
            assert_eq!(*body, point.body);
            assert_relative_eq!(*position, *expected, epsilon = 1e-15);
        }

        // Each endpoint is pulled along its own segment only.
        assert_relative_eq!(gradients[0].2, -segments[0].direction, epsilon = 1e-12);
        assert_relative_eq!(gradients[2].2, segments[1].direction, epsilon = 1e-12);

        let total = gradients
            .iter()
            .fold(Vector3::zeros(), |acc, (_, _, gradient)| acc + gradient);
        assert_relative_eq!(total.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_path_velocity_stationary() {
        let path = hinge_path();
        assert_relative_eq!(path.lengthening_speed(&hinge_state(0.3, 0.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_path_velocity_stretching() {
        let path = PointPath::straight(
            BodyId::GROUND,
            Point3::origin(),
            BodyId::new(1),
            Point3::origin(),
        );

        // Insertion moving away at 1 m/s
        let speed = path.lengthening_speed(&slider_state(1.0, 1.0));
        assert_relative_eq!(speed, 1.0, epsilon = 1e-10);

        let speed = path.lengthening_speed(&slider_state(1.0, -0.25));
        assert_relative_eq!(speed, -0.25, epsilon = 1e-10);
    }

    #[test]
    fn test_moment_arm_matches_length_derivative() {
        let path = hinge_path();
        let h = 1e-6;

        for angle in [-0.8, -0.2, 0.0, 0.4, 1.1] {
            let analytic = path.moment_arm(&hinge_state(angle, 0.0), HINGE).unwrap();
            let numeric = (path.length(&hinge_state(angle + h, 0.0))
                - path.length(&hinge_state(angle - h, 0.0)))
                / (2.0 * h);
            assert_relative_eq!(analytic, numeric, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_speed_is_moment_arm_times_rate() {
        let path = hinge_path();
        let state = hinge_state(0.4, 2.5);

        let arm = path.moment_arm(&state, HINGE).unwrap();
        assert_relative_eq!(path.lengthening_speed(&state), arm * 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_moment_arm_unknown_coordinate() {
        let path = hinge_path();
        assert!(path.moment_arm(&hinge_state(0.0, 0.0), CoordinateId::new(4)).is_err());
    }

    #[test]
    fn test_forces_pull_endpoints_together() {
        let path = PointPath::straight(
            BodyId::GROUND,
            Point3::origin(),
            BodyId::new(1),
            Point3::origin(),
        );
        let state = slider_state(1.0, 0.0);
        let forces = path.apply_tension(&state, 100.0);

        assert_eq!(forces.len(), 2);
        let origin = forces.forces()[0];
        let insertion = forces.forces()[1];

        // Origin pulled toward +X, insertion pulled back toward -X.
        assert_relative_eq!(origin.wrench.force, Vector3::new(100.0, 0.0, 0.0), epsilon = 1e-10);
        assert_relative_eq!(
            insertion.wrench.force,
            Vector3::new(-100.0, 0.0, 0.0),
            epsilon = 1e-10
        );
        assert_relative_eq!(forces.net_force().norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_via_point_force_is_sum_of_segment_pulls() {
        let path = PointPath::straight(
            BodyId::new(0),
            Point3::new(0.0, 0.0, 0.0),
            BodyId::new(2),
            Point3::new(2.0, 0.0, 0.0),
        )
        .with_via_point(AttachmentPoint::new(
            BodyId::new(1),
            Point3::new(1.0, 1.0, 0.0),
        ));

        let forces = path.apply_tension(&MultibodyState::new(0), 10.0);
        let via = forces.wrench_on(BodyId::new(1)).force;

        // Pulled toward both neighbours: (-1,-1) and (1,-1), each scaled by 10/√2.
        assert_relative_eq!(
            via,
            Vector3::new(0.0, -20.0 / std::f64::consts::SQRT_2, 0.0),
            epsilon = 1e-10
        );
        assert_relative_eq!(forces.net_force().norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_generalized_force_is_negative_tension_times_moment_arm() {
        let path = hinge_path();
        let state = hinge_state(0.6, 0.0);
        let tension = 42.0;

        let arm = path.moment_arm(&state, HINGE).unwrap();
        let tau = path.apply_tension(&state, tension).generalized_forces(&state);
        assert_relative_eq!(tau[0], -tension * arm, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_tension_applies_nothing() {
        let path = hinge_path();
        assert!(path.apply_tension(&hinge_state(0.0, 0.0), 0.0).is_empty());
    }

    #[test]
    fn test_nan_propagates() {
        let path = hinge_path();
        let pose = Pose::from_position(Point3::new(f64::NAN, 0.0, 0.0));
        let state = MultibodyState::new(1)
            .with_body(
                BodyId::new(1),
                BodyFrame::fixed(pose).with_column(HINGE, Twist::angular(Vector3::z())),
            )
            .unwrap()
            .with_speed(HINGE, 1.0)
            .unwrap();

        assert!(path.length(&state).is_nan());
        assert!(path.lengthening_speed(&state).is_nan());
    }

    #[test]
    fn test_bodies() {
        let path = hinge_path().with_via_point(AttachmentPoint::at_origin(BodyId::new(1)));

        let bodies = path.bodies();
        assert_eq!(bodies, vec![BodyId::GROUND, BodyId::new(1)]);
    }

    #[test]
    fn test_scaling_moves_attachments() {
        let mut path = hinge_path();
        path.scale(&ScaleSet::new().with_uniform(BodyId::new(1), 2.0));

        assert_relative_eq!(
            path.insertion.local_position,
            Point3::new(0.4, 0.06, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            path.origin.local_position,
            Point3::new(-0.1, 0.05, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_color_capability() {
        let mut path = hinge_path();
        assert_eq!(path.color(), PathColor::SLACK);
        path.set_color(PathColor::TAUT);
        assert_eq!(path.color(), PathColor::TAUT);
    }
}
