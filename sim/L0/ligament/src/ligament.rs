//! The ligament force element.
//!
//! A [`Ligament`] owns a [`LigamentParameters`] set and a path that
//! implements [`LigamentPath`]. For a given [`MultibodyState`] it reads the
//! path length and lengthening speed, converts them to strain, evaluates the
//! Blankevoort–Huiskes law and hands the resulting tension back to the path,
//! which turns it into body forces.
//!
//! # Lifecycle
//!
//! ```text
//! Unconfigured --connect_to_model--> Configured --add_to_system--> Registered
//!                                                                      |
//!                                                   realize_dynamics   v
//!                                                                   Realized
//! ```
//!
//! Parameter validation happens once, in
//! [`connect_to_model`](Ligament::connect_to_model). After that every
//! evaluation is infallible apart from lifecycle misuse.
//!
//! # Caching
//!
//! The last evaluation is memoized against the state's
//! [`StateRevision`](sim_types::StateRevision). Any parameter change or path
//! mutation drops it.

use sim_types::{CoordinateId, MultibodyState};
use std::fmt;
use tracing::{debug, trace, warn};

use crate::cache::RevisionCache;
use crate::error::{LigamentError, Result};
use crate::force_law::{BlankevoortHuiskes, TensionBreakdown};
use crate::forces::ForceContributions;
use crate::params::LigamentParameters;
use crate::path::{LigamentPath, PathAppearance, PathColor, ScalablePath, ScaleSet};
use crate::spatial::PointPath;
use crate::strain::{StrainModel, StrainState};
use crate::system::{ForceRegistry, ForceSlot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a ligament is in its model lifecycle.
///
/// Stages are ordered: a later stage implies every earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LifecycleStage {
    /// Created, parameters not yet validated.
    #[default]
    Unconfigured,
    /// Parameters validated against the model.
    Configured,
    /// Attached to a force system.
    Registered,
    /// Forces computed for at least one state.
    Realized,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Registered => "registered",
            Self::Realized => "realized",
        };
        f.write_str(name)
    }
}

/// Everything one evaluation computes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LigamentOutput {
    /// Path length (m).
    pub length: f64,
    /// Path lengthening speed (m/s).
    pub lengthening_speed: f64,
    /// Strain, strain rate and force terms.
    pub breakdown: TensionBreakdown,
}

impl LigamentOutput {
    /// Clamped tension (N).
    #[must_use]
    pub fn tension(&self) -> f64 {
        self.breakdown.tension
    }

    /// Strain and strain rate.
    #[must_use]
    pub fn strain_state(&self) -> StrainState {
        StrainState::new(self.breakdown.strain, self.breakdown.strain_rate)
    }
}

/// Strain model and force law built from a validated parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ConfiguredModel {
    strain: StrainModel,
    law: BlankevoortHuiskes,
}

impl ConfiguredModel {
    fn from_parameters(params: &LigamentParameters) -> Result<Self> {
        Ok(Self {
            strain: params.strain_model()?,
            law: params.force_law(),
        })
    }
}

/// A passive ligament routed along a path.
///
/// # Example
///
/// ```
/// use sim_ligament::{Ligament, LigamentParameters, PointPath, ForceRegistry};
/// use sim_types::{BodyId, MultibodyState, Point3};
///
/// let path = PointPath::straight(
///     BodyId::GROUND,
///     Point3::origin(),
///     BodyId::GROUND,
///     Point3::new(0.053, 0.0, 0.0),
/// );
/// let params = LigamentParameters::new(1000.0, 0.06, 0.0, 0.05, 0.003);
///
/// let mut ligament = Ligament::new("mcl", path).with_parameters(params);
/// ligament.connect_to_model()?;
/// ligament.add_to_system(&mut ForceRegistry::new())?;
///
/// let state = MultibodyState::new(0);
/// ligament.realize_dynamics(&state)?;
/// assert!((ligament.tension(&state)? - 15.0).abs() < 1e-9);
/// # Ok::<(), sim_ligament::LigamentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Ligament<P = PointPath> {
    name: String,
    path: P,
    params: LigamentParameters,
    stage: LifecycleStage,
    model: Option<ConfiguredModel>,
    slot: Option<ForceSlot>,
    cache: RevisionCache<LigamentOutput>,
    pre_scale_length: Option<f64>,
}

impl<P: LigamentPath> Ligament<P> {
    /// Create an unconfigured ligament with default parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, path: P) -> Self {
        Self {
            name: name.into(),
            path,
            params: LigamentParameters::default(),
            stage: LifecycleStage::Unconfigured,
            model: None,
            slot: None,
            cache: RevisionCache::new(),
            pre_scale_length: None,
        }
    }

    /// Replace the parameter set. Checked at
    /// [`connect_to_model`](Self::connect_to_model).
    ///
    /// The ligament goes back to [`LifecycleStage::Unconfigured`] and drops
    /// its force slot; it must be connected and registered again.
    #[must_use]
    pub fn with_parameters(mut self, params: LigamentParameters) -> Self {
        self.params = params;
        self.model = None;
        self.slot = None;
        self.stage = LifecycleStage::Unconfigured;
        self.cache.invalidate();
        self
    }

    /// Enable or disable evaluation caching.
    #[must_use]
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.cache.set_enabled(enabled);
        self
    }

    /// Element name, used as the prefix of record labels.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path geometry.
    #[must_use]
    pub fn path(&self) -> &P {
        &self.path
    }

    /// Mutable path geometry. Drops any cached evaluation.
    pub fn path_mut(&mut self) -> &mut P {
        self.cache.invalidate();
        &mut self.path
    }

    /// Parameter set.
    #[must_use]
    pub fn parameters(&self) -> &LigamentParameters {
        &self.params
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    /// Slot assigned by the force system, once registered.
    #[must_use]
    pub fn slot(&self) -> Option<ForceSlot> {
        self.slot
    }

    /// Whether evaluations are memoized.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Enable or disable evaluation caching.
    pub fn set_caching(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Linear stiffness (N).
    #[must_use]
    pub fn linear_stiffness(&self) -> f64 {
        self.params.linear_stiffness()
    }

    /// Transition strain.
    #[must_use]
    pub fn ligament_transition_strain(&self) -> f64 {
        self.params.ligament_transition_strain()
    }

    /// Reference strain.
    #[must_use]
    pub fn reference_strain(&self) -> f64 {
        self.params.reference_strain()
    }

    /// Reference length (m).
    #[must_use]
    pub fn reference_length(&self) -> f64 {
        self.params.reference_length()
    }

    /// Normalized damping coefficient.
    #[must_use]
    pub fn normalized_damping_coefficient(&self) -> f64 {
        self.params.normalized_damping_coefficient()
    }

    /// Slack length (m).
    #[must_use]
    pub fn slack_length(&self) -> f64 {
        self.params.slack_length()
    }

    /// Set the linear stiffness.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::InvalidParameter`] for negative or
    /// non-finite values; the ligament is left unchanged.
    pub fn set_linear_stiffness(&mut self, value: f64) -> Result<()> {
        self.params.set_linear_stiffness(value)?;
        self.parameters_changed()
    }

    /// Set the transition strain.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::InvalidParameter`] for values ≤ 0 or
    /// non-finite; the ligament is left unchanged.
    pub fn set_ligament_transition_strain(&mut self, value: f64) -> Result<()> {
        self.params.set_ligament_transition_strain(value)?;
        self.parameters_changed()
    }

    /// Set the reference strain.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::InvalidParameter`] for values ≤ −1 or
    /// non-finite; the ligament is left unchanged.
    pub fn set_reference_strain(&mut self, value: f64) -> Result<()> {
        self.params.set_reference_strain(value)?;
        self.parameters_changed()
    }

    /// Set the reference length.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::InvalidParameter`] for values ≤ 0 or
    /// non-finite; the ligament is left unchanged.
    pub fn set_reference_length(&mut self, value: f64) -> Result<()> {
        self.params.set_reference_length(value)?;
        self.parameters_changed()
    }

    /// Set the normalized damping coefficient.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::InvalidParameter`] for negative or
    /// non-finite values; the ligament is left unchanged.
    pub fn set_normalized_damping_coefficient(&mut self, value: f64) -> Result<()> {
        self.params.set_normalized_damping_coefficient(value)?;
        self.parameters_changed()
    }

    fn parameters_changed(&mut self) -> Result<()> {
        self.cache.invalidate();
        if self.model.is_some() {
            self.model = Some(ConfiguredModel::from_parameters(&self.params)?);
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Validate the parameter set and build the strain model.
    ///
    /// Calling this again on a configured ligament revalidates without
    /// moving it back to an earlier stage.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Configuration`] if the parameters cannot
    /// describe a physical ligament. The ligament stays unconfigured.
    pub fn connect_to_model(&mut self) -> Result<()> {
        self.params.validate()?;
        let model = ConfiguredModel::from_parameters(&self.params)?;

        self.model = Some(model);
        self.cache.invalidate();
        if self.stage < LifecycleStage::Configured {
            self.stage = LifecycleStage::Configured;
        }

        debug!(
            ligament = %self.name,
            slack_length = model.strain.slack_length(),
            "ligament configured"
        );
        Ok(())
    }

    /// Attach to a force registry.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured, and [`LigamentError::Configuration`] if it is already
    /// registered or its name is taken in `registry`.
    pub fn add_to_system(&mut self, registry: &mut ForceRegistry) -> Result<ForceSlot> {
        if self.stage < LifecycleStage::Configured {
            return Err(LigamentError::lifecycle(LifecycleStage::Configured, self.stage));
        }
        if let Some(slot) = self.slot {
            return Err(LigamentError::configuration(format!(
                "ligament '{}' is already registered in slot {}",
                self.name,
                slot.index()
            )));
        }

        let slot = registry.register(&self.name)?;
        self.slot = Some(slot);
        self.stage = LifecycleStage::Registered;

        debug!(ligament = %self.name, slot = slot.index(), "ligament registered");
        Ok(slot)
    }

    /// Compute the forces for `state`.
    ///
    /// Calling this again for the same state returns bit-identical forces.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// registered.
    pub fn realize_dynamics(&mut self, state: &MultibodyState) -> Result<ForceContributions> {
        if self.stage < LifecycleStage::Registered {
            return Err(LigamentError::lifecycle(LifecycleStage::Registered, self.stage));
        }

        let output = self.evaluate(state)?;
        self.stage = LifecycleStage::Realized;
        Ok(self.path.apply_tension(state, output.tension()))
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    fn model(&self) -> Result<&ConfiguredModel> {
        self.model
            .as_ref()
            .ok_or(LigamentError::lifecycle(LifecycleStage::Configured, self.stage))
    }

    /// Length, speed, strain and tension for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn evaluate(&self, state: &MultibodyState) -> Result<LigamentOutput> {
        let model = self.model()?;
        Ok(self
            .cache
            .get_or_compute(state.revision(), || self.compute(model, state)))
    }

    fn compute(&self, model: &ConfiguredModel, state: &MultibodyState) -> LigamentOutput {
        let length = self.path.length(state);
        let lengthening_speed = self.path.lengthening_speed(state);

        if !length.is_finite() || !lengthening_speed.is_finite() {
            warn!(
                ligament = %self.name,
                length,
                lengthening_speed,
                "non-finite path kinematics"
            );
        }

        let breakdown = model
            .law
            .evaluate(model.strain.evaluate(length, lengthening_speed));

        trace!(
            ligament = %self.name,
            revision = state.revision().raw(),
            strain = breakdown.strain,
            tension = breakdown.tension,
            "ligament evaluated"
        );

        LigamentOutput {
            length,
            lengthening_speed,
            breakdown,
        }
    }

    /// Path length (m).
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn length(&self, state: &MultibodyState) -> Result<f64> {
        Ok(self.evaluate(state)?.length)
    }

    /// Path lengthening speed (m/s).
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn lengthening_speed(&self, state: &MultibodyState) -> Result<f64> {
        Ok(self.evaluate(state)?.lengthening_speed)
    }

    /// Strain and strain rate.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn strain_state(&self, state: &MultibodyState) -> Result<StrainState> {
        Ok(self.evaluate(state)?.strain_state())
    }

    /// Tension (N), never negative.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn tension(&self, state: &MultibodyState) -> Result<f64> {
        Ok(self.evaluate(state)?.tension())
    }

    /// Every force-law term.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn breakdown(&self, state: &MultibodyState) -> Result<TensionBreakdown> {
        Ok(self.evaluate(state)?.breakdown)
    }

    /// Derivative of path length with respect to `coordinate` (m/rad or
    /// m/m).
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured, or a state error for an unknown coordinate.
    pub fn compute_moment_arm(
        &self,
        state: &MultibodyState,
        coordinate: CoordinateId,
    ) -> Result<f64> {
        self.model()?;
        self.path.moment_arm(state, coordinate)
    }

    /// Generalized force the tension exerts on `coordinate`: `-F · r`.
    ///
    /// # Errors
    ///
    /// Same as [`compute_moment_arm`](Self::compute_moment_arm).
    pub fn generalized_force(
        &self,
        state: &MultibodyState,
        coordinate: CoordinateId,
    ) -> Result<f64> {
        let tension = self.tension(state)?;
        let moment_arm = self.compute_moment_arm(state, coordinate)?;
        Ok(-tension * moment_arm)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Labels for [`record_values`](Self::record_values), in the same order.
    #[must_use]
    pub fn record_labels(&self) -> Vec<String> {
        ["tension", "length", "lengthening_speed", "strain"]
            .iter()
            .map(|quantity| format!("{}.{quantity}", self.name))
            .collect()
    }

    /// Tension, length, lengthening speed and strain for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn record_values(&self, state: &MultibodyState) -> Result<Vec<f64>> {
        let output = self.evaluate(state)?;
        Ok(vec![
            output.tension(),
            output.length,
            output.lengthening_speed,
            output.breakdown.strain,
        ])
    }

    // =========================================================================
    // Scaling
    // =========================================================================

    /// Remember the path length before the model is scaled.
    pub fn pre_scale(&mut self, state: &MultibodyState) {
        let length = self.path.length(state);
        self.pre_scale_length = Some(length);
        debug!(ligament = %self.name, length, "pre-scale path length");
    }

    /// Rescale the reference length by the ratio of the path length now to
    /// the one recorded by [`pre_scale`](Self::pre_scale).
    ///
    /// Without a preceding `pre_scale` this does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::InvalidParameter`] if the scaled reference
    /// length is not finite and positive; the parameters are left unchanged.
    pub fn post_scale(&mut self, state: &MultibodyState) -> Result<()> {
        let Some(before) = self.pre_scale_length.take() else {
            return Ok(());
        };

        let after = self.path.length(state);
        let reference_length = self.params.reference_length() * after / before;
        self.set_reference_length(reference_length)?;

        debug!(
            ligament = %self.name,
            before,
            after,
            reference_length,
            "post-scale reference length"
        );
        Ok(())
    }
}

impl<P: LigamentPath + ScalablePath> Ligament<P> {
    /// Scale the path geometry.
    pub fn scale(&mut self, scale_set: &ScaleSet) {
        self.path.scale(scale_set);
        self.cache.invalidate();
    }
}

impl<P: LigamentPath + PathAppearance> Ligament<P> {
    /// Display color for `state`: [`PathColor::SLACK`] when slack, blending
    /// to [`PathColor::TAUT`] at the start of the linear region.
    ///
    /// `None` when the strain is not finite.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn compute_path_color(&self, state: &MultibodyState) -> Result<Option<PathColor>> {
        let strain = self.evaluate(state)?.breakdown.strain;
        if !strain.is_finite() {
            return Ok(None);
        }

        let onset = 2.0 * self.params.ligament_transition_strain();
        Ok(Some(PathColor::SLACK.lerp(&PathColor::TAUT, strain / onset)))
    }

    /// Recolor the path for `state`. Leaves the color alone when it cannot
    /// be computed.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Lifecycle`] if the ligament is not
    /// configured.
    pub fn update_display(&mut self, state: &MultibodyState) -> Result<()> {
        if let Some(color) = self.compute_path_color(state)? {
            self.path.set_color(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use sim_types::{BodyFrame, BodyId, Pose, Twist};

    const SLIDER: CoordinateId = CoordinateId(0);

    /// Body 1 sliding along +X with its origin at `x`.
    fn slider_state(x: f64, rate: f64) -> MultibodyState {
        MultibodyState::new(1)
            .with_body(
                BodyId::new(1),
                BodyFrame::fixed(Pose::from_position(Point3::new(x, 0.0, 0.0)))
                    .with_column(SLIDER, Twist::linear(Vector3::x())),
            )
            .unwrap()
            .with_speed(SLIDER, rate)
            .unwrap()
    }

    fn scenario_ligament() -> Ligament {
        let path = PointPath::straight(
            BodyId::GROUND,
            Point3::origin(),
            BodyId::new(1),
            Point3::origin(),
        );
        Ligament::new("acl", path)
            .with_parameters(LigamentParameters::new(1000.0, 0.06, 0.0, 0.05, 0.003))
    }

    fn registered() -> Ligament {
        let mut ligament = scenario_ligament();
        ligament.connect_to_model().unwrap();
        ligament.add_to_system(&mut ForceRegistry::new()).unwrap();
        ligament
    }

    #[test]
    fn test_stage_order_and_display() {
        assert!(LifecycleStage::Unconfigured < LifecycleStage::Configured);
        assert!(LifecycleStage::Registered < LifecycleStage::Realized);
        assert_eq!(LifecycleStage::Realized.to_string(), "realized");
    }

    #[test]
    fn test_queries_require_configuration() {
        let ligament = scenario_ligament();
        let state = slider_state(0.053, 0.0);

        let err = ligament.tension(&state).unwrap_err();
        assert_eq!(
            err,
            LigamentError::lifecycle(LifecycleStage::Configured, LifecycleStage::Unconfigured)
        );
        assert!(ligament.compute_moment_arm(&state, SLIDER).is_err());
        assert!(ligament.record_values(&state).is_err());
    }

    #[test]
    fn test_registration_requires_configuration() {
        let mut ligament = scenario_ligament();
        let mut registry = ForceRegistry::new();

        let err = ligament.add_to_system(&mut registry).unwrap_err();
        assert!(matches!(err, LigamentError::Lifecycle { .. }));
        assert!(registry.is_empty());

        ligament.connect_to_model().unwrap();
        let slot = ligament.add_to_system(&mut registry).unwrap();
        assert_eq!(ligament.slot(), Some(slot));
        assert_eq!(ligament.stage(), LifecycleStage::Registered);

        assert!(
            ligament
                .add_to_system(&mut registry)
                .unwrap_err()
                .is_configuration_error()
        );
    }

    #[test]
    fn test_new_parameters_detach_from_system() {
        let ligament = registered()
            .with_parameters(LigamentParameters::new(2000.0, 0.06, 0.0, 0.05, 0.003));
        assert_eq!(ligament.stage(), LifecycleStage::Unconfigured);
        assert_eq!(ligament.slot(), None);

        let mut ligament = ligament;
        ligament.connect_to_model().unwrap();
        let mut registry = ForceRegistry::new();
        let slot = ligament.add_to_system(&mut registry).unwrap();
        assert_eq!(ligament.slot(), Some(slot));

        let forces = ligament.realize_dynamics(&slider_state(0.056, 0.0)).unwrap();
        assert_relative_eq!(forces.wrench_on(BodyId::new(1)).force.x, -120.0, epsilon = 1e-9);
        assert_eq!(ligament.stage(), LifecycleStage::Realized);
    }

    #[test]
    fn test_realize_requires_registration() {
        let mut ligament = scenario_ligament();
        ligament.connect_to_model().unwrap();

        let err = ligament.realize_dynamics(&slider_state(0.06, 0.0)).unwrap_err();
        assert_eq!(
            err,
            LigamentError::lifecycle(LifecycleStage::Registered, LifecycleStage::Configured)
        );
    }

    #[test]
    fn test_invalid_parameters_fail_at_connect() {
        let mut ligament = scenario_ligament().with_parameters(
            LigamentParameters::new(1000.0, 0.06, -1.0, 0.05, 0.003),
        );

        let err = ligament.connect_to_model().unwrap_err();
        assert!(err.is_configuration_error());
        assert_eq!(ligament.stage(), LifecycleStage::Unconfigured);
    }

    #[test]
    fn test_scenario_tensions() {
        let ligament = registered();

        let cases = [
            (0.053, 0.0, 15.0),
            (0.056, 0.0, 60.0),
            (0.06, 0.001, 140.06),
            (0.04, 0.0, 0.0),
        ];
        for (length, speed, expected) in cases {
            let state = slider_state(length, speed);
            assert_relative_eq!(ligament.length(&state).unwrap(), length, epsilon = 1e-15);
            assert_relative_eq!(ligament.tension(&state).unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_realize_is_idempotent() {
        let mut ligament = registered();
        let state = slider_state(0.06, 0.001);

        let first = ligament.realize_dynamics(&state).unwrap();
        let second = ligament.realize_dynamics(&state).unwrap();
        assert_eq!(first, second);
        assert_eq!(ligament.stage(), LifecycleStage::Realized);

        // Tension pulls the slider back toward the origin.
        let on_slider = first.wrench_on(BodyId::new(1)).force;
        assert_relative_eq!(on_slider.x, -140.06, epsilon = 1e-9);
    }

    #[test]
    fn test_cache_does_not_change_results() {
        let cached = registered();
        let uncached = registered().with_caching(false);
        assert!(!uncached.is_caching());

        for (x, v) in [(0.055, 0.002), (0.058, -0.004), (0.045, 0.01)] {
            let state = slider_state(x, v);
            let a = cached.evaluate(&state).unwrap();
            let b = uncached.evaluate(&state).unwrap();
            assert_eq!(a, b);
            assert_eq!(cached.evaluate(&state).unwrap(), a);
        }
    }

    #[test]
    fn test_setter_invalidates_cache_and_keeps_stage() {
        let mut ligament = registered();
        let state = slider_state(0.056, 0.0);
        assert_relative_eq!(ligament.tension(&state).unwrap(), 60.0, epsilon = 1e-9);

        ligament.set_linear_stiffness(2000.0).unwrap();
        assert_eq!(ligament.stage(), LifecycleStage::Registered);
        assert_relative_eq!(ligament.tension(&state).unwrap(), 120.0, epsilon = 1e-9);

        ligament.set_reference_length(0.056).unwrap();
        assert_relative_eq!(ligament.tension(&state).unwrap(), 0.0);

        assert!(ligament.set_reference_length(-1.0).is_err());
        assert_relative_eq!(ligament.reference_length(), 0.056);
    }

    #[test]
    fn test_generalized_force_matches_projection() {
        let mut ligament = registered();
        let state = slider_state(0.058, 0.003);

        let arm = ligament.compute_moment_arm(&state, SLIDER).unwrap();
        assert_relative_eq!(arm, 1.0, epsilon = 1e-12);

        let expected = ligament.generalized_force(&state, SLIDER).unwrap();
        let projected = ligament.realize_dynamics(&state).unwrap().generalized_forces(&state);
        assert_relative_eq!(projected[0], expected, epsilon = 1e-9);
        assert!(expected < 0.0);
    }

    #[test]
    fn test_record_labels_and_values() {
        let ligament = registered();
        assert_eq!(
            ligament.record_labels(),
            vec![
                "acl.tension",
                "acl.length",
                "acl.lengthening_speed",
                "acl.strain"
            ]
        );

        let values = ligament.record_values(&slider_state(0.06, 0.001)).unwrap();
        assert_eq!(values.len(), 4);
        assert_relative_eq!(values[0], 140.06, epsilon = 1e-9);
        assert_relative_eq!(values[1], 0.06, epsilon = 1e-15);
        assert_relative_eq!(values[2], 0.001, epsilon = 1e-15);
        assert_relative_eq!(values[3], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_kinematics_propagate() {
        let ligament = registered();
        let state = slider_state(f64::NAN, 0.0);
        assert!(ligament.tension(&state).unwrap().is_nan());
    }

    #[test]
    fn test_scaling_rescales_reference_length() {
        let path = PointPath::straight(
            BodyId::GROUND,
            Point3::origin(),
            BodyId::new(1),
            Point3::new(0.025, 0.0, 0.0),
        );
        let mut ligament = Ligament::new("pcl", path)
            .with_parameters(LigamentParameters::blankevoort(1000.0, 0.05));
        ligament.connect_to_model().unwrap();

        let state = slider_state(0.025, 0.0);
        assert_relative_eq!(ligament.length(&state).unwrap(), 0.05, epsilon = 1e-15);

        ligament.pre_scale(&state);
        ligament.scale(&ScaleSet::new().with_uniform(BodyId::new(1), 2.0));
        ligament.post_scale(&state).unwrap();

        // 0.025 + 2 * 0.025 = 0.075, so the reference length grows by 1.5.
        assert_relative_eq!(ligament.length(&state).unwrap(), 0.075, epsilon = 1e-15);
        assert_relative_eq!(ligament.reference_length(), 0.075, epsilon = 1e-12);
        assert_relative_eq!(ligament.tension(&state).unwrap(), 0.0, epsilon = 1e-9);

        // Without a matching pre_scale nothing changes.
        ligament.post_scale(&slider_state(0.3, 0.0)).unwrap();
        assert_relative_eq!(ligament.reference_length(), 0.075, epsilon = 1e-12);
    }

    #[test]
    fn test_display_color_follows_strain() {
        let mut ligament = registered();

        ligament.update_display(&slider_state(0.04, 0.0)).unwrap();
        assert_eq!(ligament.path().color(), PathColor::SLACK);

        ligament.update_display(&slider_state(0.06, 0.0)).unwrap();
        let taut = ligament.path().color();
        assert_relative_eq!(taut.r, PathColor::TAUT.r, epsilon = 1e-12);
        assert_relative_eq!(taut.b, PathColor::TAUT.b, epsilon = 1e-12);

        // Non-finite strain leaves the color alone.
        ligament.update_display(&slider_state(f64::NAN, 0.0)).unwrap();
        assert_eq!(ligament.path().color(), taut);
    }
}
