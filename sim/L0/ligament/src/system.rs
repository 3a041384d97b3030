//! Host-side registration and evaluation of several ligaments.
//!
//! [`ForceRegistry`] hands out one [`ForceSlot`] per force element name.
//! [`ForceSystem`] owns a set of ligaments, configures and registers each one
//! as it is added, and sums their forces for a state into a
//! [`ForceAccumulator`].

use sim_types::MultibodyState;
use std::fmt;
use tracing::debug;

use crate::error::{LigamentError, Result};
use crate::forces::ForceAccumulator;
use crate::ligament::Ligament;
use crate::path::LigamentPath;
use crate::spatial::PointPath;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a registered force element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceSlot(usize);

impl ForceSlot {
    /// Position in registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ForceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForceSlot({})", self.0)
    }
}

/// Names of registered force elements, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceRegistry {
    names: Vec<String>,
}

impl ForceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LigamentError::Configuration`] if the name is empty or
    /// already registered.
    pub fn register(&mut self, name: &str) -> Result<ForceSlot> {
        if name.is_empty() {
            return Err(LigamentError::configuration("force element name is empty"));
        }
        if self.names.iter().any(|existing| existing == name) {
            return Err(LigamentError::configuration(format!(
                "force element '{name}' is already registered"
            )));
        }

        let slot = ForceSlot(self.names.len());
        self.names.push(name.to_owned());
        Ok(slot)
    }

    /// Name registered in `slot`.
    #[must_use]
    pub fn name(&self, slot: ForceSlot) -> Option<&str> {
        self.names.get(slot.0).map(String::as_str)
    }

    /// Slot registered for `name`.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<ForceSlot> {
        self.names.iter().position(|n| n == name).map(ForceSlot)
    }

    /// Number of registered elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A set of ligaments evaluated together.
#[derive(Debug, Clone)]
pub struct ForceSystem<P = PointPath> {
    registry: ForceRegistry,
    ligaments: Vec<Ligament<P>>,
}

impl<P: LigamentPath> Default for ForceSystem<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: LigamentPath> ForceSystem<P> {
    /// Empty system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ForceRegistry::new(),
            ligaments: Vec::new(),
        }
    }

    /// Configure, register and take ownership of a ligament.
    ///
    /// # Errors
    ///
    /// Returns the configuration or registration error; the ligament is
    /// dropped and the system is unchanged.
    pub fn add_ligament(&mut self, mut ligament: Ligament<P>) -> Result<ForceSlot> {
        ligament.connect_to_model()?;
        let slot = ligament.add_to_system(&mut self.registry)?;
        self.ligaments.push(ligament);
        Ok(slot)
    }

    /// Registry of element names.
    #[must_use]
    pub fn registry(&self) -> &ForceRegistry {
        &self.registry
    }

    /// Ligament in `slot`.
    #[must_use]
    pub fn ligament(&self, slot: ForceSlot) -> Option<&Ligament<P>> {
        self.ligaments.get(slot.0)
    }

    /// Mutable ligament in `slot`.
    pub fn ligament_mut(&mut self, slot: ForceSlot) -> Option<&mut Ligament<P>> {
        self.ligaments.get_mut(slot.0)
    }

    /// Ligament registered under `name`.
    #[must_use]
    pub fn ligament_by_name(&self, name: &str) -> Option<&Ligament<P>> {
        self.registry.slot(name).and_then(|slot| self.ligament(slot))
    }

    /// All ligaments in slot order.
    pub fn ligaments(&self) -> impl Iterator<Item = &Ligament<P>> {
        self.ligaments.iter()
    }

    /// Number of ligaments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ligaments.len()
    }

    /// Whether the system has no ligaments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ligaments.is_empty()
    }

    /// Compute and sum the forces of every ligament for `state`.
    ///
    /// # Errors
    ///
    /// Propagates the first ligament error.
    pub fn realize_dynamics(&mut self, state: &MultibodyState) -> Result<ForceAccumulator> {
        let mut accumulator = ForceAccumulator::new(state.num_coordinates());
        for ligament in &mut self.ligaments {
            accumulator.add(&ligament.realize_dynamics(state)?);
        }

        debug!(
            ligaments = self.ligaments.len(),
            revision = state.revision().raw(),
            "force system realized"
        );
        Ok(accumulator)
    }

    /// Record labels of every ligament, in slot order.
    #[must_use]
    pub fn record_labels(&self) -> Vec<String> {
        self.ligaments
            .iter()
            .flat_map(Ligament::record_labels)
            .collect()
    }

    /// Record values of every ligament, matching
    /// [`record_labels`](Self::record_labels).
    ///
    /// # Errors
    ///
    /// Propagates the first ligament error.
    pub fn record_values(&self, state: &MultibodyState) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.ligaments.len() * 4);
        for ligament in &self.ligaments {
            values.extend(ligament.record_values(state)?);
        }
        Ok(values)
    }
}
