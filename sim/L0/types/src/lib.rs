//! Host-side state types for force elements.
//!
//! This crate provides the data a multibody host hands to force elements
//! (ligaments, tendons, springs) when it realizes a state:
//!
//! - [`BodyId`] / [`CoordinateId`] - Identifiers for bodies and generalized
//!   coordinates
//! - [`Pose`] / [`Twist`] - World pose and velocity of a body
//! - [`SpatialForce`] - A force and its torque about the body origin
//! - [`MultibodyState`] - A state realized through the velocity level, with
//!   body Jacobians and a [`StateRevision`] token
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They do not integrate, solve constraints or
//! compute forces; they are the common language between the host integrator
//! and the force elements it evaluates.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use sim_types::{BodyFrame, BodyId, CoordinateId, MultibodyState, Pose, Twist};
//! use nalgebra::{Point3, Vector3};
//!
//! // One body sliding along +X, driven by coordinate 0.
//! let state = MultibodyState::new(1)
//!     .with_body(
//!         BodyId::new(1),
//!         BodyFrame::fixed(Pose::from_position(Point3::new(0.0, 0.0, 1.0)))
//!             .with_column(CoordinateId::new(0), Twist::linear(Vector3::x())),
//!     )?
//!     .with_speed(CoordinateId::new(0), 2.0)?;
//!
//! assert_eq!(state.twist(BodyId::new(1)).linear.x, 2.0);
//! # Ok::<(), sim_types::SimError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::cast_precision_loss,       // usize to f64 is fine for counts
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod coordinate;
mod error;
mod state;

pub use body::{BodyId, Pose, SpatialForce, Twist};
pub use coordinate::CoordinateId;
pub use error::SimError;
pub use state::{BodyFrame, MultibodyState, StateRevision};

// Re-export math types for convenience
pub use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, SimError>;
