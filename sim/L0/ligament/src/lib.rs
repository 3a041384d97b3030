//! Passive ligament force element for multibody simulation.
//!
//! A ligament is a tension-only spring routed along a path between bodies.
//! This crate models it with the Blankevoort–Huiskes law: a quadratic toe
//! region that stiffens into a linear region, plus damping proportional to
//! strain rate.
//!
//! ```text
//!   F
//!   │                      ╱
//!   │                    ╱   slope k
//!   │                  ╱
//!   │              ╱‾‾
//!   │          .·‾        quadratic toe
//!   │ ____.·‾
//!   └──────┴─────────┴─────────── ε
//!          0        2εₜ
//! ```
//!
//! # Evaluation
//!
//! For a state, a [`Ligament`] computes
//!
//! 1. path length `L` and lengthening speed `v` from its [`LigamentPath`],
//! 2. strain `ε = (L - L_slack) / L_slack` and strain rate `v / L_slack`,
//! 3. tension from the [`BlankevoortHuiskes`] law,
//! 4. body forces along the path as a [`ForceContributions`] value.
//!
//! The host sums contributions from every element in a [`ForceAccumulator`],
//! or lets a [`ForceSystem`] do it.
//!
//! # Paths
//!
//! [`PointPath`] routes straight segments through body-fixed attachment
//! points. Any other routing can be plugged in by implementing
//! [`LigamentPath`], and optionally [`PathAppearance`] and [`ScalablePath`].
//!
//! # Quick Start
//!
//! ```
//! use sim_ligament::{ForceSystem, Ligament, LigamentParameters, PointPath};
//! use sim_types::{BodyFrame, BodyId, CoordinateId, MultibodyState, Point3, Pose, Twist, Vector3};
//!
//! // Tibia (body 1) translating along X; ligament from the femur (ground).
//! let path = PointPath::straight(
//!     BodyId::GROUND,
//!     Point3::origin(),
//!     BodyId::new(1),
//!     Point3::origin(),
//! );
//! let ligament = Ligament::new("acl", path)
//!     .with_parameters(LigamentParameters::blankevoort(1000.0, 0.05));
//!
//! let mut system = ForceSystem::new();
//! system.add_ligament(ligament)?;
//!
//! let state = MultibodyState::new(1)
//!     .with_body(
//!         BodyId::new(1),
//!         BodyFrame::fixed(Pose::from_position(Point3::new(0.056, 0.0, 0.0)))
//!             .with_column(CoordinateId::new(0), Twist::linear(Vector3::x())),
//!     )?;
//!
//! let forces = system.realize_dynamics(&state)?;
//! let tau = forces.total_generalized(&state);
//! assert!((tau[0] + 60.0).abs() < 1e-9);
//! # Ok::<(), sim_ligament::LigamentError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Logging goes
//! through `tracing`; the host installs the subscriber.

#![doc(html_root_url = "https://docs.rs/sim-ligament/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::or_fun_call
)]
#![cfg_attr(test, allow(clippy::float_cmp, clippy::unwrap_used))]

pub mod cache;
pub mod error;
pub mod force_law;
pub mod forces;
pub mod ligament;
pub mod params;
pub mod path;
pub mod spatial;
pub mod strain;
pub mod system;

// Re-export main types at crate root
pub use cache::RevisionCache;
pub use error::{LigamentError, Result};
pub use force_law::{BlankevoortHuiskes, TensionBreakdown};
pub use forces::{BodyForce, ForceAccumulator, ForceContributions};
pub use ligament::{LifecycleStage, Ligament, LigamentOutput};
pub use params::{DEFAULT_NORMALIZED_DAMPING, DEFAULT_TRANSITION_STRAIN, LigamentParameters};
pub use path::{LigamentPath, PathAppearance, PathColor, ScalablePath, ScaleSet};
pub use spatial::{AttachmentPoint, PointPath, SegmentGeometry};
pub use strain::{StrainModel, StrainState};
pub use system::{ForceRegistry, ForceSlot, ForceSystem};
