//! Thin-plate-spline solving and evaluation for landmark warping.
//!
//! Given an ordered set of [`LandmarkPair`](warp_types::LandmarkPair)s, this
//! crate fits a 3D thin-plate spline that maps every source landmark exactly
//! onto its destination and smoothly interpolates everywhere else.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Quick Start
//!
//! ```
//! use warp_tps::{solve_pairs, warp_point, TpsSolverInputs};
//! use warp_types::LandmarkPair;
//! use nalgebra::{Point3, Vector3};
//!
//! let offset = Vector3::new(0.0, 0.0, 0.5);
//! let pairs: Vec<_> = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ]
//! .into_iter()
//! .map(|s| LandmarkPair::new(s, s + offset))
//! .collect();
//!
//! let coefs = solve_pairs(&pairs, &TpsSolverInputs::default()).unwrap();
//!
//! // Half-way between the original and the warped position
//! let p = warp_point(&coefs, &Point3::new(0.5, 0.5, 0.5), 0.5);
//! assert!((p.z - 0.75).abs() < 1e-9);
//! ```
//!
//! # Solver Inputs
//!
//! [`TpsSolverInputs`] can strip parts of the solved warp:
//!
//! | Flag | Effect when disabled |
//! |------|----------------------|
//! | `apply_affine_translation` | Constant term zeroed |
//! | `apply_affine_scale` | Affine basis vectors normalized |
//! | `apply_affine_rotation` | Affine basis vectors axis-aligned |
//! | `apply_non_affine_warp` | Bending terms dropped |
//!
//! Anything other than the default breaks exact interpolation.
//!
//! # Caching
//!
//! [`CoefficientCache`] memoizes solves by a hash of the ordered pairs and
//! the solver flags, so edits that leave the participating pairs unchanged
//! do not trigger another factorization.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cache;
mod error;
mod eval;
mod inputs;
mod solver;

pub use cache::{CacheConfig, CoefficientCache, content_hash};
pub use error::{SolverError, SolverResult};
pub use eval::{PARALLEL_THRESHOLD, warp_point, warp_points, warped_points};
pub use inputs::TpsSolverInputs;
pub use solver::{
    MIN_LANDMARK_PAIRS, MIN_RECIPROCAL_CONDITION, NonAffineTerm, TpsCoefficients, radial_basis,
    solve_pairs,
};
