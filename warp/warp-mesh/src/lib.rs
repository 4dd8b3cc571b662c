//! Thin-plate-spline warping of meshes and point clouds.
//!
//! This crate applies solved [`TpsCoefficients`](warp_tps::TpsCoefficients)
//! to geometry:
//!
//! - [`WarpableMesh`] - The trait geometry implements to be warped
//! - [`IndexedMesh`] - An indexed triangle mesh with optional normals
//! - [`warp_mesh`] - Warps positions in place and rebuilds normals
//! - [`warp_mesh_copy`] - Warps a copy, leaving the input untouched
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Normals
//!
//! Normals are never pushed through the warp. After positions move, meshes
//! that carry normals rebuild them as area-weighted face normal averages,
//! so shading stays consistent with the warped surface.
//!
//! # Failure
//!
//! Warps are all-or-nothing. The blend factor is validated before anything
//! is evaluated, and positions are written only after every warped position
//! has been checked to be finite.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod mesh;
mod output;
mod traits;
mod warp;

pub use error::{WarpError, WarpResult};
pub use mesh::IndexedMesh;
pub use output::{DISPLACEMENT_EPSILON, WarpOutput};
pub use traits::WarpableMesh;
pub use warp::{WarpMeshParams, warp_mesh, warp_mesh_copy, warp_mesh_with_params};
