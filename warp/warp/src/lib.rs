//! Landmark-driven thin-plate-spline warping.
//!
//! This umbrella crate re-exports the warp-* crates and ties them together
//! into an interactive pipeline: edit landmarks, solve, warp meshes and
//! model frames, and report per-element validation.
//!
//! # Quick Start
//!
//! ```
//! use landmark_warp::prelude::*;
//!
//! let mut doc = UndoableDocument::new();
//! for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.0]] {
//!     let p = Point3::from(p);
//!     let id = doc.add_landmark_to_input(InputSide::Source, p, None).unwrap();
//!     doc.set_coordinate(id, InputSide::Destination, p * 2.0).unwrap();
//! }
//!
//! let coefs = landmark_warp::solve(doc.current()).unwrap();
//! let mut mesh = IndexedMesh::from_parts(
//!     vec![Point3::new(0.5, 0.0, 0.0), Point3::new(0.0, 0.5, 0.0), Point3::new(0.0, 0.0, 0.5)],
//!     vec![[0, 1, 2]],
//! );
//! let output = warp_mesh(&coefs, &mut mesh, 1.0).unwrap();
//! assert_eq!(output.vertices_modified, 3);
//! assert!((mesh.positions[0].x - 1.0).abs() < 1e-9);
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Value types: `LandmarkPair`, `ElementId`, `InputSide`
//! - [`document`] - The landmark document, its commands and undo history
//! - [`tps`] - The thin-plate-spline solver, evaluation and coefficient cache
//! - [`mesh`] - Mesh and point-cloud warping
//! - [`model`] - Offset-frame validation and warping
//!
//! # Concurrency
//!
//! Committed document snapshots are immutable `Arc`s, so a [`SolveWorker`]
//! can solve one while editing continues. [`WarpSession`] tags every request
//! with the document generation and discards results for older generations.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod session;
mod worker;

pub use error::{SessionError, SessionResult};
pub use session::WarpSession;
pub use worker::{SolveOutcome, SolveWorker, WorkerConfig};

// =============================================================================
// Re-exports
// =============================================================================

/// Value types: landmark pairs, element identifiers, input sides.
pub use warp_types as types;

/// The landmark document, its commands and undo history.
pub use warp_document as document;

/// Thin-plate-spline solving and evaluation.
pub use warp_tps as tps;

/// Mesh and point-cloud warping.
pub use warp_mesh as mesh;

/// Offset-frame validation and warping.
pub use warp_model as model;

use std::sync::Arc;

use warp_document::{DocumentSettings, LandmarkDocument, OffsetFrameFallbackStrategy};
use warp_mesh::{WarpMeshParams, WarpOutput, WarpResult, WarpableMesh};
use warp_model::{FrameGraph, ValidationReport};
use warp_tps::{CoefficientCache, SolverResult, TpsCoefficients};

// =============================================================================
// Pipeline
// =============================================================================

/// Solves the participating pairs of `document` with its solver settings.
///
/// # Errors
///
/// Returns the solver error if there are too few pairs or the system is
/// ill-conditioned.
pub fn solve(document: &LandmarkDocument) -> SolverResult<TpsCoefficients> {
    warp_tps::solve_pairs(&document.participating_pairs(), &document.settings().solver)
}

/// Like [`solve`], answering repeated requests for the same pairs from
/// `cache`.
///
/// # Errors
///
/// Returns the (possibly cached) solver error.
pub fn solve_cached(
    cache: &mut CoefficientCache,
    document: &LandmarkDocument,
) -> SolverResult<Arc<TpsCoefficients>> {
    cache.get_or_solve(&document.participating_pairs(), &document.settings().solver)
}

/// Validates `document` and the frames of `frames` under `strategy`.
#[must_use]
pub fn validate<G>(
    document: &LandmarkDocument,
    frames: &G,
    strategy: OffsetFrameFallbackStrategy,
) -> ValidationReport
where
    G: FrameGraph + ?Sized,
{
    warp_model::validate_frames(document, frames, strategy)
}

/// Warps `mesh` with the blend factor and normal policy of `settings`.
///
/// # Errors
///
/// See [`warp_mesh::warp_mesh`].
pub fn warp_mesh_with_settings<M>(
    coefs: &TpsCoefficients,
    settings: &DocumentSettings,
    mesh: &mut M,
) -> WarpResult<WarpOutput>
where
    M: WarpableMesh + ?Sized,
{
    let params = WarpMeshParams::new(settings.blend_factor)
        .with_recalculate_normals(settings.recalculate_normals);
    warp_mesh::warp_mesh_with_params(coefs, mesh, &params)
}

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for landmark warping.
///
/// # Usage
///
/// ```
/// use landmark_warp::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use warp_types::{ElementId, ElementKind, InputSide, LandmarkPair, Point3, Vector3};

    // Document
    pub use warp_document::{
        DocumentSettings, LandmarkDocument, OffsetFrameFallbackStrategy, UndoableDocument,
    };

    // Solver
    pub use warp_tps::{TpsCoefficients, TpsSolverInputs, solve_pairs, warp_point};

    // Warping
    pub use warp_mesh::{IndexedMesh, WarpableMesh, warp_mesh};
    pub use warp_model::{
        FrameDefinition, FrameGraph, FrameId, FrameSet, OffsetFrame, ValidationCheckState,
        warp_frames,
    };

    // Pipeline
    pub use crate::{WarpSession, solve, validate};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use warp_types::InputSide;

    fn scaled_document(factor: f64) -> LandmarkDocument {
        let mut doc = LandmarkDocument::new();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ] {
            let id = doc.add_landmark_to_input(InputSide::Source, p, None).unwrap();
            doc.set_coordinate(id, InputSide::Destination, p * factor).unwrap();
        }
        doc
    }

    #[test]
    fn test_solve_uses_document_settings() {
        let mut doc = scaled_document(2.0);
        let full = solve(&doc).unwrap();
        doc.set_solver_inputs(warp_tps::TpsSolverInputs::default().with_affine_scale(false));
        let unscaled = solve(&doc).unwrap();
        assert_ne!(full.affine, unscaled.affine);
    }

    #[test]
    fn test_solve_cached_shares_fit() {
        let doc = scaled_document(2.0);
        let mut cache = CoefficientCache::new();
        let a = solve_cached(&mut cache, &doc).unwrap();
        let b = solve_cached(&mut cache, &doc).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_warp_with_settings_blend() {
        let doc = scaled_document(3.0);
        let coefs = solve(&doc).unwrap();
        let settings = DocumentSettings::default().with_blend_factor(0.5);
        let mut cloud = vec![Point3::new(1.0, 0.0, 0.0)];
        warp_mesh_with_settings(&coefs, &settings, &mut cloud).unwrap();
        assert!((cloud[0].coords - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_prelude_imports() {
        use prelude::*;
        let doc = UndoableDocument::new();
        assert!(doc.current().is_empty());
        let frames = FrameSet::new();
        let report = validate(doc.current(), &frames, OffsetFrameFallbackStrategy::Ignore);
        assert!(report.has_errors());
    }
}
