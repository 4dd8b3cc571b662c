//! Property-based tests for mesh warping.
//!
//! Run with: cargo test -p warp-mesh -- proptest

#![allow(clippy::unwrap_used)]

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use warp_mesh::{IndexedMesh, WarpError, warp_mesh};
use warp_tps::{TpsCoefficients, TpsSolverInputs, solve_pairs};
use warp_types::LandmarkPair;

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-50.0..50.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_mesh() -> impl Strategy<Value = IndexedMesh> {
    (3..40usize).prop_flat_map(|n| {
        let positions = prop::collection::vec(arb_point(), n);
        let n = u32::try_from(n).unwrap();
        let faces = prop::collection::vec(prop::array::uniform3(0..n), 0..30);
        (positions, faces).prop_map(|(p, f)| IndexedMesh::from_parts(p, f).with_computed_normals())
    })
}

fn bend() -> TpsCoefficients {
    let pairs = [
        (Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0)),
        (Point3::new(10.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)),
        (Point3::new(0.0, 10.0, 0.0), Vector3::new(0.0, 0.0, -1.0)),
        (Point3::new(0.0, 0.0, 10.0), Vector3::new(1.0, 0.0, 0.0)),
        (Point3::new(5.0, 5.0, 5.0), Vector3::new(0.5, 0.5, 0.5)),
    ]
    .map(|(p, d)| LandmarkPair::new(p, p + d));
    solve_pairs(&pairs, &TpsSolverInputs::default()).unwrap()
}

proptest! {
    /// Identity coefficients never move anything.
    #[test]
    fn proptest_identity_is_noop(mesh in arb_mesh(), blend in 0.0..=1.0f64) {
        let mut warped = mesh.clone();
        let out = warp_mesh(&TpsCoefficients::identity(), &mut warped, blend).unwrap();
        prop_assert_eq!(out.vertices_modified, 0);
        prop_assert_eq!(warped.positions, mesh.positions);
    }

    /// Blend factors outside [0, 1] are rejected and the mesh is untouched.
    #[test]
    fn proptest_bad_blend_rejected(mesh in arb_mesh(), blend in prop_oneof![-10.0..-1e-9f64, 1.0 + 1e-9..10.0f64]) {
        let mut warped = mesh.clone();
        let err = warp_mesh(&bend(), &mut warped, blend).unwrap_err();
        let is_blend_error = matches!(err, WarpError::InvalidBlendFactor { .. });
        prop_assert!(is_blend_error);
        prop_assert_eq!(warped, mesh);
    }

    /// Statistics are consistent with the actual displacements, and normals
    /// stay unit length or zero.
    #[test]
    fn proptest_output_consistent(mesh in arb_mesh(), blend in 0.0..=1.0f64) {
        let mut warped = mesh.clone();
        let out = warp_mesh(&bend(), &mut warped, blend).unwrap();

        prop_assert!(out.vertices_modified <= mesh.vertex_count());
        let max = mesh
            .positions
            .iter()
            .zip(&warped.positions)
            .map(|(a, b)| (b - a).norm())
            .fold(0.0, f64::max);
        prop_assert!((out.max_displacement - max).abs() < 1e-9);
        prop_assert!(out.average_displacement <= out.max_displacement + 1e-12);

        for n in warped.normals.as_ref().unwrap() {
            let len = n.norm();
            prop_assert!(len < 1e-9 || (len - 1.0).abs() < 1e-9);
        }
    }
}
