//! Main mesh warping functions.

use crate::{WarpError, WarpOutput, WarpResult, WarpableMesh};
use tracing::info;
use warp_tps::{TpsCoefficients, warped_points};

/// Parameters for [`warp_mesh_with_params`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpMeshParams {
    /// Interpolation between unwarped (0) and fully warped (1) positions.
    pub blend_factor: f64,
    /// Rebuild normals from the warped geometry when the mesh carries them.
    pub recalculate_normals: bool,
}

impl Default for WarpMeshParams {
    fn default() -> Self {
        Self {
            blend_factor: 1.0,
            recalculate_normals: true,
        }
    }
}

impl WarpMeshParams {
    /// Creates parameters with the given blend factor.
    #[must_use]
    pub fn new(blend_factor: f64) -> Self {
        Self {
            blend_factor,
            ..Self::default()
        }
    }

    /// Enables or disables normal recomputation.
    #[must_use]
    pub const fn with_recalculate_normals(mut self, enabled: bool) -> Self {
        self.recalculate_normals = enabled;
        self
    }
}

/// Warps every vertex of `mesh` in place.
///
/// Normals, if present, are recomputed from the warped positions.
///
/// # Errors
///
/// Returns an error if:
/// - `blend_factor` is not a finite number in `[0, 1]`
/// - Any warped position is non-finite
///
/// The mesh is untouched on error.
///
/// # Examples
///
/// ```
/// use warp_mesh::{warp_mesh, IndexedMesh};
/// use warp_tps::{solve_pairs, TpsSolverInputs};
/// use warp_types::LandmarkPair;
/// use nalgebra::{Point3, Vector3};
///
/// let lift = Vector3::new(0.0, 0.0, 1.0);
/// let pairs: Vec<_> = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ]
/// .into_iter()
/// .map(|p| LandmarkPair::new(p, p + lift))
/// .collect();
/// let coefs = solve_pairs(&pairs, &TpsSolverInputs::default()).unwrap();
///
/// let mut mesh = IndexedMesh::from_parts(
///     vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     vec![[0, 1, 2]],
/// );
///
/// let output = warp_mesh(&coefs, &mut mesh, 1.0).unwrap();
/// assert_eq!(output.vertices_modified, 3);
/// assert!((mesh.positions[1].z - 1.0).abs() < 1e-9);
/// ```
pub fn warp_mesh<M>(
    coefs: &TpsCoefficients,
    mesh: &mut M,
    blend_factor: f64,
) -> WarpResult<WarpOutput>
where
    M: WarpableMesh + ?Sized,
{
    warp_mesh_with_params(coefs, mesh, &WarpMeshParams::new(blend_factor))
}

/// Warps every vertex of `mesh` in place with explicit parameters.
///
/// # Errors
///
/// See [`warp_mesh`].
pub fn warp_mesh_with_params<M>(
    coefs: &TpsCoefficients,
    mesh: &mut M,
    params: &WarpMeshParams,
) -> WarpResult<WarpOutput>
where
    M: WarpableMesh + ?Sized,
{
    let blend_factor = params.blend_factor;
    if !blend_factor.is_finite() || !(0.0..=1.0).contains(&blend_factor) {
        return Err(WarpError::InvalidBlendFactor {
            value: blend_factor,
        });
    }

    // Warp into a scratch buffer so a bad result never reaches the mesh
    let warped = warped_points(coefs, mesh.positions(), blend_factor);
    if let Some(vertex) = warped
        .iter()
        .position(|p| !p.iter().all(|c| c.is_finite()))
    {
        return Err(WarpError::NonFiniteResult { vertex });
    }

    let mut output = WarpOutput::from_displacements(mesh.positions(), &warped);
    mesh.positions_mut().copy_from_slice(&warped);

    if params.recalculate_normals && mesh.has_normals() {
        mesh.recompute_normals();
        output.normals_recomputed = true;
    }

    info!(
        vertices = warped.len(),
        control_points = coefs.num_control_points(),
        blend_factor,
        vertices_modified = output.vertices_modified,
        max_displacement = output.max_displacement,
        "Mesh warp complete"
    );

    Ok(output)
}

/// Returns a warped copy of `mesh`, leaving the input untouched.
///
/// # Errors
///
/// See [`warp_mesh`].
pub fn warp_mesh_copy<M>(
    coefs: &TpsCoefficients,
    mesh: &M,
    params: &WarpMeshParams,
) -> WarpResult<(M, WarpOutput)>
where
    M: WarpableMesh + Clone,
{
    let mut copy = mesh.clone();
    let output = warp_mesh_with_params(coefs, &mut copy, params)?;
    Ok((copy, output))
}
