//! Warp statistics.

use nalgebra::Point3;

/// Per-vertex displacements below this are not counted as modifications.
pub const DISPLACEMENT_EPSILON: f64 = 1e-10;

/// Summary of a mesh warp.
///
/// # Examples
///
/// ```
/// use warp_mesh::WarpOutput;
/// use nalgebra::Point3;
///
/// let before = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
/// let after = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 2.0)];
///
/// let output = WarpOutput::from_displacements(&before, &after);
/// assert_eq!(output.vertices_modified, 1);
/// assert!((output.max_displacement - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WarpOutput {
    /// Number of vertices that moved.
    pub vertices_modified: usize,
    /// Largest vertex displacement.
    pub max_displacement: f64,
    /// Mean displacement over the vertices that moved.
    pub average_displacement: f64,
    /// Whether normals were rebuilt from the warped geometry.
    pub normals_recomputed: bool,
}

impl WarpOutput {
    /// Computes displacement statistics between two position sets.
    ///
    /// Positions are compared pairwise; extra entries in either slice are
    /// ignored.
    #[must_use]
    pub fn from_displacements(before: &[Point3<f64>], after: &[Point3<f64>]) -> Self {
        let mut vertices_modified = 0;
        let mut max_displacement: f64 = 0.0;
        let mut total_displacement = 0.0;

        for (orig, warped) in before.iter().zip(after) {
            let disp = (warped - orig).norm();
            if disp > DISPLACEMENT_EPSILON {
                vertices_modified += 1;
                max_displacement = max_displacement.max(disp);
                total_displacement += disp;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let average_displacement = if vertices_modified > 0 {
            total_displacement / vertices_modified as f64
        } else {
            0.0
        };

        Self {
            vertices_modified,
            max_displacement,
            average_displacement,
            normals_recomputed: false,
        }
    }

    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "WarpOutput: {} vertices modified, max displacement: {:.6}, avg displacement: {:.6}",
            self.vertices_modified, self.max_displacement, self.average_displacement
        )
    }
}
