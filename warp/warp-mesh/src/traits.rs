//! Geometry consumed by the warper.

use nalgebra::Point3;

/// Geometry whose vertex positions can be warped.
///
/// Normals are never warped directly. Implementors that carry normals
/// rebuild them from the warped positions in
/// [`recompute_normals`](Self::recompute_normals).
pub trait WarpableMesh {
    /// Vertex positions.
    fn positions(&self) -> &[Point3<f64>];

    /// Mutable vertex positions.
    fn positions_mut(&mut self) -> &mut [Point3<f64>];

    /// Returns whether this geometry carries per-vertex normals.
    fn has_normals(&self) -> bool {
        false
    }

    /// Rebuilds normals from the current positions.
    ///
    /// The default does nothing, which suits normal-less geometry.
    fn recompute_normals(&mut self) {}

    /// Number of vertices.
    fn vertex_count(&self) -> usize {
        self.positions().len()
    }
}

/// A bare point cloud.
impl WarpableMesh for Vec<Point3<f64>> {
    fn positions(&self) -> &[Point3<f64>] {
        self
    }

    fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        self
    }
}
