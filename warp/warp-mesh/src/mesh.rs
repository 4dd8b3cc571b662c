//! Indexed triangle mesh.

use crate::WarpableMesh;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh with optional per-vertex normals.
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside,
/// so recomputed normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use warp_mesh::IndexedMesh;
/// use nalgebra::Point3;
///
/// let mut mesh = IndexedMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// )
/// .with_computed_normals();
///
/// assert_eq!(mesh.vertex_count(), 3);
/// let n = mesh.normals.as_ref().unwrap()[0];
/// assert!((n.z - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Per-vertex unit normals, parallel to `positions` when present.
    pub normals: Option<Vec<Vector3<f64>>>,
    /// Triangle faces as indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Creates an empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            faces: Vec::new(),
        }
    }

    /// Creates a mesh from positions and faces, without normals.
    #[inline]
    #[must_use]
    pub const fn from_parts(positions: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            normals: None,
            faces,
        }
    }

    /// Creates a mesh from flat coordinate and index arrays.
    ///
    /// Trailing values that do not form a full triple are ignored.
    ///
    /// ```
    /// use warp_mesh::IndexedMesh;
    ///
    /// let mesh = IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        let positions = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        Self::from_parts(positions, faces)
    }

    /// Computes normals and attaches them to the mesh.
    #[must_use]
    pub fn with_computed_normals(mut self) -> Self {
        self.normals = Some(self.compute_vertex_normals());
        self
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns whether the mesh has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Un-normalized face normal; its length is twice the face area.
    ///
    /// Returns `None` if the face or any of its indices is out of range.
    #[must_use]
    pub fn face_normal(&self, face_index: usize) -> Option<Vector3<f64>> {
        let face = self.faces.get(face_index)?;
        let v0 = self.positions.get(face[0] as usize)?;
        let v1 = self.positions.get(face[1] as usize)?;
        let v2 = self.positions.get(face[2] as usize)?;
        Some((v1 - v0).cross(&(v2 - v0)))
    }

    /// Area-weighted vertex normals.
    ///
    /// Each face contributes its cross product to its three vertices, so
    /// larger faces weigh more. Vertices with no usable face get a zero
    /// normal. Faces with out-of-range indices are skipped.
    #[must_use]
    pub fn compute_vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for (i, face) in self.faces.iter().enumerate() {
            let Some(face_normal) = self.face_normal(i) else {
                continue;
            };
            for &v in face {
                normals[v as usize] += face_normal;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            if len > 1e-10 {
                *n /= len;
            }
        }
        normals
    }
}

impl WarpableMesh for IndexedMesh {
    fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    fn recompute_normals(&mut self) {
        if self.normals.is_some() {
            self.normals = Some(self.compute_vertex_normals());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> IndexedMesh {
        IndexedMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_from_raw_ignores_partial_triples() {
        let mesh = IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 1.0], &[0, 0, 0, 1]);
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.normals.is_none());
    }

    #[test]
    fn test_face_normal_length_is_twice_area() {
        let mesh = unit_square();
        let n = mesh.face_normal(0).unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
        assert!(mesh.face_normal(5).is_none());
    }

    #[test]
    fn test_vertex_normals_are_unit() {
        let mesh = unit_square().with_computed_normals();
        for n in mesh.normals.as_ref().unwrap() {
            assert_relative_eq!(*n, Vector3::z(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_isolated_vertex_gets_zero_normal() {
        let mut mesh = unit_square();
        mesh.positions.push(Point3::new(5.0, 5.0, 5.0));
        let normals = mesh.compute_vertex_normals();
        assert_eq!(normals[4], Vector3::zeros());
    }

    #[test]
    fn test_out_of_range_face_is_skipped() {
        let mut mesh = unit_square();
        mesh.faces.push([0, 1, 99]);
        let normals = mesh.compute_vertex_normals();
        assert_relative_eq!(normals[0], Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_recompute_only_when_present() {
        let mut bare = unit_square();
        bare.recompute_normals();
        assert!(!bare.has_normals());

        let mut with = unit_square().with_computed_normals();
        // Fold the square upward; normals follow the geometry
        with.positions[2].z = 1.0;
        with.positions[3].z = 1.0;
        with.recompute_normals();
        let n = with.normals.as_ref().unwrap()[3];
        assert!(n.y < 0.0 && n.z > 0.0);
    }
}
