//! Offset frames and the model graph that owns them.
//!
//! An offset frame is a rigid reference frame attached to a body, used for
//! attachment points in a model. Its local transform is expressed in the
//! same coordinate space as the source landmarks.

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this length a basis vector is treated as degenerate.
pub const DEGENERACY_EPSILON: f64 = 1e-9;

/// Unique identifier for an offset frame in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameId(pub u64);

impl FrameId {
    /// Create a new frame ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for FrameId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

/// How a frame's transform relates to the landmarks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameDefinition {
    /// A plain local transform with no landmark association.
    #[default]
    Fixed,
    /// A frame spanned by three named landmarks.
    ///
    /// The origin sits on `origin`, x points toward `axis`, and z is normal
    /// to the plane through all three.
    Landmarks {
        /// Landmark at the frame origin.
        origin: String,
        /// Landmark the x axis points toward.
        axis: String,
        /// Landmark that fixes the xy plane.
        plane: String,
    },
}

impl FrameDefinition {
    /// Creates a landmark-spanned definition.
    #[must_use]
    pub fn landmarks(
        origin: impl Into<String>,
        axis: impl Into<String>,
        plane: impl Into<String>,
    ) -> Self {
        Self::Landmarks {
            origin: origin.into(),
            axis: axis.into(),
            plane: plane.into(),
        }
    }

    /// The referenced landmark names in origin, axis, plane order.
    #[must_use]
    pub fn landmark_names(&self) -> Option<[&str; 3]> {
        match self {
            Self::Fixed => None,
            Self::Landmarks {
                origin,
                axis,
                plane,
            } => Some([origin.as_str(), axis.as_str(), plane.as_str()]),
        }
    }
}

/// A rigid frame attached to a body.
///
/// # Example
///
/// ```
/// use warp_model::{FrameDefinition, FrameId, OffsetFrame};
/// use nalgebra::{Isometry3, Vector3};
///
/// let frame = OffsetFrame::new(FrameId::new(1), "hip", Isometry3::translation(1.0, 0.0, 0.0))
///     .with_definition(FrameDefinition::landmarks("hip_center", "knee", "ankle"));
///
/// assert_eq!(frame.origin().coords, Vector3::new(1.0, 0.0, 0.0));
/// assert!(frame.is_landmark_defined());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OffsetFrame {
    /// Frame identifier.
    pub id: FrameId,
    /// Human-readable name.
    pub name: String,
    /// Transform relative to the parent body.
    pub local_transform: Isometry3<f64>,
    /// Landmark association, if any.
    pub definition: FrameDefinition,
}

impl OffsetFrame {
    /// Creates a frame with a fixed definition.
    #[must_use]
    pub fn new(id: FrameId, name: impl Into<String>, local_transform: Isometry3<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            local_transform,
            definition: FrameDefinition::Fixed,
        }
    }

    /// Sets the landmark association.
    #[must_use]
    pub fn with_definition(mut self, definition: FrameDefinition) -> Self {
        self.definition = definition;
        self
    }

    /// Origin of the frame.
    #[must_use]
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.local_transform.translation.vector)
    }

    /// Returns whether the frame is spanned by landmarks.
    #[must_use]
    pub const fn is_landmark_defined(&self) -> bool {
        matches!(self.definition, FrameDefinition::Landmarks { .. })
    }
}

/// Builds the frame spanned by three points.
///
/// Returns `None` if the points are coincident or collinear.
///
/// ```
/// use warp_model::frame_from_points;
/// use nalgebra::{Point3, Vector3};
///
/// let iso = frame_from_points(
///     &Point3::new(1.0, 1.0, 0.0),
///     &Point3::new(1.0, 3.0, 0.0),
///     &Point3::new(0.0, 1.0, 0.0),
/// )
/// .unwrap();
///
/// let x = iso.rotation * Vector3::x();
/// assert!((x - Vector3::y()).norm() < 1e-12);
/// assert!(frame_from_points(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0), &Point3::new(2.0, 0.0, 0.0)).is_none());
/// ```
#[must_use]
pub fn frame_from_points(
    origin: &Point3<f64>,
    axis: &Point3<f64>,
    plane: &Point3<f64>,
) -> Option<Isometry3<f64>> {
    let to_axis = axis - origin;
    let len = to_axis.norm();
    if !len.is_finite() || len < DEGENERACY_EPSILON {
        return None;
    }
    let x = to_axis / len;

    let normal = x.cross(&(plane - origin));
    let len = normal.norm();
    if !len.is_finite() || len < DEGENERACY_EPSILON {
        return None;
    }
    let z = normal / len;
    let y = z.cross(&x);

    let basis = Matrix3::from_columns(&[x, y, z]);
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
    Some(Isometry3::from_parts(
        Translation3::from(origin.coords),
        rotation,
    ))
}

/// Source of offset frames and sink for their warped transforms.
///
/// Implemented by whatever owns the model. Frames are listed in a stable
/// order and updated by id.
pub trait FrameGraph {
    /// Iterate over all offset frames.
    fn offset_frames(&self) -> impl Iterator<Item = &OffsetFrame>;

    /// Replace the local transform of frame `id`.
    ///
    /// Returns `false` if no such frame exists.
    fn set_local_transform(&mut self, id: FrameId, transform: Isometry3<f64>) -> bool;

    /// Look up a frame by id.
    fn frame(&self, id: FrameId) -> Option<&OffsetFrame> {
        self.offset_frames().find(|f| f.id == id)
    }

    /// Number of frames.
    fn frame_count(&self) -> usize {
        self.offset_frames().count()
    }
}

/// An in-memory list of offset frames.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameSet {
    frames: Vec<OffsetFrame>,
}

impl FrameSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Adds a frame, replacing any frame with the same id.
    pub fn insert(&mut self, frame: OffsetFrame) {
        match self.frames.iter_mut().find(|f| f.id == frame.id) {
            Some(slot) => *slot = frame,
            None => self.frames.push(frame),
        }
    }

    /// Adds a frame and returns the set.
    #[must_use]
    pub fn with_frame(mut self, frame: OffsetFrame) -> Self {
        self.insert(frame);
        self
    }

    /// Removes a frame by id.
    pub fn remove(&mut self, id: FrameId) -> Option<OffsetFrame> {
        let index = self.frames.iter().position(|f| f.id == id)?;
        Some(self.frames.remove(index))
    }

    /// All frames in insertion order.
    #[must_use]
    pub fn frames(&self) -> &[OffsetFrame] {
        &self.frames
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns whether the set holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<OffsetFrame> for FrameSet {
    fn from_iter<I: IntoIterator<Item = OffsetFrame>>(iter: I) -> Self {
        let mut set = Self::new();
        for frame in iter {
            set.insert(frame);
        }
        set
    }
}

impl FrameGraph for FrameSet {
    fn offset_frames(&self) -> impl Iterator<Item = &OffsetFrame> {
        self.frames.iter()
    }

    fn set_local_transform(&mut self, id: FrameId, transform: Isometry3<f64>) -> bool {
        match self.frames.iter_mut().find(|f| f.id == id) {
            Some(frame) => {
                frame.local_transform = transform;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_frame_id() {
        let id = FrameId::from(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "Frame(7)");
    }

    #[test]
    fn test_frame_from_points_is_right_handed() {
        let iso = frame_from_points(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(1.0, 5.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(iso.rotation * Vector3::x(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(iso.rotation * Vector3::y(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(iso.rotation * Vector3::z(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_frame_from_points_translation() {
        let origin = Point3::new(3.0, -1.0, 2.0);
        let iso = frame_from_points(
            &origin,
            &Point3::new(3.0, -1.0, 5.0),
            &Point3::new(4.0, -1.0, 2.0),
        )
        .unwrap();
        assert_relative_eq!(iso.translation.vector, origin.coords);
        // x toward +z; plane point along +x gives z = x_axis × (+x) = +y
        assert_relative_eq!(iso.rotation * Vector3::x(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(iso.rotation * Vector3::z(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_frame_from_points_degenerate() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(frame_from_points(&p, &p, &Point3::origin()).is_none());
        assert!(frame_from_points(&p, &Point3::origin(), &Point3::new(-1.0, -1.0, -1.0)).is_none());
        assert!(frame_from_points(&p, &Point3::new(f64::NAN, 0.0, 0.0), &Point3::origin()).is_none());
    }

    #[test]
    fn test_definition_names() {
        assert!(FrameDefinition::Fixed.landmark_names().is_none());
        let def = FrameDefinition::landmarks("a", "b", "c");
        assert_eq!(def.landmark_names(), Some(["a", "b", "c"]));
    }

    #[test]
    fn test_frame_set_graph() {
        let mut set: FrameSet = [
            OffsetFrame::new(FrameId::new(1), "a", Isometry3::identity()),
            OffsetFrame::new(FrameId::new(2), "b", Isometry3::identity()),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.frame_count(), 2);

        let moved = Isometry3::translation(1.0, 2.0, 3.0);
        assert!(set.set_local_transform(FrameId::new(2), moved));
        assert!(!set.set_local_transform(FrameId::new(9), moved));
        assert_eq!(set.frame(FrameId::new(2)).unwrap().local_transform, moved);
        assert_eq!(set.frame(FrameId::new(1)).unwrap().local_transform, Isometry3::identity());
    }

    #[test]
    fn test_frame_set_insert_replaces() {
        let mut set = FrameSet::new()
            .with_frame(OffsetFrame::new(FrameId::new(1), "a", Isometry3::identity()));
        set.insert(OffsetFrame::new(FrameId::new(1), "renamed", Isometry3::identity()));
        assert_eq!(set.len(), 1);
        assert_eq!(set.frames()[0].name, "renamed");
        assert!(set.remove(FrameId::new(1)).is_some());
        assert!(set.is_empty());
    }
}
