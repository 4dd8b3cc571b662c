//! Landmark correspondences.

use crate::InputSide;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Returns whether every coordinate of `p` is finite.
#[inline]
#[must_use]
pub fn is_finite_point(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}

/// A complete correspondence between a source point and a destination point.
///
/// Only complete pairs exist as values of this type: a landmark that is
/// still missing one side lives in the document and never reaches the solver.
///
/// # Example
///
/// ```
/// use warp_types::{LandmarkPair, Point3, Vector3};
///
/// let pair = LandmarkPair::new(Point3::new(1.0, 2.0, 3.0), Point3::new(2.0, 2.0, 3.0));
/// assert_eq!(pair.displacement(), Vector3::new(1.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LandmarkPair {
    /// Location on the source shape.
    pub source: Point3<f64>,
    /// Location on the destination shape.
    pub destination: Point3<f64>,
}

impl LandmarkPair {
    /// Create a new landmark pair.
    #[must_use]
    pub const fn new(source: Point3<f64>, destination: Point3<f64>) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Create a pair that maps a point onto itself.
    #[must_use]
    pub const fn fixed(point: Point3<f64>) -> Self {
        Self::new(point, point)
    }

    /// Returns the point on the given side.
    #[must_use]
    pub const fn get(&self, side: InputSide) -> Point3<f64> {
        match side {
            InputSide::Source => self.source,
            InputSide::Destination => self.destination,
        }
    }

    /// Vector from source to destination.
    #[must_use]
    pub fn displacement(&self) -> Vector3<f64> {
        self.destination - self.source
    }

    /// Returns whether both points are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        is_finite_point(&self.source) && is_finite_point(&self.destination)
    }

    /// Returns the same correspondence in the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.destination, self.source)
    }
}

/// A landmark pair together with the name of the element it came from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NamedLandmarkPair {
    /// The correspondence.
    pub pair: LandmarkPair,
    /// Display name of the originating element, if it has one.
    pub name: Option<String>,
}

impl NamedLandmarkPair {
    /// Create a new named pair.
    #[must_use]
    pub fn new(pair: LandmarkPair, name: Option<impl Into<String>>) -> Self {
        Self {
            pair,
            name: name.map(Into::into),
        }
    }

    /// Returns the name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pair_sides() {
        let pair = LandmarkPair::new(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0));
        assert_eq!(pair.get(InputSide::Source), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(pair.get(InputSide::Destination), Point3::new(0.0, 1.0, 0.0));
        assert_eq!(pair.reversed().source, pair.destination);
    }

    #[test]
    fn fixed_pair_has_no_displacement() {
        let pair = LandmarkPair::fixed(Point3::new(3.0, 4.0, 5.0));
        assert_relative_eq!(pair.displacement().norm(), 0.0);
    }

    #[test]
    fn displacement_points_to_destination() {
        let pair = LandmarkPair::new(Point3::new(0.1, 0.2, 0.3), Point3::new(0.4, 0.2, -0.3));
        assert_relative_eq!(pair.displacement(), Vector3::new(0.3, 0.0, -0.6), epsilon = 1e-12);
        assert_relative_eq!(pair.source + pair.displacement(), pair.destination, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_points_detected() {
        assert!(!is_finite_point(&Point3::new(f64::NAN, 0.0, 0.0)));
        assert!(!is_finite_point(&Point3::new(0.0, f64::INFINITY, 0.0)));
        let pair = LandmarkPair::new(Point3::origin(), Point3::new(0.0, 0.0, f64::NEG_INFINITY));
        assert!(!pair.is_finite());
    }

    #[test]
    fn named_pair_name() {
        let pair = LandmarkPair::fixed(Point3::origin());
        assert_eq!(NamedLandmarkPair::new(pair, Some("tip")).name(), Some("tip"));
        assert_eq!(NamedLandmarkPair::new(pair, None::<String>).name(), None);
    }
}
