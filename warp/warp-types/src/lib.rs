//! Core value types for landmark-driven warping.
//!
//! This crate provides the small, copyable types shared by every other
//! `warp-*` crate:
//!
//! - [`LandmarkPair`] - A source point and the destination it should map to
//! - [`NamedLandmarkPair`] - A landmark pair carrying its display name
//! - [`InputSide`] - Which half of a correspondence an operation targets
//! - [`ElementKind`] - Whether an element participates in the spline fit
//! - [`ElementId`] - Stable identifier of a document element
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It depends only
//! on `nalgebra` (and optionally `serde`).
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Example
//!
//! ```
//! use warp_types::{InputSide, LandmarkPair, Point3};
//!
//! let pair = LandmarkPair::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
//! assert_eq!(pair.get(InputSide::Destination).x, 1.0);
//! assert!(pair.is_finite());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod ids;
mod pair;

pub use ids::{ElementId, ElementKind, InputSide};
pub use pair::{LandmarkPair, NamedLandmarkPair, is_finite_point};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
