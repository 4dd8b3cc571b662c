//! Landmark document model with undo/redo.
//!
//! This crate holds the editable state of a landmark warp:
//!
//! - [`LandmarkDocument`] - Ordered, named landmarks and reference points
//! - [`DocumentSettings`] - Blend factor, normal handling, frame fallback, solver inputs
//! - [`SnapshotHistory`] - Linear undo/redo over shared immutable snapshots
//! - [`UndoableDocument`] - A document whose successful commands are committed to history
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Quick Start
//!
//! ```
//! use warp_document::UndoableDocument;
//! use warp_types::{InputSide, Point3};
//!
//! let mut doc = UndoableDocument::new();
//!
//! // Place four sources, then four destinations; each destination fills
//! // the first landmark that lacks one.
//! let corners = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! for p in corners {
//!     doc.add_landmark_to_input(InputSide::Source, p, None).unwrap();
//! }
//! for p in corners {
//!     doc.add_landmark_to_input(InputSide::Destination, p * 2.0, None).unwrap();
//! }
//!
//! assert_eq!(doc.current().participating_pairs().len(), 4);
//!
//! // A rejected command leaves no trace in history
//! assert!(doc.set_blend_factor(2.0).is_err());
//! doc.undo();
//! assert_eq!(doc.current().participating_pairs().len(), 3);
//! ```
//!
//! # Element Naming
//!
//! Generated names are `landmark_N` for landmarks and `datapoint_N` for
//! non-participating points, using the lowest free `N`. Document commands
//! keep names unique; documents rebuilt with
//! [`LandmarkDocument::from_records`] may contain duplicates, which are
//! reported by [`LandmarkDocument::duplicate_names`].

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod document;
mod error;
mod history;
mod settings;
mod undoable;

pub use document::{
    Element, ElementRecord, LANDMARK_NAME_PREFIX, LandmarkDocument, NON_PARTICIPATING_NAME_PREFIX,
};
pub use error::{DocumentError, DocumentResult};
pub use history::{HistoryConfig, Snapshot, SnapshotHistory};
pub use settings::{DocumentSettings, OffsetFrameFallbackStrategy, check_blend_factor};
pub use undoable::UndoableDocument;
