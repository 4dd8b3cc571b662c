//! Error types for landmark document commands.

use thiserror::Error;
use warp_types::{ElementId, InputSide};

/// Result type for document commands.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur while editing a landmark document.
///
/// A command that returns an error leaves the document unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DocumentError {
    /// Another element already uses the requested name.
    #[error("an element named '{name}' already exists")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// No element with this identifier exists.
    #[error("no element with id {id}")]
    UnknownId {
        /// The missing identifier.
        id: ElementId,
    },

    /// A coordinate or translation contained NaN or infinity.
    #[error("{side} coordinate is not finite")]
    InvalidCoordinate {
        /// The side the coordinate was destined for.
        side: InputSide,
    },

    /// The blend factor was outside `[0, 1]` or not finite.
    #[error("blend factor {value} is outside [0, 1]")]
    InvalidBlendFactor {
        /// The rejected value.
        value: f64,
    },

    /// A non-participating element was addressed on the wrong side.
    #[error("{id} belongs to the {expected} side, not the {provided} side")]
    SideMismatch {
        /// The element addressed.
        id: ElementId,
        /// The side the element belongs to.
        expected: InputSide,
        /// The side the command targeted.
        provided: InputSide,
    },

    /// The command needs a coordinate that has not been set.
    #[error("{id} has no {side} coordinate")]
    MissingCoordinate {
        /// The element addressed.
        id: ElementId,
        /// The unset side.
        side: InputSide,
    },

    /// A reorder target was past the end of the document.
    #[error("index {index} out of range for document with {len} elements")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of elements in the document.
        len: usize,
    },
}
