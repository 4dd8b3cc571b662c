//! Error types for model warping.

use crate::{FrameId, ValidationCheck};
use thiserror::Error;
use warp_tps::SolverError;

/// Errors that can occur while warping a model's offset frames.
///
/// A failed warp never leaves some frames updated and others not.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ModelWarpError {
    /// At least one frame is not warpable under the active strategy.
    #[error("model warp blocked by {} frame error(s)", errors.len())]
    BlockedByValidation {
        /// The `Error` checks of every offending frame.
        errors: Vec<ValidationCheck>,
    },

    /// The spline could not be solved.
    #[error("TPS solve failed: {0}")]
    Solver(#[from] SolverError),

    /// A frame id is not part of the model.
    #[error("unknown frame: {id}")]
    UnknownFrame {
        /// The missing frame.
        id: FrameId,
    },

    /// A frame collapsed or became non-finite under the warp.
    #[error("warped frame {id} is degenerate")]
    DegenerateFrame {
        /// The offending frame.
        id: FrameId,
    },
}

impl ModelWarpError {
    /// Check if this error lists validation failures.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::BlockedByValidation { .. })
    }

    /// The blocking checks, empty for other errors.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationCheck] {
        match self {
            Self::BlockedByValidation { errors } => errors,
            _ => &[],
        }
    }
}

/// Result type for model warp operations.
pub type ModelWarpResult<T> = Result<T, ModelWarpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ValidationCheck, ValidationSubject};

    #[test]
    fn test_error_display() {
        let err = ModelWarpError::BlockedByValidation {
            errors: vec![ValidationCheck::error(
                ValidationSubject::Frame(FrameId::new(3)),
                "frame 'a' cannot be warped exactly",
            )],
        };
        assert!(err.to_string().contains("1 frame error"));
        assert!(err.is_blocked());
        assert_eq!(err.validation_errors().len(), 1);

        let err = ModelWarpError::UnknownFrame { id: FrameId::new(9) };
        assert!(err.to_string().contains("Frame(9)"));
        assert!(!err.is_blocked());
        assert!(err.validation_errors().is_empty());
    }

    #[test]
    fn test_solver_error_converts() {
        let err: ModelWarpError = SolverError::UnderdeterminedSystem {
            required: 4,
            provided: 2,
        }
        .into();
        assert!(matches!(err, ModelWarpError::Solver(_)));
    }
}
