//! Error types for thin-plate-spline solving.

use thiserror::Error;

/// Errors that can occur while solving spline coefficients.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SolverError {
    /// Not enough landmark pairs for a well-posed affine term.
    #[error("at least {required} landmark pairs required, got {provided}")]
    UnderdeterminedSystem {
        /// Number of pairs required.
        required: usize,
        /// Number of pairs provided.
        provided: usize,
    },

    /// The system matrix is singular or nearly so.
    ///
    /// Typical causes are coincident source points or source points that
    /// all lie in one plane.
    #[error(
        "TPS system is ill-conditioned (reciprocal condition {reciprocal_condition:.3e}): \
         check for duplicate or coplanar source landmarks"
    )]
    IllConditionedSystem {
        /// Ratio of the smallest to the largest singular value.
        reciprocal_condition: f64,
    },

    /// A landmark pair contained a NaN or infinite coordinate.
    #[error("landmark pair {index} has a non-finite coordinate")]
    NonFiniteLandmark {
        /// Position of the offending pair in the input.
        index: usize,
    },
}

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
