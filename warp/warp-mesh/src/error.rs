//! Error types for mesh warping.

use thiserror::Error;
use warp_tps::SolverError;

/// Errors that can occur while warping geometry.
///
/// A warp that fails leaves the geometry untouched.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum WarpError {
    /// The blend factor was outside `[0, 1]` or not finite.
    #[error("blend factor {value} is outside [0, 1]")]
    InvalidBlendFactor {
        /// The rejected value.
        value: f64,
    },

    /// Warping produced a NaN or infinite position.
    #[error("warped position of vertex {vertex} is not finite")]
    NonFiniteResult {
        /// Index of the first offending vertex.
        vertex: usize,
    },

    /// The spline could not be solved.
    #[error("TPS solve failed: {0}")]
    Solver(#[from] SolverError),
}

/// Result type for warp operations.
pub type WarpResult<T> = Result<T, WarpError>;
