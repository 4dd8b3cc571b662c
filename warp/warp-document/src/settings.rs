//! Document-level warp settings.

use crate::{DocumentError, DocumentResult};
use warp_tps::TpsSolverInputs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How offset frames that cannot be warped exactly are handled.
///
/// One strategy applies to every frame in a model warp.
///
/// | Strategy | Effect on a non-warpable frame |
/// |----------|--------------------------------|
/// | `Error` | The whole model warp fails; nothing is mutated |
/// | `Ignore` | The frame is left unwarped |
/// | `WarpPosition` | Only the frame origin is warped |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OffsetFrameFallbackStrategy {
    /// Fail the warp.
    #[default]
    Error,
    /// Leave the frame where it is.
    Ignore,
    /// Warp the origin and keep the orientation.
    WarpPosition,
}

impl OffsetFrameFallbackStrategy {
    /// All strategies, in declaration order.
    pub const ALL: [Self; 3] = [Self::Error, Self::Ignore, Self::WarpPosition];

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Ignore => "ignore",
            Self::WarpPosition => "warp position",
        }
    }
}

/// Returns `value` if it is a usable blend factor.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidBlendFactor`] if `value` is not finite or
/// lies outside `[0, 1]`.
pub fn check_blend_factor(value: f64) -> DocumentResult<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DocumentError::InvalidBlendFactor { value })
    }
}

/// Settings stored alongside the landmarks.
///
/// Settings are part of every document snapshot, so undo and redo restore
/// them together with the landmarks.
///
/// # Example
///
/// ```
/// use warp_document::{DocumentSettings, OffsetFrameFallbackStrategy};
///
/// let settings = DocumentSettings::default()
///     .with_recalculate_normals(false)
///     .with_fallback_strategy(OffsetFrameFallbackStrategy::WarpPosition);
///
/// assert_eq!(settings.blend_factor, 1.0);
/// assert!(!settings.recalculate_normals);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DocumentSettings {
    /// Interpolation between the unwarped (0) and fully warped (1) result.
    pub blend_factor: f64,
    /// Recompute normals of warped meshes.
    pub recalculate_normals: bool,
    /// Handling of offset frames that cannot be warped exactly.
    pub fallback_strategy: OffsetFrameFallbackStrategy,
    /// Post-solve adjustments to the fitted spline.
    pub solver: TpsSolverInputs,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            blend_factor: 1.0,
            recalculate_normals: true,
            fallback_strategy: OffsetFrameFallbackStrategy::default(),
            solver: TpsSolverInputs::default(),
        }
    }
}

impl DocumentSettings {
    /// Creates default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the blend factor.
    ///
    /// The value is not validated here; document commands validate it.
    #[must_use]
    pub const fn with_blend_factor(mut self, blend_factor: f64) -> Self {
        self.blend_factor = blend_factor;
        self
    }

    /// Enables or disables normal recomputation.
    #[must_use]
    pub const fn with_recalculate_normals(mut self, enabled: bool) -> Self {
        self.recalculate_normals = enabled;
        self
    }

    /// Sets the offset frame fallback strategy.
    #[must_use]
    pub const fn with_fallback_strategy(mut self, strategy: OffsetFrameFallbackStrategy) -> Self {
        self.fallback_strategy = strategy;
        self
    }

    /// Sets the solver inputs.
    #[must_use]
    pub const fn with_solver(mut self, solver: TpsSolverInputs) -> Self {
        self.solver = solver;
        self
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = DocumentSettings::new();
        assert_eq!(s.blend_factor, 1.0);
        assert!(s.recalculate_normals);
        assert_eq!(s.fallback_strategy, OffsetFrameFallbackStrategy::Error);
        assert!(s.solver.is_exact());
    }

    #[test]
    fn test_check_blend_factor() {
        assert_eq!(check_blend_factor(0.0), Ok(0.0));
        assert_eq!(check_blend_factor(1.0), Ok(1.0));
        assert_eq!(check_blend_factor(0.25), Ok(0.25));
        assert!(check_blend_factor(-0.01).is_err());
        assert!(check_blend_factor(1.01).is_err());
        assert!(check_blend_factor(f64::NAN).is_err());
        assert!(check_blend_factor(f64::INFINITY).is_err());
    }
}
