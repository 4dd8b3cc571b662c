//! Solver configuration.
//!
//! [`TpsSolverInputs`] controls which parts of a solved warp are kept. The
//! solve itself always fits the full affine + non-affine system; the flags
//! are applied to the resulting coefficients afterwards.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Post-solve adjustments applied to thin-plate-spline coefficients.
///
/// All flags default to `true`, which keeps the exact interpolating warp.
///
/// # Examples
///
/// ```
/// use warp_tps::TpsSolverInputs;
///
/// // Keep only the non-affine bending; drop the rigid translation.
/// let inputs = TpsSolverInputs::default().with_affine_translation(false);
/// assert!(!inputs.apply_affine_translation);
/// assert!(inputs.apply_non_affine_warp);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TpsSolverInputs {
    /// Keep the constant (translation) term of the affine part.
    pub apply_affine_translation: bool,
    /// Keep the scale of the affine basis vectors.
    ///
    /// When disabled, the x/y/z affine columns are normalized to unit length.
    pub apply_affine_scale: bool,
    /// Keep the rotational/shear part of the affine basis vectors.
    ///
    /// When disabled, each affine basis vector is replaced by an
    /// axis-aligned vector of the same magnitude.
    pub apply_affine_rotation: bool,
    /// Keep the non-affine (bending) terms.
    pub apply_non_affine_warp: bool,
}

impl Default for TpsSolverInputs {
    fn default() -> Self {
        Self {
            apply_affine_translation: true,
            apply_affine_scale: true,
            apply_affine_rotation: true,
            apply_non_affine_warp: true,
        }
    }
}

impl TpsSolverInputs {
    /// Creates the default inputs (exact interpolating warp).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates inputs that keep only the affine part of the warp.
    ///
    /// # Examples
    ///
    /// ```
    /// use warp_tps::TpsSolverInputs;
    ///
    /// let inputs = TpsSolverInputs::affine_only();
    /// assert!(!inputs.apply_non_affine_warp);
    /// ```
    #[must_use]
    pub fn affine_only() -> Self {
        Self {
            apply_non_affine_warp: false,
            ..Self::default()
        }
    }

    /// Enables or disables the affine translation term.
    #[must_use]
    pub const fn with_affine_translation(mut self, enabled: bool) -> Self {
        self.apply_affine_translation = enabled;
        self
    }

    /// Enables or disables affine scaling.
    #[must_use]
    pub const fn with_affine_scale(mut self, enabled: bool) -> Self {
        self.apply_affine_scale = enabled;
        self
    }

    /// Enables or disables affine rotation.
    #[must_use]
    pub const fn with_affine_rotation(mut self, enabled: bool) -> Self {
        self.apply_affine_rotation = enabled;
        self
    }

    /// Enables or disables the non-affine warp.
    #[must_use]
    pub const fn with_non_affine_warp(mut self, enabled: bool) -> Self {
        self.apply_non_affine_warp = enabled;
        self
    }

    /// Returns whether these inputs keep the exact interpolating warp.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.apply_affine_translation
            && self.apply_affine_scale
            && self.apply_affine_rotation
            && self.apply_non_affine_warp
    }
}
