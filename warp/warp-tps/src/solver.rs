//! Thin-plate-spline coefficient solving.
//!
//! A 3D TPS warp is the sum of an affine map and a weighted set of radial
//! basis terms centred on the source landmarks:
//!
//! ```text
//! f(p) = a1 + a2·p.x + a3·p.y + a4·p.z + Σ wᵢ · U(|cᵢ - p|)
//! ```
//!
//! The coefficients are found by solving the augmented system
//!
//! ```text
//! | K  P | |w|   |dst|
//! | Pᵗ 0 | |a| = | 0 |
//! ```
//!
//! where `K[i][j] = U(|sᵢ - sⱼ|)` and `P` has rows `[1, xᵢ, yᵢ, zᵢ]`. All three
//! output channels share the same matrix, so it is factored once and solved
//! against a three-column right-hand side.

use crate::{SolverError, SolverResult, TpsSolverInputs};
use nalgebra::{DMatrix, Matrix4x3, Point3, Vector3, Vector4};
use tracing::debug;
use warp_types::LandmarkPair;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of pairs for a well-posed solve.
///
/// The affine part alone has four unknowns per channel.
pub const MIN_LANDMARK_PAIRS: usize = 4;

/// Systems whose smallest/largest singular value ratio falls below this are
/// rejected as ill-conditioned.
pub const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;

/// The 3D radial basis kernel, `U(r) = r`.
///
/// The same kernel is used while fitting and while evaluating.
///
/// # Examples
///
/// ```
/// use warp_tps::radial_basis;
///
/// assert_eq!(radial_basis(0.0), 0.0);
/// assert_eq!(radial_basis(2.5), 2.5);
/// ```
#[inline]
#[must_use]
pub const fn radial_basis(r: f64) -> f64 {
    r
}

/// One radial basis term: a weight and the control point it is centred on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NonAffineTerm {
    /// Per-channel weight (x, y, z).
    pub weight: Vector3<f64>,
    /// Source-side landmark the kernel is evaluated relative to.
    pub control_point: Point3<f64>,
}

impl NonAffineTerm {
    /// Create a new term.
    #[must_use]
    pub const fn new(weight: Vector3<f64>, control_point: Point3<f64>) -> Self {
        Self {
            weight,
            control_point,
        }
    }
}

/// Solved coefficients of a 3D thin-plate-spline warp.
///
/// The affine part is stored as a 4×3 matrix whose rows are `a1`
/// (translation), `a2` (x), `a3` (y) and `a4` (z). The non-affine part is an
/// ordered list of terms whose control points are exactly the source
/// landmarks used in the fit, in the order they were supplied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TpsCoefficients {
    /// Affine coefficients, one row per term `[1, x, y, z]`.
    pub affine: Matrix4x3<f64>,
    /// Radial basis terms, in control-point order.
    pub non_affine: Vec<NonAffineTerm>,
}

impl Default for TpsCoefficients {
    fn default() -> Self {
        Self::identity()
    }
}

impl TpsCoefficients {
    /// Coefficients of the identity map.
    ///
    /// # Examples
    ///
    /// ```
    /// use warp_tps::TpsCoefficients;
    /// use nalgebra::Point3;
    ///
    /// let identity = TpsCoefficients::identity();
    /// let p = Point3::new(1.0, -2.0, 3.0);
    /// assert_eq!(identity.evaluate(&p), p);
    /// ```
    #[must_use]
    pub fn identity() -> Self {
        let mut affine = Matrix4x3::zeros();
        affine[(1, 0)] = 1.0;
        affine[(2, 1)] = 1.0;
        affine[(3, 2)] = 1.0;
        Self {
            affine,
            non_affine: Vec::new(),
        }
    }

    /// The translation term `a1`.
    #[must_use]
    pub fn a1(&self) -> Vector3<f64> {
        self.affine.row(0).transpose()
    }

    /// The x coefficient `a2`.
    #[must_use]
    pub fn a2(&self) -> Vector3<f64> {
        self.affine.row(1).transpose()
    }

    /// The y coefficient `a3`.
    #[must_use]
    pub fn a3(&self) -> Vector3<f64> {
        self.affine.row(2).transpose()
    }

    /// The z coefficient `a4`.
    #[must_use]
    pub fn a4(&self) -> Vector3<f64> {
        self.affine.row(3).transpose()
    }

    /// Number of control points.
    #[must_use]
    pub fn num_control_points(&self) -> usize {
        self.non_affine.len()
    }

    /// Iterates the control points in fitting order.
    pub fn control_points(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.non_affine.iter().map(|t| t.control_point)
    }

    /// Evaluates only the affine part at `p`.
    #[must_use]
    pub fn evaluate_affine(&self, p: &Point3<f64>) -> Point3<f64> {
        let basis = Vector4::new(1.0, p.x, p.y, p.z);
        Point3::from(self.affine.tr_mul(&basis))
    }

    /// Evaluates the full warp at `p`.
    #[must_use]
    pub fn evaluate(&self, p: &Point3<f64>) -> Point3<f64> {
        let mut out = self.evaluate_affine(p);
        for term in &self.non_affine {
            out += term.weight * radial_basis((term.control_point - p).norm());
        }
        out
    }

    fn set_row(&mut self, row: usize, v: &Vector3<f64>) {
        for c in 0..3 {
            self.affine[(row, c)] = v[c];
        }
    }

    /// Applies the post-solve flags in `inputs`.
    fn apply_inputs(&mut self, inputs: &TpsSolverInputs) {
        if !inputs.apply_affine_translation {
            self.set_row(0, &Vector3::zeros());
        }
        if !inputs.apply_affine_scale {
            for row in 1..4 {
                let v = self.affine.row(row).transpose();
                let unit = v.try_normalize(f64::EPSILON).unwrap_or(v);
                self.set_row(row, &unit);
            }
        }
        if !inputs.apply_affine_rotation {
            for (axis, row) in (1..4).enumerate() {
                let magnitude = self.affine.row(row).norm();
                let mut v = Vector3::zeros();
                v[axis] = magnitude;
                self.set_row(row, &v);
            }
        }
        if !inputs.apply_non_affine_warp {
            self.non_affine.clear();
        }
    }
}

/// Solves TPS coefficients from an ordered sequence of landmark pairs.
///
/// The order of `pairs` is significant: it fixes the order of the control
/// points in the result.
///
/// # Errors
///
/// Returns an error if:
/// - Fewer than [`MIN_LANDMARK_PAIRS`] pairs are provided
/// - Any pair has a non-finite coordinate
/// - The system is singular or nearly so (duplicate or coplanar sources)
///
/// # Examples
///
/// ```
/// use warp_tps::{solve_pairs, TpsSolverInputs};
/// use warp_types::LandmarkPair;
/// use nalgebra::Point3;
///
/// // A uniform 2x scale about the origin
/// let pairs = [
///     LandmarkPair::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)),
///     LandmarkPair::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)),
///     LandmarkPair::new(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 2.0, 0.0)),
///     LandmarkPair::new(Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 2.0)),
/// ];
///
/// let coefs = solve_pairs(&pairs, &TpsSolverInputs::default()).unwrap();
/// let warped = coefs.evaluate(&Point3::new(1.0, 1.0, 1.0));
/// assert!((warped - Point3::new(2.0, 2.0, 2.0)).norm() < 1e-6);
/// ```
pub fn solve_pairs(
    pairs: &[LandmarkPair],
    inputs: &TpsSolverInputs,
) -> SolverResult<TpsCoefficients> {
    let n = pairs.len();
    if n < MIN_LANDMARK_PAIRS {
        return Err(SolverError::UnderdeterminedSystem {
            required: MIN_LANDMARK_PAIRS,
            provided: n,
        });
    }
    if let Some(index) = pairs.iter().position(|p| !p.is_finite()) {
        return Err(SolverError::NonFiniteLandmark { index });
    }

    let size = n + 4;
    let mut matrix = DMatrix::<f64>::zeros(size, size);

    // K block (symmetric, zero diagonal since U(0) = 0)
    for i in 0..n {
        for j in (i + 1)..n {
            let k = radial_basis((pairs[i].source - pairs[j].source).norm());
            matrix[(i, j)] = k;
            matrix[(j, i)] = k;
        }
    }

    // P and Pᵗ blocks; the bottom-right 4x4 stays zero
    for (i, pair) in pairs.iter().enumerate() {
        let s = &pair.source;
        let row = [1.0, s.x, s.y, s.z];
        for (c, v) in row.into_iter().enumerate() {
            matrix[(i, n + c)] = v;
            matrix[(n + c, i)] = v;
        }
    }

    // One column per output channel
    let mut rhs = DMatrix::<f64>::zeros(size, 3);
    for (i, pair) in pairs.iter().enumerate() {
        rhs[(i, 0)] = pair.destination.x;
        rhs[(i, 1)] = pair.destination.y;
        rhs[(i, 2)] = pair.destination.z;
    }

    let svd = matrix.svd(true, true);
    let max_sv = svd.singular_values.max();
    let min_sv = svd.singular_values.min();
    let reciprocal_condition = if max_sv > 0.0 { min_sv / max_sv } else { 0.0 };

    debug!(
        pairs = n,
        reciprocal_condition, "Solving TPS coefficients"
    );

    if !reciprocal_condition.is_finite() || reciprocal_condition < MIN_RECIPROCAL_CONDITION {
        return Err(SolverError::IllConditionedSystem {
            reciprocal_condition,
        });
    }

    let solution = svd
        .solve(&rhs, max_sv * MIN_RECIPROCAL_CONDITION)
        .map_err(|_| SolverError::IllConditionedSystem {
            reciprocal_condition,
        })?;

    let affine = Matrix4x3::from_fn(|r, c| solution[(n + r, c)]);
    let non_affine = pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            NonAffineTerm::new(
                Vector3::new(solution[(i, 0)], solution[(i, 1)], solution[(i, 2)]),
                pair.source,
            )
        })
        .collect();

    let mut coefficients = TpsCoefficients { affine, non_affine };
    coefficients.apply_inputs(inputs);
    Ok(coefficients)
}
