//! Point evaluation with blending.

use crate::TpsCoefficients;
use nalgebra::Point3;
use rayon::prelude::*;

/// Point count above which [`warp_points`] evaluates in parallel.
pub const PARALLEL_THRESHOLD: usize = 8192;

/// Warps a single point and blends the result with the original.
///
/// `blend_factor` of `0.0` returns `point` untouched, `1.0` returns the fully
/// warped point, and values in between interpolate linearly. Values outside
/// `[0, 1]` extrapolate; callers that accept user input should validate the
/// factor first.
///
/// # Examples
///
/// ```
/// use warp_tps::{warp_point, TpsCoefficients};
/// use nalgebra::Point3;
///
/// let mut coefs = TpsCoefficients::identity();
/// coefs.affine[(0, 0)] = 2.0; // translate +2 in x
///
/// let p = Point3::new(0.0, 0.0, 0.0);
/// assert_eq!(warp_point(&coefs, &p, 0.0), p);
/// assert_eq!(warp_point(&coefs, &p, 0.5), Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(warp_point(&coefs, &p, 1.0), Point3::new(2.0, 0.0, 0.0));
/// ```
#[inline]
#[must_use]
pub fn warp_point(coefs: &TpsCoefficients, point: &Point3<f64>, blend_factor: f64) -> Point3<f64> {
    if blend_factor == 0.0 {
        return *point;
    }
    let warped = coefs.evaluate(point);
    point.lerp(&warped, blend_factor)
}

/// Warps a slice of points in place.
///
/// Large slices are split across the rayon thread pool; small ones are
/// processed sequentially.
pub fn warp_points(coefs: &TpsCoefficients, points: &mut [Point3<f64>], blend_factor: f64) {
    if points.len() > PARALLEL_THRESHOLD {
        points
            .par_iter_mut()
            .for_each(|p| *p = warp_point(coefs, p, blend_factor));
    } else {
        for p in points.iter_mut() {
            *p = warp_point(coefs, p, blend_factor);
        }
    }
}

/// Returns warped copies of `points`.
#[must_use]
pub fn warped_points(
    coefs: &TpsCoefficients,
    points: &[Point3<f64>],
    blend_factor: f64,
) -> Vec<Point3<f64>> {
    let mut out = points.to_vec();
    warp_points(coefs, &mut out, blend_factor);
    out
}
