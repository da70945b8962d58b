//! Nearest rotation of a single square matrix.
//!
//! Given a transformation `T`, the rotation factor `R` of its polar
//! decomposition `T = R * S` is the proper rotation closest to `T` in the
//! Frobenius norm. It is computed from the singular value decomposition
//! `T = U * S * V^T` as `R = U * V^T`, flipping the least significant singular
//! direction when `U * V^T` would be a reflection.
//!
//! For 2x2 matrices a rotation is a single angle, which allows a closed form
//! without any decomposition, see [`nearest_rotation_2d`].

use nalgebra::Matrix2;

use crate::matrix::SquareMatrix;

/// Relative trace magnitude below which the 2x2 closed form is not used.
pub const FAST_2D_TRACE_EPSILON: f64 = 1e-8;

/// Compute the rotation closest to `t` through its singular value decomposition.
///
/// # Arguments
///
/// * `t` - The transformation matrix. May be singular or contain a reflection.
///
/// # Returns
///
/// The proper rotation `R` minimizing `|t - R|_F`, or `None` if `t` has
/// non-finite elements or the SVD solver did not converge.
///
/// Rank-deficient input yields one of the equally close rotations.
///
/// Example:
///
/// ```
/// use kornia_polar::rotation::nearest_rotation;
/// use nalgebra::Matrix3;
///
/// let t = Matrix3::from_diagonal(&nalgebra::Vector3::new(1.0, 1.0, -1.0));
/// let r = nearest_rotation(t).unwrap();
/// assert!((r.determinant() - 1.0).abs() < 1e-12);
/// ```
pub fn nearest_rotation<M: SquareMatrix>(t: M) -> Option<M> {
    if !t.is_finite() {
        return None;
    }
    let svd = t.svd()?;

    if svd.u.determinant() * svd.v_t.determinant() >= 0.0 {
        return Some(svd.u.product(&svd.v_t));
    }

    // U * V^T is a reflection: R = U * diag(1, .., 1, -1) * V^T with the -1
    // on the smallest singular value
    let mut u = svd.u;
    u.negate_column(svd.smallest);
    Some(u.product(&svd.v_t))
}

/// Compute the rotation closest to a 2x2 matrix in closed form.
///
/// The rotation by angle `θ` closest to `t` maximizes
/// `trace(R^T * t) = cos(θ) * (t00 + t11) + sin(θ) * (t10 - t01)`, hence
/// `tan(θ) = (t10 - t01) / trace(t)` with `cos(θ)` carrying the sign of the
/// trace.
///
/// # Returns
///
/// The rotation, or `None` when the closed form is ill-conditioned, i.e. the
/// trace is negligible with respect to the norm of `t`, or when `t` has
/// non-finite elements. Callers then fall back to [`nearest_rotation`].
///
/// Example:
///
/// ```
/// use kornia_polar::rotation::nearest_rotation_2d;
/// use nalgebra::Matrix2;
///
/// let r = nearest_rotation_2d(&Matrix2::new(2.0, 0.0, 0.0, 3.0)).unwrap();
/// assert_eq!(r, Matrix2::identity());
///
/// // zero trace has no closed form
/// assert!(nearest_rotation_2d(&Matrix2::new(0.0, -1.0, 1.0, 0.0)).is_none());
/// ```
pub fn nearest_rotation_2d(t: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let trace = t.trace();
    if trace.abs() <= FAST_2D_TRACE_EPSILON * t.norm() {
        return None;
    }

    let offdiff = t[(0, 1)] - t[(1, 0)];
    let off_term = offdiff / trace;
    // the sign of the trace selects the closest of the two rotations
    // sharing tan(θ), the other one is the farthest from t
    let denom = trace.signum() / (off_term * off_term + 1.0).sqrt();

    let r = Matrix2::new(denom, off_term * denom, -off_term * denom, denom);

    // det(r) is 1 by construction, only overflow can break it
    if !r.iter().all(|x| x.is_finite()) {
        return None;
    }

    Some(r)
}
