//! Dense square matrices supporting the operations the rotation extraction needs.
//!
//! The same algorithm runs on fixed-size 2x2 and 3x3 matrices, which live on
//! the stack and unroll well, and on dynamically sized matrices for every
//! other side length. [`SquareMatrix`] is the seam between the algorithm and
//! the concrete nalgebra types.

use nalgebra::{DMatrix, Matrix2, Matrix3, SVD};

/// Convergence threshold of the SVD solver, the one nalgebra's `SVD::new` uses.
pub const SVD_EPSILON: f64 = 5.0 * f64::EPSILON;

/// Maximum number of solver iterations before the SVD is declared divergent.
///
/// Finite input converges within a few sweeps per singular value.
pub const SVD_MAX_ITERATIONS: usize = 10_000;

/// The orthogonal factors of a singular value decomposition `T = U * S * V^T`.
#[derive(Clone, Debug)]
pub struct SvdFactors<M> {
    /// The left singular vectors, one per column.
    pub u: M,
    /// The transposed right singular vectors, one per row.
    pub v_t: M,
    /// Index of the smallest singular value.
    pub smallest: usize,
}

/// A dense real square matrix with SVD, trace and determinant.
pub trait SquareMatrix: Sized {
    /// Build a `side x side` matrix from column-major data.
    ///
    /// PRECONDITION: `data.len() == side * side`.
    fn from_column_slice(side: usize, data: &[f64]) -> Self;

    /// Write the matrix into `out` in column-major order.
    ///
    /// PRECONDITION: `out.len() == side * side`.
    fn copy_to_column_slice(&self, out: &mut [f64]);

    /// Whether every element is neither NaN nor infinite.
    fn is_finite(&self) -> bool;

    /// Sum of the diagonal elements.
    fn trace(&self) -> f64;

    /// Determinant of the matrix.
    fn determinant(&self) -> f64;

    /// Matrix product `self * rhs`.
    fn product(&self, rhs: &Self) -> Self;

    /// Negate the column at index `col` in place.
    fn negate_column(&mut self, col: usize);

    /// Full singular value decomposition, or `None` if the solver diverged.
    fn svd(self) -> Option<SvdFactors<Self>>;
}

fn smallest_index<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::INFINITY), |(best, min), (i, &s)| {
            if s < min {
                (i, s)
            } else {
                (best, min)
            }
        })
        .0
}

macro_rules! impl_square_matrix {
    ($mat:ty, |$side:ident, $data:ident| $from:expr) => {
        impl SquareMatrix for $mat {
            #[inline]
            fn from_column_slice($side: usize, $data: &[f64]) -> Self {
                debug_assert_eq!($side * $side, $data.len());
                $from
            }

            #[inline]
            fn copy_to_column_slice(&self, out: &mut [f64]) {
                out.copy_from_slice(self.as_slice());
            }

            #[inline]
            fn trace(&self) -> f64 {
                self.trace()
            }

            #[inline]
            fn is_finite(&self) -> bool {
                self.iter().all(|x| x.is_finite())
            }

            #[inline]
            fn determinant(&self) -> f64 {
                self.determinant()
            }

            #[inline]
            fn product(&self, rhs: &Self) -> Self {
                self * rhs
            }

            #[inline]
            fn negate_column(&mut self, col: usize) {
                self.column_mut(col).scale_mut(-1.0);
            }

            fn svd(self) -> Option<SvdFactors<Self>> {
                let svd = SVD::try_new(self, true, true, SVD_EPSILON, SVD_MAX_ITERATIONS)?;
                let smallest = smallest_index(svd.singular_values.iter());
                Some(SvdFactors {
                    u: svd.u?,
                    v_t: svd.v_t?,
                    smallest,
                })
            }
        }
    };
}

impl_square_matrix!(Matrix2<f64>, |side, data| Matrix2::from_column_slice(data));
impl_square_matrix!(Matrix3<f64>, |side, data| Matrix3::from_column_slice(data));
impl_square_matrix!(DMatrix<f64>, |side, data| DMatrix::from_column_slice(
    side, side, data
));
