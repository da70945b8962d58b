use serde::{Deserialize, Serialize};

use crate::error::PolarError;

/// A batch of square matrices packed into one flat buffer.
///
/// The buffer is read as a `rows x cols` column-major matrix. Every block of
/// `rows` consecutive columns holds one `rows x rows` matrix, so the batch
/// holds `cols / rows` matrices, each stored as `rows * rows` contiguous
/// column-major elements.
///
/// # Examples
///
/// ```
/// use kornia_polar::batch::MatrixBatch;
///
/// // two 2x2 matrices: the identity and a quarter turn
/// let batch = MatrixBatch::from_vec(2, 4, vec![
///     1.0, 0.0, 0.0, 1.0,
///     0.0, 1.0, -1.0, 0.0,
/// ]).unwrap();
///
/// assert_eq!(batch.matrix_side(), 2);
/// assert_eq!(batch.num_matrices(), 2);
/// assert_eq!(batch.matrix(1), Some(&[0.0, 1.0, -1.0, 0.0][..]));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BatchData")]
pub struct MatrixBatch {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct BatchData {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<BatchData> for MatrixBatch {
    type Error = PolarError;

    fn try_from(raw: BatchData) -> Result<Self, Self::Error> {
        MatrixBatch::from_vec(raw.rows, raw.cols, raw.data)
    }
}

/// Checks that a `rows x cols` buffer splits into whole square matrices.
fn check_dimensions(rows: usize, cols: usize) -> Result<(), PolarError> {
    if rows == 0 || cols % rows != 0 {
        return Err(PolarError::InconsistentDimensions { rows, cols });
    }
    Ok(())
}

impl MatrixBatch {
    /// Create a batch from its shape and column-major data.
    ///
    /// # Arguments
    ///
    /// * `rows` - The side length of every matrix in the batch.
    /// * `cols` - The total number of columns, a multiple of `rows`.
    /// * `data` - The `rows * cols` elements in column-major order.
    ///
    /// # Errors
    ///
    /// Returns [`PolarError::InconsistentDimensions`] if `cols` is not a
    /// multiple of `rows` (or `rows` is zero) and
    /// [`PolarError::BufferSizeMismatch`] if `data` has the wrong length.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, PolarError> {
        check_dimensions(rows, cols)?;
        if data.len() != rows * cols {
            return Err(PolarError::BufferSizeMismatch {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a zero-filled batch of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, PolarError> {
        Self::from_vec(rows, cols, vec![0.0; rows * cols])
    }

    /// Create a batch by concatenating column-major `side x side` matrices.
    ///
    /// # Errors
    ///
    /// Returns [`PolarError::BufferSizeMismatch`] if one of the slices does
    /// not hold exactly `side * side` elements.
    pub fn from_matrices<'a, I>(side: usize, matrices: I) -> Result<Self, PolarError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        check_dimensions(side, 0)?;
        let stride = side * side;
        let mut data = Vec::new();
        for matrix in matrices {
            if matrix.len() != stride {
                return Err(PolarError::BufferSizeMismatch {
                    expected: stride,
                    actual: matrix.len(),
                });
            }
            data.extend_from_slice(matrix);
        }
        let cols = data.len() / side;
        Self::from_vec(side, cols, data)
    }

    /// Number of rows of the buffer.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns of the buffer.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The buffer shape as `[rows, cols]`.
    #[inline]
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Side length of every matrix in the batch.
    #[inline]
    pub fn matrix_side(&self) -> usize {
        self.rows
    }

    /// Number of matrices in the batch.
    #[inline]
    pub fn num_matrices(&self) -> usize {
        self.cols / self.rows
    }

    /// Whether the batch holds no matrices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cols == 0
    }

    /// The whole buffer in column-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the batch and return its storage.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// The column-major elements of the matrix at `index`, if any.
    pub fn matrix(&self, index: usize) -> Option<&[f64]> {
        let stride = self.rows * self.rows;
        self.data.get(index * stride..(index + 1) * stride)
    }

    /// Iterate over the matrices of the batch in order.
    pub fn matrices(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.rows * self.rows)
    }

    /// Iterate mutably over the matrices of the batch in order.
    pub fn matrices_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.rows * self.rows)
    }
}
