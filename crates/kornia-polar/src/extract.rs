use log::{debug, trace};
use nalgebra::{DMatrix, Matrix2, Matrix3};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    batch::MatrixBatch,
    error::PolarError,
    matrix::SquareMatrix,
    rotation::{nearest_rotation, nearest_rotation_2d},
};

/// Options of the rotation extraction.
///
/// The serialized form follows the options struct of the host call, i.e.
/// `{"fast2D": true}`. The flag may also be given as a number, non-zero
/// meaning enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Use the closed-form solution for 2x2 matrices instead of the SVD.
    #[serde(rename = "fast2D", default, deserialize_with = "bool_or_number")]
    pub fast_2d: bool,
}

fn bool_or_number<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(f64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Number(value) => value != 0.0,
    })
}

impl ExtractOptions {
    /// Parse the options from a host options struct.
    ///
    /// Fields other than `fast2D` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PolarError::InvalidOptions`] if `value` is not an object or
    /// `fast2D` is neither a boolean nor a number.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PolarError> {
        if !value.is_object() {
            return Err(PolarError::InvalidOptions(format!(
                "expected a struct, got {value}"
            )));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| PolarError::InvalidOptions(e.to_string()))
    }
}

/// The algorithm used for a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPath {
    /// Closed form for 2x2 matrices.
    ClosedForm2d,
    /// SVD on fixed-size 2x2 matrices.
    Svd2,
    /// SVD on fixed-size 3x3 matrices.
    Svd3,
    /// SVD on dynamically sized matrices.
    SvdDynamic,
}

impl RotationPath {
    /// Select the algorithm for matrices of side `side`.
    pub fn select(side: usize, options: &ExtractOptions) -> Self {
        match side {
            2 if options.fast_2d => RotationPath::ClosedForm2d,
            2 => RotationPath::Svd2,
            3 => RotationPath::Svd3,
            _ => RotationPath::SvdDynamic,
        }
    }
}

/// Extracts the rotation factor of every matrix in a batch.
///
/// The extractor holds no state besides its options and can be reused for
/// any number of batches.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchRotationExtractor {
    options: ExtractOptions,
}

impl BatchRotationExtractor {
    /// Create an extractor with the given options.
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// The options of the extractor.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Compute the nearest rotation of every matrix in `batch`.
    ///
    /// # Returns
    ///
    /// A batch of the same shape holding the rotations in input order.
    ///
    /// # Errors
    ///
    /// Returns [`PolarError::NonFiniteInput`] if a matrix has a NaN or
    /// infinite element, on every path, and [`PolarError::SvdNotConverged`]
    /// if the decomposition of a matrix exceeds the iteration limit. No
    /// partial output is returned.
    pub fn extract(&self, batch: &MatrixBatch) -> Result<MatrixBatch, PolarError> {
        let side = batch.matrix_side();
        let path = RotationPath::select(side, &self.options);
        debug!(
            "extracting {} rotations of size {}x{} with {:?}",
            batch.num_matrices(),
            side,
            side,
            path
        );

        let mut rotations = MatrixBatch::zeros(batch.rows(), batch.cols())?;
        match path {
            RotationPath::ClosedForm2d => extract_closed_form_2d(batch, &mut rotations)?,
            RotationPath::Svd2 => extract_svd::<Matrix2<f64>>(batch, &mut rotations)?,
            RotationPath::Svd3 => extract_svd::<Matrix3<f64>>(batch, &mut rotations)?,
            RotationPath::SvdDynamic => extract_svd::<DMatrix<f64>>(batch, &mut rotations)?,
        }

        Ok(rotations)
    }
}

/// Compute the nearest rotation of every matrix in `batch`.
///
/// # Arguments
///
/// * `batch` - The transformation matrices.
/// * `options` - The extraction options.
///
/// # Returns
///
/// A batch of the same shape holding one proper rotation per input matrix.
///
/// Example:
///
/// ```
/// use kornia_polar::{batch::MatrixBatch, extract::{extract_rotations, ExtractOptions}};
///
/// let batch = MatrixBatch::from_vec(2, 2, vec![2.0, 0.0, 0.0, 3.0]).unwrap();
/// let rotations = extract_rotations(&batch, &ExtractOptions::default()).unwrap();
/// for (r, expected) in rotations.as_slice().iter().zip([1.0, 0.0, 0.0, 1.0]) {
///     assert!((r - expected).abs() < 1e-12);
/// }
/// ```
pub fn extract_rotations(
    batch: &MatrixBatch,
    options: &ExtractOptions,
) -> Result<MatrixBatch, PolarError> {
    BatchRotationExtractor::new(*options).extract(batch)
}

fn ensure_finite(index: usize, t: &[f64]) -> Result<(), PolarError> {
    if t.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(PolarError::NonFiniteInput { index })
    }
}

fn extract_svd<M: SquareMatrix>(
    src: &MatrixBatch,
    dst: &mut MatrixBatch,
) -> Result<(), PolarError> {
    let side = src.matrix_side();
    for (index, (t, r)) in src.matrices().zip(dst.matrices_mut()).enumerate() {
        ensure_finite(index, t)?;
        let rotation = nearest_rotation(M::from_column_slice(side, t))
            .ok_or(PolarError::SvdNotConverged { index })?;
        rotation.copy_to_column_slice(r);
    }
    Ok(())
}

fn extract_closed_form_2d(src: &MatrixBatch, dst: &mut MatrixBatch) -> Result<(), PolarError> {
    for (index, (t, r)) in src.matrices().zip(dst.matrices_mut()).enumerate() {
        ensure_finite(index, t)?;
        let t = Matrix2::from_column_slice(t);
        let rotation = match nearest_rotation_2d(&t) {
            Some(rotation) => rotation,
            None => {
                trace!("matrix {index}: closed form is ill-conditioned, using the SVD");
                nearest_rotation(t).ok_or(PolarError::SvdNotConverged { index })?
            }
        };
        r.copy_from_slice(rotation.as_slice());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_select_path() {
        let fast = ExtractOptions { fast_2d: true };
        let slow = ExtractOptions::default();
        assert_eq!(RotationPath::select(2, &fast), RotationPath::ClosedForm2d);
        assert_eq!(RotationPath::select(2, &slow), RotationPath::Svd2);
        assert_eq!(RotationPath::select(3, &fast), RotationPath::Svd3);
        assert_eq!(RotationPath::select(3, &slow), RotationPath::Svd3);
        assert_eq!(RotationPath::select(1, &slow), RotationPath::SvdDynamic);
        assert_eq!(RotationPath::select(4, &fast), RotationPath::SvdDynamic);
    }

    #[test]
    fn test_options_from_value() -> Result<(), PolarError> {
        let options = ExtractOptions::from_value(&serde_json::json!({ "fast2D": true }))?;
        assert!(options.fast_2d);

        let options = ExtractOptions::from_value(&serde_json::json!({ "fast2D": 1 }))?;
        assert!(options.fast_2d);

        let options = ExtractOptions::from_value(&serde_json::json!({ "fast2D": 0.0 }))?;
        assert!(!options.fast_2d);

        let options = ExtractOptions::from_value(&serde_json::json!({ "tolerance": 3 }))?;
        assert_eq!(options, ExtractOptions::default());
        Ok(())
    }

    #[test]
    fn test_options_from_value_invalid() {
        let res = ExtractOptions::from_value(&serde_json::json!(true));
        assert!(matches!(res, Err(PolarError::InvalidOptions(_))));

        let res = ExtractOptions::from_value(&serde_json::json!({ "fast2D": "yes" }));
        assert!(matches!(res, Err(PolarError::InvalidOptions(_))));
    }

    #[test]
    fn test_options_serialize() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(ExtractOptions { fast_2d: true })?;
        assert_eq!(value, serde_json::json!({ "fast2D": true }));
        Ok(())
    }

    #[test]
    fn test_extract_1x1() -> Result<(), PolarError> {
        let batch = MatrixBatch::from_vec(1, 3, vec![2.0, -0.5, 0.0])?;
        let rotations = extract_rotations(&batch, &ExtractOptions::default())?;
        assert_eq!(rotations.shape(), [1, 3]);
        for r in rotations.as_slice() {
            assert_relative_eq!(*r, 1.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_extract_closed_form_fallback() -> Result<(), PolarError> {
        // zero trace: quarter turn, handled by the SVD
        let batch = MatrixBatch::from_vec(2, 2, vec![0.0, 1.0, -1.0, 0.0])?;
        let rotations = extract_rotations(&batch, &ExtractOptions { fast_2d: true })?;
        for (r, t) in rotations.as_slice().iter().zip(batch.as_slice()) {
            assert_relative_eq!(*r, *t, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_extract_non_finite() -> Result<(), PolarError> {
        for side in [2, 3, 4] {
            for fast_2d in [false, true] {
                let options = ExtractOptions { fast_2d };
                for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                    // the second of three identity matrices is corrupted
                    let mut data = Vec::with_capacity(3 * side * side);
                    for _ in 0..3 {
                        let identity = DMatrix::<f64>::identity(side, side);
                        data.extend_from_slice(identity.as_slice());
                    }
                    data[side * side + side - 1] = bad;
                    let batch = MatrixBatch::from_vec(side, 3 * side, data)?;
                    assert_eq!(
                        extract_rotations(&batch, &options),
                        Err(PolarError::NonFiniteInput { index: 1 })
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_extract_empty() -> Result<(), PolarError> {
        let batch = MatrixBatch::zeros(3, 0)?;
        let rotations = extract_rotations(&batch, &ExtractOptions::default())?;
        assert!(rotations.is_empty());
        assert_eq!(rotations.shape(), [3, 0]);
        Ok(())
    }

    #[test]
    fn test_extractor_reuse() -> Result<(), PolarError> {
        let extractor = BatchRotationExtractor::new(ExtractOptions { fast_2d: true });
        assert!(extractor.options().fast_2d);
        let batch = MatrixBatch::from_vec(2, 2, vec![2.0, 0.0, 0.0, 3.0])?;
        let first = extractor.extract(&batch)?;
        let second = extractor.extract(&batch)?;
        assert_eq!(first, second);
        Ok(())
    }
}
