//! Entry point for hosts passing untyped argument lists.
//!
//! A host runtime calls the extraction with a list of input values and the
//! number of outputs it expects. The first input is the matrix buffer, the
//! optional second one an options struct with a `fast2D` field.

use crate::{
    batch::MatrixBatch,
    error::PolarError,
    extract::{extract_rotations, ExtractOptions},
};

/// A value passed by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    /// A matrix buffer.
    Matrix(MatrixBatch),
    /// A struct of named fields.
    Struct(serde_json::Value),
}

impl From<MatrixBatch> for HostValue {
    fn from(batch: MatrixBatch) -> Self {
        HostValue::Matrix(batch)
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        HostValue::Struct(value)
    }
}

/// Compute the rotation factor of every matrix passed by the host.
///
/// # Arguments
///
/// * `inputs` - The matrix buffer, optionally followed by an options struct.
///   Further inputs are ignored.
/// * `num_outputs` - The number of outputs the host expects, must be one.
///
/// # Returns
///
/// A single-element vector holding the rotations.
///
/// # Errors
///
/// * [`PolarError::InvalidArity`] if there are no inputs or the host does not
///   expect exactly one output.
/// * [`PolarError::InvalidArgument`] if the first input is not a matrix.
/// * [`PolarError::InvalidOptions`] if the second input is not a valid options struct.
///
/// Example:
///
/// ```
/// use kornia_polar::{batch::MatrixBatch, host::{polar_rotations, HostValue}};
///
/// let batch = MatrixBatch::from_vec(2, 2, vec![2.0, 0.0, 0.0, 3.0]).unwrap();
/// let inputs = [
///     HostValue::from(batch),
///     HostValue::from(serde_json::json!({ "fast2D": true })),
/// ];
/// let outputs = polar_rotations(&inputs, 1).unwrap();
/// assert_eq!(outputs.len(), 1);
/// assert_eq!(outputs[0].shape(), [2, 2]);
/// ```
pub fn polar_rotations(
    inputs: &[HostValue],
    num_outputs: usize,
) -> Result<Vec<MatrixBatch>, PolarError> {
    if inputs.is_empty() || num_outputs != 1 {
        return Err(PolarError::InvalidArity {
            inputs: inputs.len(),
            outputs: num_outputs,
        });
    }

    let batch = match &inputs[0] {
        HostValue::Matrix(batch) => batch,
        HostValue::Struct(_) => {
            return Err(PolarError::InvalidArgument(
                "the first input must be a matrix".to_string(),
            ))
        }
    };

    let options = match inputs.get(1) {
        None => ExtractOptions::default(),
        Some(HostValue::Struct(value)) => ExtractOptions::from_value(value)?,
        Some(HostValue::Matrix(_)) => {
            return Err(PolarError::InvalidOptions(
                "the second input must be a struct".to_string(),
            ))
        }
    };

    Ok(vec![extract_rotations(batch, &options)?])
}
