/// An error type for the polar rotation extraction.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PolarError {
    /// The host call did not provide at least one input and exactly one output.
    #[error("Minimum one input and one output parameter required (got {inputs} inputs, {outputs} outputs)")]
    InvalidArity {
        /// Number of inputs supplied by the caller.
        inputs: usize,
        /// Number of outputs requested by the caller.
        outputs: usize,
    },

    /// The buffer width is not a multiple of the matrix side length.
    #[error("Invalid input (inconsistent dimensions): {cols} columns is not a multiple of {rows} rows")]
    InconsistentDimensions {
        /// Number of rows of the buffer, i.e. the matrix side length.
        rows: usize,
        /// Number of columns of the buffer.
        cols: usize,
    },

    /// The storage length does not match the declared shape.
    #[error("Data length ({actual}) does not match the buffer size ({expected})")]
    BufferSizeMismatch {
        /// Number of elements implied by the shape.
        expected: usize,
        /// Number of elements actually provided.
        actual: usize,
    },

    /// A host argument has the wrong kind.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The options struct could not be parsed.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// A matrix of the batch has a NaN or infinite element.
    #[error("Matrix {index} has non-finite elements")]
    NonFiniteInput {
        /// Position of the offending matrix in the batch.
        index: usize,
    },

    /// The singular value decomposition did not converge.
    #[error("SVD did not converge for matrix {index}")]
    SvdNotConverged {
        /// Position of the offending matrix in the batch.
        index: usize,
    },
}
