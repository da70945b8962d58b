#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Flat buffers of concatenated square matrices.
pub mod batch;

/// Error types for the rotation extraction.
pub mod error;

/// Batched rotation extraction and its options.
pub mod extract;

/// Host-call entry point.
pub mod host;

/// Square matrix capabilities over fixed and dynamic sizes.
pub mod matrix;

/// Nearest rotation of a single matrix.
pub mod rotation;

pub use batch::MatrixBatch;
pub use error::PolarError;
pub use extract::{extract_rotations, BatchRotationExtractor, ExtractOptions, RotationPath};
