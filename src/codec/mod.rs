//! Sparse weight codec.
//!
//! Pure conversion between the dense per-vertex weight grid a scene provides
//! and the compact nonzero encoding stored in skin records. No I/O happens here
//! and inputs are never mutated.

mod dense;
mod sparse;

pub use dense::DenseWeightMatrix;
pub use sparse::{compress, decompress, SparseWeights};
