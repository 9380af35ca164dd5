//! Utility types and functions for skinio.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Object name helpers (DAG path and namespace stripping)

mod error;
mod names;

pub use error::*;
pub use names::*;
