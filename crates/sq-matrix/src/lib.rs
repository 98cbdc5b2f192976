//! `sq-matrix` - Dense square matrices for the sq-parallel multiply engine.
//!
//! This crate provides:
//! - A `SquareMatrix` type backed by a flat row-major `f64` buffer
//! - The naive O(n³) leaf multiply used as the base case
//! - Block extraction and installation at arbitrary offsets
//! - A `MultiplyBackend` trait for pluggable multiply strategies
//! - A reference `SimpleBackend` implementation

pub mod backend;
pub mod block;
pub mod error;
pub mod matrix;
pub mod ops;

// Re-export primary types at the crate root for convenience.
pub use backend::{MultiplyBackend, SimpleBackend};
pub use block::{extract_block, install_block, BlockCoord};
pub use error::{MatrixError, Result};
pub use matrix::SquareMatrix;
pub use ops::multiply_simple;
