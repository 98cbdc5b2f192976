use std::fmt::Debug;

use crate::error::Result;
use crate::matrix::SquareMatrix;
use crate::ops::multiply_simple;

/// Trait for pluggable multiply strategies (naive, block-parallel, etc.).
///
/// Operands are borrowed and never mutated; every operation returns a newly
/// allocated matrix.
pub trait MultiplyBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "simple", "parallel").
    fn name(&self) -> &str;

    /// Matrix product: C = A @ B, for equal-size square operands.
    fn multiply(&self, a: &SquareMatrix, b: &SquareMatrix) -> Result<SquareMatrix>;

    /// Element-wise addition: C[i][j] = A[i][j] + B[i][j].
    fn add(&self, a: &SquareMatrix, b: &SquareMatrix) -> Result<SquareMatrix> {
        a.add(b)
    }
}

/// Single-threaded backend running the naive triple loop.
///
/// Serves as the correctness reference for the parallel engine.
#[derive(Debug, Clone)]
pub struct SimpleBackend;

impl SimpleBackend {
    pub fn new() -> Self {
        SimpleBackend
    }
}

impl Default for SimpleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiplyBackend for SimpleBackend {
    fn name(&self) -> &str {
        "simple"
    }

    fn multiply(&self, a: &SquareMatrix, b: &SquareMatrix) -> Result<SquareMatrix> {
        multiply_simple(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(SimpleBackend::new().name(), "simple");
    }

    #[test]
    fn test_add_via_backend() {
        let backend = SimpleBackend::default();
        let a = SquareMatrix::new(vec![1.0, 2.0, 3.0, 4.0], 2);
        let r = backend.add(&a, &a).unwrap();
        assert_eq!(r.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_add_dimension_mismatch() {
        let backend = SimpleBackend::new();
        assert!(backend
            .add(&SquareMatrix::zeros(1), &SquareMatrix::zeros(2))
            .is_err());
    }
}
