use std::fmt;

use crate::backend::MultiplyBackend;
use crate::error::{MatrixError, Result};

/// An n×n matrix of `f64` values.
///
/// Holds a single contiguous buffer of n² values in row-major order, so
/// element (i, j) lives at offset `i * n + j`. The shape is fixed at
/// construction; the contents are mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    data: Vec<f64>,
    n: usize,
}

impl SquareMatrix {
    /// Create a matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != n * n`.
    pub fn new(data: Vec<f64>, n: usize) -> Self {
        assert_eq!(
            data.len(),
            n * n,
            "data length {} does not match SquareMatrix of size {} (len={})",
            data.len(),
            n,
            n * n
        );
        SquareMatrix { data, n }
    }

    /// Create a matrix from row-major data, returning an error on a length
    /// mismatch instead of panicking.
    pub fn try_from_vec(data: Vec<f64>, n: usize) -> Result<Self> {
        if data.len() != n * n {
            return Err(MatrixError::LengthMismatch {
                expected: n * n,
                got: data.len(),
            });
        }
        Ok(SquareMatrix { data, n })
    }

    /// Create a zero-filled n×n matrix.
    pub fn zeros(n: usize) -> Self {
        SquareMatrix {
            data: vec![0.0; n * n],
            n,
        }
    }

    /// Create an n×n matrix filled with ones.
    pub fn ones(n: usize) -> Self {
        SquareMatrix {
            data: vec![1.0; n * n],
            n,
        }
    }

    /// Create the n×n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Create an n×n matrix whose element (i, j) is `f(i, j)`.
    pub fn from_fn<F>(n: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(f(i, j));
            }
        }
        SquareMatrix { data, n }
    }

    /// Number of rows (and columns).
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Total number of elements, n².
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for the 0×0 matrix.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the underlying row-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the underlying row-major data mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Returns row `i` as a slice.
    ///
    /// # Panics
    /// Panics if `i >= dim()`.
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.n, "row {} out of range for SquareMatrix of size {}", i, self.n);
        &self.data[i * self.n..(i + 1) * self.n]
    }

    fn is_valid_index(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n
    }

    /// Returns element (i, j).
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            self.is_valid_index(i, j),
            "index ({}, {}) out of range for SquareMatrix of size {}",
            i,
            j,
            self.n
        );
        self.data[i * self.n + j]
    }

    /// Returns element (i, j), or `IndexOutOfRange` if it does not exist.
    pub fn try_get(&self, i: usize, j: usize) -> Result<f64> {
        if !self.is_valid_index(i, j) {
            return Err(MatrixError::IndexOutOfRange {
                row: i,
                col: j,
                size: 1,
                dim: self.n,
            });
        }
        Ok(self.data[i * self.n + j])
    }

    /// Overwrites element (i, j).
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            self.is_valid_index(i, j),
            "index ({}, {}) out of range for SquareMatrix of size {}",
            i,
            j,
            self.n
        );
        self.data[i * self.n + j] = value;
    }

    fn check_same_dim(&self, other: &SquareMatrix) -> Result<()> {
        if self.n != other.n {
            return Err(MatrixError::DimensionMismatch {
                left: self.n,
                right: other.n,
            });
        }
        Ok(())
    }

    /// Element-wise sum, returned as a new matrix.
    pub fn add(&self, other: &SquareMatrix) -> Result<SquareMatrix> {
        self.check_same_dim(other)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(x, y)| x + y)
            .collect();
        Ok(SquareMatrix { data, n: self.n })
    }

    /// Element-wise sum accumulated into `self`.
    pub fn add_assign(&mut self, other: &SquareMatrix) -> Result<()> {
        self.check_same_dim(other)?;
        for (x, y) in self.data.iter_mut().zip(other.data.iter()) {
            *x += y;
        }
        Ok(())
    }

    /// Matrix product `self @ other` using the given backend.
    pub fn multiply(
        &self,
        other: &SquareMatrix,
        backend: &dyn MultiplyBackend,
    ) -> Result<SquareMatrix> {
        self.check_same_dim(other)?;
        backend.multiply(self, other)
    }
}

impl fmt::Display for SquareMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.n {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for (j, v) in self.row(i).iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:.2}", v)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
