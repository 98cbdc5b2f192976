use crate::error::{MatrixError, Result};
use crate::matrix::SquareMatrix;

/// Naive matrix product C = A @ B.
///
/// Computes `C[i][k] = sum_j A[i][j] * B[j][k]` with a plain triple loop in
/// i-k-j order. Each output cell is summed left to right starting from 0.0,
/// so results are bit-reproducible for the same inputs.
pub fn multiply_simple(a: &SquareMatrix, b: &SquareMatrix) -> Result<SquareMatrix> {
    if a.dim() != b.dim() {
        return Err(MatrixError::DimensionMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }

    let n = a.dim();
    let a = a.as_slice();
    let b = b.as_slice();
    let mut c = vec![0.0f64; n * n];
    for i in 0..n {
        for k in 0..n {
            let mut sum = 0.0f64;
            for j in 0..n {
                sum += a[i * n + j] * b[j * n + k];
            }
            c[i * n + k] = sum;
        }
    }
    Ok(SquareMatrix::new(c, n))
}
