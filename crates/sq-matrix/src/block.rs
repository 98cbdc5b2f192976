use crate::error::{MatrixError, Result};
use crate::matrix::SquareMatrix;

/// Position of one block in a p×p block grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockCoord {
    pub row: usize,
    pub col: usize,
}

impl BlockCoord {
    pub fn new(row: usize, col: usize) -> Self {
        BlockCoord { row, col }
    }

    /// Element offset `(row * size, col * size)` of this block's top-left
    /// corner in the enclosing matrix.
    pub fn offset(&self, block_size: usize) -> (usize, usize) {
        (self.row * block_size, self.col * block_size)
    }
}

fn check_window(dim: usize, row_offset: usize, col_offset: usize, size: usize) -> Result<()> {
    let fits = |offset: usize| offset.checked_add(size).is_some_and(|end| end <= dim);
    if !fits(row_offset) || !fits(col_offset) {
        return Err(MatrixError::IndexOutOfRange {
            row: row_offset,
            col: col_offset,
            size,
            dim,
        });
    }
    Ok(())
}

/// Copies the `size`×`size` window of `m` starting at
/// `(row_offset, col_offset)` into a new, independently owned matrix.
pub fn extract_block(
    m: &SquareMatrix,
    row_offset: usize,
    col_offset: usize,
    size: usize,
) -> Result<SquareMatrix> {
    check_window(m.dim(), row_offset, col_offset, size)?;

    let mut data = Vec::with_capacity(size * size);
    for r in 0..size {
        let row = m.row(row_offset + r);
        data.extend_from_slice(&row[col_offset..col_offset + size]);
    }
    Ok(SquareMatrix::new(data, size))
}

/// Overwrites the window of `m` at `(row_offset, col_offset)` with the
/// contents of `block`.
///
/// The window is checked before anything is written, so on error `m` is
/// left unchanged.
pub fn install_block(
    m: &mut SquareMatrix,
    block: &SquareMatrix,
    row_offset: usize,
    col_offset: usize,
) -> Result<()> {
    let size = block.dim();
    let n = m.dim();
    check_window(n, row_offset, col_offset, size)?;

    let dst = m.as_mut_slice();
    for r in 0..size {
        let start = (row_offset + r) * n + col_offset;
        dst[start..start + size].copy_from_slice(block.row(r));
    }
    Ok(())
}

impl SquareMatrix {
    /// Method form of [`extract_block`].
    pub fn extract_block(
        &self,
        row_offset: usize,
        col_offset: usize,
        size: usize,
    ) -> Result<SquareMatrix> {
        extract_block(self, row_offset, col_offset, size)
    }

    /// Method form of [`install_block`].
    pub fn install_block(
        &mut self,
        block: &SquareMatrix,
        row_offset: usize,
        col_offset: usize,
    ) -> Result<()> {
        install_block(self, block, row_offset, col_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(n: usize) -> SquareMatrix {
        SquareMatrix::from_fn(n, |i, j| (i * n + j + 1) as f64)
    }

    #[test]
    fn test_coord_offset() {
        assert_eq!(BlockCoord::new(2, 3).offset(25), (50, 75));
        assert_eq!(BlockCoord::new(0, 0).offset(25), (0, 0));
    }

    #[test]
    fn test_extract_block() {
        let m = seq(4);
        let b = m.extract_block(2, 0, 2).unwrap();
        assert_eq!(b.as_slice(), &[9.0, 10.0, 13.0, 14.0]);
        let b = m.extract_block(1, 1, 3).unwrap();
        assert_eq!(
            b.as_slice(),
            &[6.0, 7.0, 8.0, 10.0, 11.0, 12.0, 14.0, 15.0, 16.0]
        );
    }

    #[test]
    fn test_extract_is_independent_copy() {
        let mut m = seq(4);
        let b = m.extract_block(0, 0, 2).unwrap();
        m.set(0, 0, -1.0);
        assert_eq!(b.get(0, 0), 1.0);
    }

    #[test]
    fn test_extract_out_of_range() {
        let m = seq(4);
        assert_eq!(
            m.extract_block(3, 0, 2).unwrap_err(),
            MatrixError::IndexOutOfRange { row: 3, col: 0, size: 2, dim: 4 }
        );
        assert!(m.extract_block(0, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_install_block_2x2() {
        let mut a = SquareMatrix::new(vec![1.0, 2.0, 3.0, 4.0], 2);
        let sub = SquareMatrix::new(vec![5.0, 6.0, 7.0, 8.0], 2);
        a.install_block(&sub, 0, 0).unwrap();
        assert_eq!(a.as_slice(), &[5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_install_block_3x3() {
        let mut a = seq(3);
        let sub = SquareMatrix::new(vec![-4.0, -5.0, -7.0, -8.0], 2);
        a.install_block(&sub, 1, 0).unwrap();
        assert_eq!(
            a.as_slice(),
            &[1.0, 2.0, 3.0, -4.0, -5.0, 6.0, -7.0, -8.0, 9.0]
        );
    }

    #[test]
    fn test_install_out_of_range_leaves_target_untouched() {
        let mut a = seq(3);
        let sub = SquareMatrix::ones(2);
        assert!(a.install_block(&sub, 2, 0).is_err());
        assert_eq!(a, seq(3));
    }

    #[test]
    fn test_extract_then_install_is_identity() {
        let original = seq(6);
        for (r, c, s) in [(0, 0, 3), (3, 3, 3), (1, 2, 4), (0, 0, 6), (5, 5, 1)] {
            let mut m = original.clone();
            let block = m.extract_block(r, c, s).unwrap();
            m.install_block(&block, r, c).unwrap();
            assert_eq!(m, original);
        }
    }
}
