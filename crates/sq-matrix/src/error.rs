use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("dimension mismatch: ({left}x{left}) and ({right}x{right})")]
    DimensionMismatch { left: usize, right: usize },
    #[error("data length {got} does not match expected {expected}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("window {size}x{size} at ({row}, {col}) out of range for SquareMatrix of size {dim}")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        size: usize,
        dim: usize,
    },
    #[error("block plan inconsistent: {blocks_per_side} blocks per side does not divide {dim}")]
    PlanInconsistent { dim: usize, blocks_per_side: usize },
    #[error("block grid incomplete: {missing} block(s) missing")]
    IncompleteGrid { missing: usize },
    #[error("block ({row}, {col}) inserted twice")]
    DuplicateBlock { row: usize, col: usize },
    #[error("block ({row}, {col}) outside a {blocks_per_side}x{blocks_per_side} grid")]
    BlockOutOfGrid {
        row: usize,
        col: usize,
        blocks_per_side: usize,
    },
}

pub type Result<T> = std::result::Result<T, MatrixError>;
