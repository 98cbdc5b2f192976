use sq_matrix::{BlockCoord, MatrixError, Result, SquareMatrix};

/// A complete p×p grid of blocks, stored flat and addressed by `row * p + col`.
///
/// Only obtainable through [`GridBuilder::finish`], so every coordinate of a
/// `BlockGrid` is populated.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    blocks: Vec<SquareMatrix>,
    blocks_per_side: usize,
}

impl BlockGrid {
    pub fn blocks_per_side(&self) -> usize {
        self.blocks_per_side
    }

    /// Block at (row, col).
    ///
    /// # Panics
    /// Panics if the coordinate lies outside the grid.
    pub fn get(&self, row: usize, col: usize) -> &SquareMatrix {
        assert!(
            row < self.blocks_per_side && col < self.blocks_per_side,
            "block ({}, {}) outside a {}x{} grid",
            row,
            col,
            self.blocks_per_side,
            self.blocks_per_side
        );
        &self.blocks[row * self.blocks_per_side + col]
    }
}

/// Collects blocks for a [`BlockGrid`] in any order.
#[derive(Debug)]
pub struct GridBuilder {
    slots: Vec<Option<SquareMatrix>>,
    blocks_per_side: usize,
}

impl GridBuilder {
    pub fn new(blocks_per_side: usize) -> Self {
        let mut slots = Vec::with_capacity(blocks_per_side * blocks_per_side);
        slots.resize_with(blocks_per_side * blocks_per_side, || None);
        GridBuilder {
            slots,
            blocks_per_side,
        }
    }

    /// Store `block` at `coord`.
    ///
    /// # Errors
    /// `BlockOutOfGrid` for a coordinate outside the grid, `DuplicateBlock`
    /// if the slot is already filled.
    pub fn insert(&mut self, coord: BlockCoord, block: SquareMatrix) -> Result<()> {
        let p = self.blocks_per_side;
        if coord.row >= p || coord.col >= p {
            return Err(MatrixError::BlockOutOfGrid {
                row: coord.row,
                col: coord.col,
                blocks_per_side: p,
            });
        }
        let slot = &mut self.slots[coord.row * p + coord.col];
        if slot.is_some() {
            return Err(MatrixError::DuplicateBlock {
                row: coord.row,
                col: coord.col,
            });
        }
        *slot = Some(block);
        Ok(())
    }

    /// Number of slots still empty.
    pub fn missing(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Freeze into a grid.
    ///
    /// # Errors
    /// `IncompleteGrid` if any slot was never filled.
    pub fn finish(self) -> Result<BlockGrid> {
        let missing = self.missing();
        if missing > 0 {
            return Err(MatrixError::IncompleteGrid { missing });
        }
        Ok(BlockGrid {
            blocks: self.slots.into_iter().flatten().collect(),
            blocks_per_side: self.blocks_per_side,
        })
    }
}
