use std::fmt::Debug;

use sq_matrix::{BlockCoord, MatrixError};

/// Chooses how many blocks per side an n×n product is split into.
///
/// Implementations must return p ≥ 1 with `n % p == 0`, and p = 1 for odd
/// or small n.
pub trait BlockPlanner: Send + Sync + Debug {
    /// Returns the name of this planner.
    fn name(&self) -> &str;

    /// Block factor p for an n×n matrix.
    fn blocks_per_side(&self, n: usize) -> usize;
}

/// Order-of-magnitude heuristic with hand-tuned values for common sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPlanner;

impl HeuristicPlanner {
    pub fn new() -> Self {
        HeuristicPlanner
    }
}

impl BlockPlanner for HeuristicPlanner {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn blocks_per_side(&self, n: usize) -> usize {
        if n % 2 == 1 || n < 100 {
            return 1;
        }

        let mut p = match n {
            100 | 500 => 4,
            1024 => 16,
            2048 => 32,
            _ => {
                let mut rest = n;
                let mut p = 1;
                while rest >= 100 {
                    rest /= 10;
                    p *= 2;
                }
                p
            }
        };

        // p is a power of two, so halving always reaches a divisor.
        while n % p != 0 {
            p /= 2;
        }
        p
    }
}

/// Picks the coarsest even split whose blocks fit a target edge length.
#[derive(Debug, Clone, Copy)]
pub struct CacheAwarePlanner {
    /// Matrices smaller than this are never decomposed. Values below
    /// [`CacheAwarePlanner::MIN_DIM_FLOOR`] are raised to it.
    pub min_dim: usize,
    /// Largest acceptable block edge.
    pub target_block: usize,
    /// Smallest acceptable block edge.
    pub min_block: usize,
}

impl CacheAwarePlanner {
    /// Every planner keeps n < 100 undecomposed.
    pub const MIN_DIM_FLOOR: usize = 100;
    pub const DEFAULT_MIN_DIM: usize = 100;
    pub const DEFAULT_TARGET_BLOCK: usize = 128;
    pub const DEFAULT_MIN_BLOCK: usize = 16;

    pub fn new(min_dim: usize, target_block: usize, min_block: usize) -> Self {
        CacheAwarePlanner {
            min_dim,
            target_block,
            min_block,
        }
    }
}

impl Default for CacheAwarePlanner {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MIN_DIM,
            Self::DEFAULT_TARGET_BLOCK,
            Self::DEFAULT_MIN_BLOCK,
        )
    }
}

impl BlockPlanner for CacheAwarePlanner {
    fn name(&self) -> &str {
        "cache-aware"
    }

    fn blocks_per_side(&self, n: usize) -> usize {
        if n % 2 == 1 || n < self.min_dim.max(Self::MIN_DIM_FLOOR) {
            return 1;
        }

        let min_block = self.min_block.max(1);
        (2..=n / min_block)
            .find(|&p| {
                n % p == 0 && {
                    let s = n / p;
                    s <= self.target_block && s >= min_block
                }
            })
            .unwrap_or(1)
    }
}

/// Block factor chosen by the default planner.
pub fn choose_plan(n: usize) -> usize {
    HeuristicPlanner.blocks_per_side(n)
}

/// A validated decomposition of an n×n matrix into p×p blocks of size n/p.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    dim: usize,
    blocks_per_side: usize,
    block_size: usize,
}

impl BlockPlan {
    /// Validate `p` against `dim`.
    ///
    /// # Errors
    /// Returns `PlanInconsistent` if `p` is zero or does not divide `dim`.
    pub fn new(dim: usize, blocks_per_side: usize) -> sq_matrix::Result<Self> {
        if blocks_per_side == 0 || dim % blocks_per_side != 0 {
            return Err(MatrixError::PlanInconsistent {
                dim,
                blocks_per_side,
            });
        }
        Ok(BlockPlan {
            dim,
            blocks_per_side,
            block_size: dim / blocks_per_side,
        })
    }

    /// Plan `dim` with the given planner.
    pub fn with_planner(dim: usize, planner: &dyn BlockPlanner) -> sq_matrix::Result<Self> {
        Self::new(dim, planner.blocks_per_side(dim))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn blocks_per_side(&self) -> usize {
        self.blocks_per_side
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks in the grid, p².
    pub fn block_count(&self) -> usize {
        self.blocks_per_side * self.blocks_per_side
    }

    /// True when no decomposition takes place (p = 1).
    pub fn is_trivial(&self) -> bool {
        self.blocks_per_side == 1
    }

    /// All block coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = BlockCoord> {
        let p = self.blocks_per_side;
        (0..p).flat_map(move |row| (0..p).map(move |col| BlockCoord::new(row, col)))
    }
}
