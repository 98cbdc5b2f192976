//! `sq-parallel` - Block-decomposed parallel multiplication of square matrices.
//!
//! An n×n product is split into a p×p grid of blocks. All blocks of both
//! operands are extracted concurrently, then each output block is computed
//! as a sum of p leaf products in its own task and written back into the
//! result.

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod planner;

pub use config::{EngineConfig, PlannerKind};
pub use engine::{add, multiply, ParallelEngine};
pub use error::{EngineError, Result};
pub use grid::{BlockGrid, GridBuilder};
pub use planner::{choose_plan, BlockPlan, BlockPlanner, CacheAwarePlanner, HeuristicPlanner};

pub use sq_matrix::{MatrixError, MultiplyBackend, SimpleBackend, SquareMatrix};
