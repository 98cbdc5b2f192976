use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::{debug, trace};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use sq_matrix::{multiply_simple, BlockCoord, MatrixError, MultiplyBackend, SquareMatrix};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::grid::{BlockGrid, GridBuilder};
use crate::planner::{BlockPlan, BlockPlanner, HeuristicPlanner};

/// Block-decomposed parallel multiply engine.
///
/// Each call to [`multiply`](ParallelEngine::multiply) plans a p×p split,
/// extracts all 2p² operand blocks concurrently, and only once both grids
/// are complete computes the p² output blocks, each in its own task. All
/// intermediate state is scoped to the call, so multiplies may be nested or
/// issued from several threads at once.
#[derive(Debug)]
pub struct ParallelEngine {
    planner: Box<dyn BlockPlanner>,
    pool: Option<ThreadPool>,
}

impl ParallelEngine {
    /// Build an engine from `config`, creating a dedicated thread pool if
    /// `num_threads` is set.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = match config.num_threads {
            Some(n) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("sq-parallel-{}", i))
                    .build()?,
            ),
            None => None,
        };
        Ok(ParallelEngine {
            planner: config.planner.build(),
            pool,
        })
    }

    /// Engine using `planner` on rayon's global pool.
    pub fn with_planner(planner: Box<dyn BlockPlanner>) -> Self {
        ParallelEngine {
            planner,
            pool: None,
        }
    }

    pub fn planner(&self) -> &dyn BlockPlanner {
        self.planner.as_ref()
    }

    /// Worker count of the pool this engine runs on.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Validated block plan for an n×n product.
    pub fn plan(&self, n: usize) -> sq_matrix::Result<BlockPlan> {
        BlockPlan::with_planner(n, self.planner.as_ref())
    }

    /// Matrix product C = A @ B.
    ///
    /// # Errors
    /// `DimensionMismatch` if the operands differ in size, checked before any
    /// work starts. `PlanInconsistent` if the planner returns a block factor
    /// that does not divide n.
    pub fn multiply(&self, a: &SquareMatrix, b: &SquareMatrix) -> sq_matrix::Result<SquareMatrix> {
        if a.dim() != b.dim() {
            return Err(MatrixError::DimensionMismatch {
                left: a.dim(),
                right: b.dim(),
            });
        }

        let plan = self.plan(a.dim())?;
        debug!(
            "multiply n={} planner={} p={} block={}",
            plan.dim(),
            self.planner.name(),
            plan.blocks_per_side(),
            plan.block_size()
        );

        if plan.is_trivial() {
            trace!("n={} below decomposition threshold, using leaf multiply", plan.dim());
            return multiply_simple(a, b);
        }

        self.install(|| multiply_blocked(a, b, &plan))
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for ParallelEngine {
    fn default() -> Self {
        Self::with_planner(Box::new(HeuristicPlanner::new()))
    }
}

impl MultiplyBackend for ParallelEngine {
    fn name(&self) -> &str {
        "parallel"
    }

    fn multiply(&self, a: &SquareMatrix, b: &SquareMatrix) -> sq_matrix::Result<SquareMatrix> {
        ParallelEngine::multiply(self, a, b)
    }
}

/// Multiply with the default engine on rayon's global pool.
pub fn multiply(a: &SquareMatrix, b: &SquareMatrix) -> sq_matrix::Result<SquareMatrix> {
    ParallelEngine::default().multiply(a, b)
}

/// Element-wise sum of two equal-size matrices, as a new matrix.
pub fn add(a: &SquareMatrix, b: &SquareMatrix) -> sq_matrix::Result<SquareMatrix> {
    a.add(b)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn into_inner<T>(mutex: Mutex<T>) -> T {
    mutex.into_inner().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy)]
enum Operand {
    Left,
    Right,
}

fn multiply_blocked(
    a: &SquareMatrix,
    b: &SquareMatrix,
    plan: &BlockPlan,
) -> sq_matrix::Result<SquareMatrix> {
    let started = Instant::now();
    let (left, right) = extract_grids(a, b, plan)?;
    trace!(
        "extracted {} blocks in {:?}",
        2 * plan.block_count(),
        started.elapsed()
    );

    let started = Instant::now();
    let c = compute_blocks(&left, &right, plan)?;
    trace!(
        "computed {} output blocks in {:?}",
        plan.block_count(),
        started.elapsed()
    );
    Ok(c)
}

/// Phase one: every block of both operands, one task per block.
///
/// Returns only after all 2p² tasks have finished, so the grids handed to
/// phase two are complete and no longer written.
fn extract_grids(
    a: &SquareMatrix,
    b: &SquareMatrix,
    plan: &BlockPlan,
) -> sq_matrix::Result<(BlockGrid, BlockGrid)> {
    let p = plan.blocks_per_side();
    let s = plan.block_size();
    let left = Mutex::new(GridBuilder::new(p));
    let right = Mutex::new(GridBuilder::new(p));

    let tasks: Vec<(Operand, BlockCoord)> = plan
        .coords()
        .flat_map(|coord| [(Operand::Left, coord), (Operand::Right, coord)])
        .collect();

    tasks
        .into_par_iter()
        .try_for_each(|(operand, coord)| -> sq_matrix::Result<()> {
            let (source, target) = match operand {
                Operand::Left => (a, &left),
                Operand::Right => (b, &right),
            };
            let (row, col) = coord.offset(s);
            let block = source.extract_block(row, col, s)?;
            lock(target).insert(coord, block)
        })?;

    let left = into_inner(left).finish()?;
    let right = into_inner(right).finish()?;
    Ok((left, right))
}

/// Phase two: one task per output block, installed as each finishes.
fn compute_blocks(
    left: &BlockGrid,
    right: &BlockGrid,
    plan: &BlockPlan,
) -> sq_matrix::Result<SquareMatrix> {
    let s = plan.block_size();
    let result = Mutex::new(SquareMatrix::zeros(plan.dim()));
    let coords: Vec<BlockCoord> = plan.coords().collect();

    coords
        .into_par_iter()
        .try_for_each(|coord| -> sq_matrix::Result<()> {
            let block = output_block(left, right, coord, s)?;
            let (row, col) = coord.offset(s);
            lock(&result).install_block(&block, row, col)
        })?;

    Ok(into_inner(result))
}

/// C(i, j) = sum over k of A(i, k) @ B(k, j), accumulated in increasing k.
fn output_block(
    left: &BlockGrid,
    right: &BlockGrid,
    coord: BlockCoord,
    block_size: usize,
) -> sq_matrix::Result<SquareMatrix> {
    let mut acc = SquareMatrix::zeros(block_size);
    for k in 0..left.blocks_per_side() {
        let product = multiply_simple(left.get(coord.row, k), right.get(k, coord.col))?;
        acc.add_assign(&product)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerKind;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Debug)]
    struct FixedPlanner(usize);

    impl BlockPlanner for FixedPlanner {
        fn name(&self) -> &str {
            "fixed"
        }

        fn blocks_per_side(&self, _n: usize) -> usize {
            self.0
        }
    }

    fn random(n: usize, seed: u64) -> SquareMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        SquareMatrix::from_fn(n, |_, _| rng.gen_range(-1.0..1.0))
    }

    fn assert_close(expected: &SquareMatrix, actual: &SquareMatrix) {
        assert_eq!(expected.dim(), actual.dim());
        for (e, a) in expected.as_slice().iter().zip(actual.as_slice()) {
            assert_relative_eq!(*e, *a, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_blocked_matches_leaf() {
        for (n, p) in [(4, 2), (6, 3), (12, 4), (30, 5), (64, 8)] {
            let engine = ParallelEngine::with_planner(Box::new(FixedPlanner(p)));
            let a = random(n, n as u64);
            let b = random(n, n as u64 + 1);
            let expected = multiply_simple(&a, &b).unwrap();
            assert_close(&expected, &engine.multiply(&a, &b).unwrap());
        }
    }

    #[test]
    fn test_block_per_element() {
        // p = n: every block is a single element.
        let engine = ParallelEngine::with_planner(Box::new(FixedPlanner(4)));
        let a = SquareMatrix::from_fn(4, |i, j| (i * 4 + j + 1) as f64);
        let c = engine.multiply(&a, &a).unwrap();
        assert_eq!(c, multiply_simple(&a, &a).unwrap());
    }

    #[test]
    fn test_trivial_plan_is_leaf_exact() {
        let engine = ParallelEngine::default();
        let a = random(33, 1);
        let b = random(33, 2);
        assert_eq!(
            engine.multiply(&a, &b).unwrap(),
            multiply_simple(&a, &b).unwrap()
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let engine = ParallelEngine::default();
        let err = engine
            .multiply(&SquareMatrix::zeros(100), &SquareMatrix::zeros(50))
            .unwrap_err();
        assert_eq!(err, MatrixError::DimensionMismatch { left: 100, right: 50 });
    }

    #[test]
    fn test_inconsistent_plan_is_rejected() {
        let engine = ParallelEngine::with_planner(Box::new(FixedPlanner(3)));
        let a = SquareMatrix::ones(100);
        assert_eq!(
            engine.multiply(&a, &a).unwrap_err(),
            MatrixError::PlanInconsistent { dim: 100, blocks_per_side: 3 }
        );
    }

    #[test]
    fn test_dedicated_pool() {
        let config = EngineConfig::default().with_num_threads(2);
        let engine = ParallelEngine::new(config).unwrap();
        assert_eq!(engine.num_threads(), 2);
        let a = random(200, 3);
        let b = random(200, 4);
        assert_close(&multiply_simple(&a, &b).unwrap(), &engine.multiply(&a, &b).unwrap());
    }

    #[test]
    fn test_single_thread_pool() {
        let config = EngineConfig::default().with_num_threads(1);
        let engine = ParallelEngine::new(config).unwrap();
        let a = SquareMatrix::ones(100);
        let c = engine.multiply(&a, &SquareMatrix::identity(100)).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = EngineConfig {
            num_threads: Some(0),
            planner: PlannerKind::Heuristic,
        };
        assert!(ParallelEngine::new(config).is_err());
    }

    #[test]
    fn test_cache_aware_engine() {
        let config = EngineConfig::default().with_planner(PlannerKind::cache_aware());
        let engine = ParallelEngine::new(config).unwrap();
        assert_eq!(engine.planner().name(), "cache-aware");
        assert_eq!(engine.plan(256).unwrap().blocks_per_side(), 2);
        let a = random(256, 5);
        let b = random(256, 6);
        assert_close(&multiply_simple(&a, &b).unwrap(), &engine.multiply(&a, &b).unwrap());
    }

    #[test]
    fn test_nested_multiplies() {
        let engine = ParallelEngine::default();
        let a = random(100, 7);
        let b = random(100, 8);
        let expected = multiply_simple(&a, &b).unwrap();
        let results: Vec<SquareMatrix> = (0..4)
            .into_par_iter()
            .map(|_| engine.multiply(&a, &b).unwrap())
            .collect();
        for c in &results {
            assert_eq!(c, &results[0]);
            assert_close(&expected, c);
        }
    }

    #[test]
    fn test_backend_name() {
        let engine = ParallelEngine::default();
        let backend: &dyn MultiplyBackend = &engine;
        assert_eq!(backend.name(), "parallel");
        let a = SquareMatrix::identity(100);
        assert_eq!(a.multiply(&a, backend).unwrap(), a);
    }

    #[test]
    fn test_free_functions() {
        let a = SquareMatrix::new(vec![1.0, 2.0, 3.0, 4.0], 2);
        let b = SquareMatrix::new(vec![7.0, 10.0, 13.0, 16.0], 2);
        assert_eq!(multiply(&a, &b).unwrap().as_slice(), &[33.0, 42.0, 73.0, 94.0]);
        assert_eq!(add(&a, &b).unwrap().as_slice(), &[8.0, 12.0, 16.0, 20.0]);
    }
}
