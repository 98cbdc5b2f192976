use crate::error::{EngineError, Result};
use crate::planner::{BlockPlanner, CacheAwarePlanner, HeuristicPlanner};

/// Which block planner the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerKind {
    Heuristic,
    CacheAware {
        min_dim: usize,
        target_block: usize,
        min_block: usize,
    },
}

impl PlannerKind {
    /// Cache-aware planner with default thresholds.
    pub fn cache_aware() -> Self {
        PlannerKind::CacheAware {
            min_dim: CacheAwarePlanner::DEFAULT_MIN_DIM,
            target_block: CacheAwarePlanner::DEFAULT_TARGET_BLOCK,
            min_block: CacheAwarePlanner::DEFAULT_MIN_BLOCK,
        }
    }

    /// Parse a planner name as accepted by `SQMAT_PLANNER`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(PlannerKind::Heuristic),
            "cache-aware" | "cache_aware" => Ok(Self::cache_aware()),
            other => Err(EngineError::Config(format!("unknown planner: {}", other))),
        }
    }

    pub(crate) fn build(&self) -> Box<dyn BlockPlanner> {
        match *self {
            PlannerKind::Heuristic => Box::new(HeuristicPlanner::new()),
            PlannerKind::CacheAware {
                min_dim,
                target_block,
                min_block,
            } => Box::new(CacheAwarePlanner::new(min_dim, target_block, min_block)),
        }
    }
}

/// Configuration for a [`ParallelEngine`](crate::ParallelEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Worker threads for a dedicated pool. `None` runs on rayon's global pool.
    pub num_threads: Option<usize>,
    /// Block planner.
    pub planner: PlannerKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            num_threads: None,
            planner: PlannerKind::Heuristic,
        }
    }
}

impl EngineConfig {
    pub const ENV_NUM_THREADS: &'static str = "SQMAT_NUM_THREADS";
    pub const ENV_PLANNER: &'static str = "SQMAT_PLANNER";
    pub const ENV_TARGET_BLOCK: &'static str = "SQMAT_TARGET_BLOCK";

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_planner(mut self, planner: PlannerKind) -> Self {
        self.planner = planner;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// absent keys.
    ///
    /// Reads:
    /// - `SQMAT_NUM_THREADS` -> num_threads (positive integer)
    /// - `SQMAT_PLANNER` -> planner (`heuristic` or `cache-aware`)
    /// - `SQMAT_TARGET_BLOCK` -> target block edge of the cache-aware planner
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        if let Some(raw) = lookup(Self::ENV_NUM_THREADS) {
            config.num_threads = Some(parse_positive(Self::ENV_NUM_THREADS, &raw)?);
        }

        if let Some(raw) = lookup(Self::ENV_PLANNER) {
            config.planner = PlannerKind::parse(&raw)?;
        }

        if let Some(raw) = lookup(Self::ENV_TARGET_BLOCK) {
            let value = parse_positive(Self::ENV_TARGET_BLOCK, &raw)?;
            match &mut config.planner {
                PlannerKind::CacheAware { target_block, .. } => *target_block = value,
                PlannerKind::Heuristic => {
                    return Err(EngineError::Config(format!(
                        "{} requires {}=cache-aware",
                        Self::ENV_TARGET_BLOCK,
                        Self::ENV_PLANNER
                    )))
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(EngineError::Config("num_threads must be > 0".to_string()));
        }
        if let PlannerKind::CacheAware {
            min_dim,
            target_block,
            min_block,
        } = self.planner
        {
            if min_dim < CacheAwarePlanner::MIN_DIM_FLOOR {
                return Err(EngineError::Config(format!(
                    "cache-aware planner needs min_dim >= {}, got {}",
                    CacheAwarePlanner::MIN_DIM_FLOOR,
                    min_dim
                )));
            }
            if min_block == 0 || target_block < min_block {
                return Err(EngineError::Config(format!(
                    "cache-aware planner needs 0 < min_block <= target_block, got min_block={} target_block={}",
                    min_block, target_block
                )));
            }
        }
        Ok(())
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(EngineError::Config(format!(
            "{} must be a positive integer, got {:?}",
            key, raw
        ))),
    }
}
