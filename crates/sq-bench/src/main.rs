//! Benchmark runner for the leaf and block-parallel multiply paths.

use std::time::Instant;

use anyhow::{bail, Context};
use approx::relative_eq;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sq_matrix::{MultiplyBackend, SimpleBackend, SquareMatrix};
use sq_parallel::{EngineConfig, ParallelEngine, PlannerKind};

/// sq-bench command-line interface
#[derive(Parser)]
#[command(name = "sq-bench", version, about = "Square matrix multiply benchmark")]
struct Cli {
    /// Matrix edge length
    #[arg(long, default_value_t = 1024)]
    size: usize,
    /// Timed runs per method
    #[arg(long, default_value_t = 3)]
    iterations: usize,
    /// Worker threads for the parallel engine (overrides SQMAT_NUM_THREADS)
    #[arg(long)]
    threads: Option<usize>,
    /// Block planner: heuristic or cache-aware (overrides SQMAT_PLANNER; a
    /// cache-aware planner keeps SQMAT_TARGET_BLOCK)
    #[arg(long)]
    planner: Option<String>,
    /// Seed for the random operands
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Skip the leaf baseline
    #[arg(long)]
    skip_simple: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.iterations == 0 {
        bail!("--iterations must be > 0");
    }

    let mut config = EngineConfig::from_env().context("reading SQMAT_* environment")?;
    if let Some(threads) = cli.threads {
        config = config.with_num_threads(threads);
    }
    if let Some(name) = &cli.planner {
        let planner = select_planner(config.planner, PlannerKind::parse(name)?);
        config = config.with_planner(planner);
    }
    let engine = ParallelEngine::new(config).context("building parallel engine")?;

    let n = cli.size;
    let plan = engine.plan(n)?;
    info!(
        "n={} planner={} p={} threads={}",
        n,
        engine.planner().name(),
        plan.blocks_per_side(),
        engine.num_threads()
    );

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let a = SquareMatrix::from_fn(n, |_, _| rng.gen::<f64>() * 20.0);
    let b = SquareMatrix::from_fn(n, |_, _| rng.gen::<f64>() * 20.0);

    println!("=== Square Matrix Multiply Benchmark ===\n");
    println!(
        "Matrix: {}×{}  planner: {}  p: {}  threads: {}",
        n,
        n,
        engine.planner().name(),
        plan.blocks_per_side(),
        engine.num_threads()
    );
    println!("{}", "-".repeat(60));

    let simple = SimpleBackend::new();
    let mut backends: Vec<&dyn MultiplyBackend> = Vec::new();
    if !cli.skip_simple {
        backends.push(&simple);
    }
    backends.push(&engine);

    let mut results = Vec::new();
    for backend in backends {
        let (c, time_ms, gflops) = bench(backend, &a, &b, cli.iterations)?;
        results.push((backend.name().to_string(), c, time_ms));
        println!(
            "{:10} {:10.2} ms  {:6.2} GFLOPS",
            backend.name(),
            time_ms,
            gflops
        );
    }

    if let [(_, baseline, baseline_ms), (_, parallel, parallel_ms)] = results.as_slice() {
        check_agreement(baseline, parallel)?;
        println!("\nSpeedup: {:.1}× (results agree)", baseline_ms / parallel_ms);
    }

    Ok(())
}

/// Planner for `--planner`, keeping thresholds already read from the
/// environment when both name the cache-aware planner.
fn select_planner(from_env: PlannerKind, requested: PlannerKind) -> PlannerKind {
    match (from_env, requested) {
        (PlannerKind::CacheAware { .. }, PlannerKind::CacheAware { .. }) => from_env,
        _ => requested,
    }
}

/// Warm up once, then average `iterations` timed runs.
fn bench(
    backend: &dyn MultiplyBackend,
    a: &SquareMatrix,
    b: &SquareMatrix,
    iterations: usize,
) -> anyhow::Result<(SquareMatrix, f64, f64)> {
    let mut c = backend.multiply(a, b)?;

    let mut total = 0.0;
    for _ in 0..iterations {
        let start = Instant::now();
        c = backend.multiply(a, b)?;
        total += start.elapsed().as_secs_f64();
    }

    let avg = total / iterations as f64;
    let n = a.dim() as f64;
    let gflops = 2.0 * n * n * n / avg / 1e9;
    Ok((c, avg * 1000.0, gflops))
}

fn check_agreement(expected: &SquareMatrix, actual: &SquareMatrix) -> anyhow::Result<()> {
    for (i, (e, a)) in expected
        .as_slice()
        .iter()
        .zip(actual.as_slice())
        .enumerate()
    {
        if !relative_eq!(*e, *a, epsilon = 1e-9, max_relative = 1e-9) {
            bail!(
                "results differ at index {}: expected {}, got {}",
                i,
                e,
                a
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_planner_keeps_env_thresholds() {
        let from_env = PlannerKind::CacheAware {
            min_dim: 100,
            target_block: 64,
            min_block: 16,
        };
        assert_eq!(select_planner(from_env, PlannerKind::cache_aware()), from_env);
    }

    #[test]
    fn test_select_planner_switches_kind() {
        assert_eq!(
            select_planner(PlannerKind::Heuristic, PlannerKind::cache_aware()),
            PlannerKind::cache_aware()
        );
        assert_eq!(
            select_planner(PlannerKind::cache_aware(), PlannerKind::Heuristic),
            PlannerKind::Heuristic
        );
    }
}
