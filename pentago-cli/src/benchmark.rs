//! Benchmark command - rollout and search throughput
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: benchmark_rollouts(), benchmark_decisions(), report_results()
//! - Level 3: sample_positions()
//! - Level 4: formatting utilities

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use pentago_agent::{Agent, AgentConfig};
use pentago_core::Bitboard;
use pentago_mcts::RolloutEngine;

use crate::AgentOverrides;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchmarkArgs {
    /// Rollouts to time from the empty board
    #[arg(long, default_value = "20000")]
    pub rollouts: usize,

    /// Positions to time full decisions on
    #[arg(long, default_value = "5")]
    pub positions: usize,

    /// Random plies played to reach each benchmark position
    #[arg(long, default_value = "8")]
    pub plies: usize,

    #[command(flatten)]
    pub agent: AgentOverrides,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, Serialize)]
struct BenchmarkResult {
    name: String,
    runs: usize,
    total_ms: f64,
    per_second: f64,
    notes: String,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run benchmark command
pub fn run(args: BenchmarkArgs, base: AgentConfig) -> Result<()> {
    let config = args.agent.apply(base);

    let results = vec![
        benchmark_rollouts(args.rollouts, config.seed),
        benchmark_decisions(&config, &sample_positions(args.positions, args.plies, config.seed)),
    ];

    report_results(&results, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn benchmark_rollouts(count: usize, seed: u64) -> BenchmarkResult {
    tracing::info!("Timing {} rollouts", count);
    let boards = vec![Bitboard::new(); count];
    let mut engine = RolloutEngine::new(seed);

    let start = Instant::now();
    let results = engine.rollout_batch(&boards);
    let elapsed = start.elapsed();

    let total_moves: u64 = results.iter().map(|r| r.moves_played as u64).sum();
    let avg_len = if count > 0 { total_moves as f64 / count as f64 } else { 0.0 };

    BenchmarkResult {
        name: "Rollouts".to_string(),
        runs: count,
        total_ms: millis(elapsed),
        per_second: per_second(count as f64, elapsed),
        notes: format!("avg length {:.1} plies", avg_len),
    }
}

fn benchmark_decisions(config: &AgentConfig, positions: &[Bitboard]) -> BenchmarkResult {
    tracing::info!(
        "Timing {} decisions at {}ms each",
        positions.len(),
        config.time_budget_ms
    );
    let mut agent = Agent::new(config.clone());
    let mut simulations = 0u64;

    let start = Instant::now();
    for board in positions {
        let decision = agent.decide(board, config.time_budget());
        simulations += decision.simulations as u64;
    }
    let elapsed = start.elapsed();

    let decisions = positions.len().max(1) as u64;
    BenchmarkResult {
        name: format!("Decisions ({:?})", config.policy),
        runs: positions.len(),
        total_ms: millis(elapsed),
        per_second: per_second(simulations as f64, elapsed),
        notes: format!("{} sims per decision", simulations / decisions),
    }
}

fn report_results(results: &[BenchmarkResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    println!("\n=== Benchmark Results ===");
    println!("{:<22} {:>8} {:>12} {:>12}  notes", "name", "runs", "total ms", "per sec");
    for r in results {
        println!(
            "{:<22} {:>8} {:>12.1} {:>12.0}  {}",
            r.name, r.runs, r.total_ms, r.per_second, r.notes
        );
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Live positions reached by random play
fn sample_positions(count: usize, plies: usize, seed: u64) -> Vec<Bitboard> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut board = Bitboard::new();
            for _ in 0..plies {
                let Some(mv) = board.random_move(&mut rng) else {
                    break;
                };
                board.play(mv);
                if board.is_game_over() {
                    board.undo(mv);
                    break;
                }
            }
            board
        })
        .collect()
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn per_second(count: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count / secs
    } else {
        0.0
    }
}
