//! Analyze command - explain the agent's decision for one position
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_board(), report()

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use pentago_agent::{Agent, AgentConfig, Decision};
use pentago_core::{Bitboard, GridBoard, Placement};

use crate::AgentOverrides;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Board JSON file: {"rows": [...], "turn_player": "White", "ply": N}
    #[arg(value_name = "BOARD")]
    pub board: PathBuf,

    /// Number of root moves to list
    #[arg(long, default_value = "10")]
    pub top: usize,

    #[command(flatten)]
    pub agent: AgentOverrides,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Analysis<'a> {
    decision: &'a Decision,
    placement: Option<Placement>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run analyze command
pub fn run(args: AnalyzeArgs, base: AgentConfig) -> Result<()> {
    let board = load_board(&args.board)?;
    let config = args.agent.apply(base);
    let budget = config.time_budget();

    let mut agent = Agent::new(config);
    let decision = agent.decide(&board, budget);
    let placement = decision
        .mv
        .map(|mv| mv.to_placement())
        .transpose()
        .context("Chosen move could not be decoded")?;

    if args.json {
        let analysis = Analysis {
            decision: &decision,
            placement,
        };
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        report(&board, &decision, placement, args.top);
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_board(path: &Path) -> Result<Bitboard> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read board: {}", path.display()))?;
    let grid: GridBoard = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse board: {}", path.display()))?;
    Bitboard::from_external(&grid)
        .with_context(|| format!("Inconsistent board: {}", path.display()))
}

fn report(board: &Bitboard, decision: &Decision, placement: Option<Placement>, top: usize) {
    println!("{board}");
    println!("Verdict:    {:?}", decision.verdict);
    println!("Candidates: {}", decision.candidates);
    println!("Policy:     {}", decision.policy.unwrap_or("threat filter"));

    match (decision.mv, placement) {
        (Some(mv), Some(p)) => println!(
            "Move:       {mv}  (row {}, col {}, swap {:?} <-> {:?})",
            p.row, p.col, p.quad_a, p.quad_b
        ),
        _ => println!("Move:       none (game over)"),
    }

    if decision.simulations > 0 {
        println!(
            "\n{} simulations in {}ms",
            decision.simulations, decision.elapsed_ms
        );
        let mut stats = decision.move_stats.clone();
        stats.sort_by(|a, b| b.sims.cmp(&a.sims));
        println!("{:<28} {:>8} {:>8}", "move", "sims", "win %");
        for s in stats.iter().take(top) {
            println!("{:<28} {:>8} {:>7.1}%", s.mv.to_string(), s.sims, s.win_rate * 100.0);
        }
    }
}
