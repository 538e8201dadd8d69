//! Play command - games between two agent configurations
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_configs(), play_match(), report_results()
//! - Level 4: formatting utilities

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use pentago_agent::{AgentConfig, MatchResult, PolicyKind};

use crate::{load_config, parse_policy, AgentOverrides};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Number of games to play (colours alternate)
    #[arg(long, default_value = "2")]
    pub games: usize,

    /// Config for the second agent (defaults to the first agent's)
    #[arg(long, value_name = "FILE")]
    pub opponent: Option<PathBuf>,

    /// Search policy of the second agent
    #[arg(long, value_parser = parse_policy)]
    pub opponent_policy: Option<PolicyKind>,

    #[command(flatten)]
    pub agent: AgentOverrides,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs, base: AgentConfig) -> Result<()> {
    let (first, second) = build_configs(&args, base)?;

    tracing::info!(
        "Starting match: {:?} vs {:?} ({} games, {}ms per move)",
        first.policy,
        second.policy,
        args.games,
        first.time_budget_ms
    );

    let results = play_match(&first, &second, &args);
    report_results(&results, &first, &second, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_configs(args: &PlayArgs, base: AgentConfig) -> Result<(AgentConfig, AgentConfig)> {
    let first = args.agent.apply(base);
    let mut second = match &args.opponent {
        Some(path) => args.agent.apply(load_config(Some(path))?),
        None => first.clone(),
    };
    if let Some(policy) = args.opponent_policy {
        second.policy = policy;
    }
    second.seed = second.seed.wrapping_add(1);
    Ok((first, second))
}

fn play_match(first: &AgentConfig, second: &AgentConfig, args: &PlayArgs) -> MatchResult {
    let progress = if !args.json && std::io::stderr().is_terminal() {
        let pb = ProgressBar::new(args.games as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} games ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let results = pentago_agent::play_match(first, second, args.games, first.seed, |game| {
        tracing::debug!(
            "Game {}: {:?} in {} plies",
            game.index + 1,
            game.outcome.result,
            game.outcome.plies
        );
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    });

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }
    results
}

fn report_results(
    results: &MatchResult,
    first: &AgentConfig,
    second: &AgentConfig,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    println!("\n=== Match Results ===");
    println!("First:  {}", describe(first));
    println!("Second: {}", describe(second));
    println!("Games:  {}", results.games_played);
    println!(
        "First wins: {} | Second wins: {} | Draws: {}",
        results.first_wins, results.second_wins, results.draws
    );
    println!("White wins: {}", results.white_wins);
    println!("Avg length: {:.1} plies", results.avg_plies);
    println!(
        "Score: {:.1} - {:.1}",
        results.score_for_first(),
        results.score_for_second()
    );
    Ok(())
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn describe(config: &AgentConfig) -> String {
    match config.policy {
        PolicyKind::Mcts => format!("MCTS (cap {} sims)", config.mcts.max_simulations),
        PolicyKind::AlphaBeta => format!("Alpha-Beta (depth {})", config.alpha_beta_depth),
        PolicyKind::Hybrid => format!(
            "Hybrid (alpha-beta depth {} after ply {})",
            config.alpha_beta_depth, config.minimax_after_ply
        ),
    }
}
