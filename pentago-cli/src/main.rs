//! Pentago-Swap CLI - Command-line interface
//!
//! Commands:
//! - play: Self-play games between two agent configurations
//! - analyze: Explain the agent's decision for a position
//! - benchmark: Measure rollout and search throughput

mod analyze;
mod benchmark;
mod play;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pentago_agent::{AgentConfig, PolicyKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pentago")]
#[command(about = "Pentago-Swap decision engine")]
struct Cli {
    /// Agent configuration JSON; flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play games between two agent configurations
    Play(play::PlayArgs),
    /// Show the threat verdict, chosen move and search statistics for a board
    Analyze(analyze::AnalyzeArgs),
    /// Measure rollouts per second and simulations per decision
    Benchmark(benchmark::BenchmarkArgs),
}

/// Flags shared by every command that builds an agent
#[derive(Args, Clone, Debug, Default)]
pub struct AgentOverrides {
    /// Search policy: mcts, alpha-beta or hybrid
    #[arg(long, value_parser = parse_policy)]
    pub policy: Option<PolicyKind>,

    /// Time budget per move in milliseconds
    #[arg(long)]
    pub time_ms: Option<u64>,

    /// MCTS simulation cap per move
    #[arg(long)]
    pub simulations: Option<u32>,

    /// Alpha-beta search depth
    #[arg(long)]
    pub depth: Option<u32>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl AgentOverrides {
    pub fn apply(&self, mut config: AgentConfig) -> AgentConfig {
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(time_ms) = self.time_ms {
            config.time_budget_ms = time_ms;
        }
        if let Some(simulations) = self.simulations {
            config.mcts.max_simulations = simulations;
        }
        if let Some(depth) = self.depth {
            config.alpha_beta_depth = depth.max(1);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

fn parse_policy(value: &str) -> Result<PolicyKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "mcts" => Ok(PolicyKind::Mcts),
        "alpha-beta" | "alphabeta" | "ab" => Ok(PolicyKind::AlphaBeta),
        "hybrid" => Ok(PolicyKind::Hybrid),
        other => Err(format!("unknown policy '{other}' (expected mcts, alpha-beta or hybrid)")),
    }
}

/// Load an agent config file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("Failed to load agent config: {}", path.display())),
        None => Ok(AgentConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Play(args) => play::run(args, base),
        Commands::Analyze(args) => analyze::run(args, base),
        Commands::Benchmark(args) => benchmark::run(args, base),
    }
}
