//! Configuration types for the decision agent
//!
//! Level 4 - Utilities and configuration

use crate::error::AgentError;
use pentago_core::FilterConfig;
use pentago_mcts::MctsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Search policy run after the threat filter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Monte Carlo Tree Search over the filtered moves
    #[default]
    Mcts,
    /// Iterative-deepening alpha-beta over the filtered moves
    AlphaBeta,
    /// Alpha-beta late in the game, MCTS before that
    Hybrid,
}

/// Agent configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub policy: PolicyKind,
    /// Wall-clock budget per decision
    pub time_budget_ms: u64,
    /// Slack kept back from the budget for one worst-case simulation
    pub safety_margin_ms: u64,
    pub filter: FilterConfig,
    pub mcts: MctsConfig,
    /// Maximum depth of the alpha-beta policy
    pub alpha_beta_depth: u32,
    /// Hybrid switches to alpha-beta once more plies than this were played.
    ///
    /// The default 23 hands over from the 24th ply on, i.e. after twelve
    /// full rounds.
    pub minimax_after_ply: u8,
    /// Seeds every policy; overrides `mcts.seed`
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Mcts,
            time_budget_ms: 2000,
            safety_margin_ms: 100,
            filter: FilterConfig::default(),
            mcts: MctsConfig::default(),
            alpha_beta_depth: 3,
            minimax_after_ply: 23,
            seed: 42,
        }
    }
}

impl AgentConfig {
    /// Create config using MCTS
    pub fn mcts() -> Self {
        Self::default()
    }

    /// Create config for alpha-beta at given depth
    pub fn alpha_beta(depth: u32) -> Self {
        Self {
            policy: PolicyKind::AlphaBeta,
            alpha_beta_depth: depth.max(1),
            ..Default::default()
        }
    }

    /// Create config switching to alpha-beta after `ply`
    pub fn hybrid(ply: u8) -> Self {
        Self {
            policy: PolicyKind::Hybrid,
            minimax_after_ply: ply,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = budget.as_millis() as u64;
        self
    }

    pub fn with_max_simulations(mut self, max_simulations: u32) -> Self {
        self.mcts.max_simulations = max_simulations;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Budget left for searching once the safety margin is reserved
    pub fn search_budget(&self, budget: Duration) -> Duration {
        budget.saturating_sub(Duration::from_millis(self.safety_margin_ms))
    }

    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AgentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AgentError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
