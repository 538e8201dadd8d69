//! Pentago-Swap MCTS - Monte Carlo Tree Search
//!
//! This crate provides UCT search over Pentago-Swap positions:
//! - Tree policy (UCT) over an arena of move-only nodes
//! - Rollouts that take immediate wins, random moves otherwise
//! - Backpropagation with win/draw scoring

pub mod rollout;
pub mod search;
pub mod tree;

pub use rollout::{cpu_rollout, RolloutEngine, RolloutResult};
pub use search::{run_search, MoveStatistics, SearchResult};
pub use tree::{MctsNode, MctsTree, NodeId, NodeStats};

use pentago_core::{Bitboard, Move};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// MCTS configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// UCT exploration constant
    pub exploration: f64,
    /// Stop once the root has this many simulations
    pub max_simulations: u32,
    /// Arena size beyond which leaves are no longer expanded
    pub max_nodes: usize,
    pub seed: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: std::f64::consts::SQRT_2,
            max_simulations: 500_000,
            max_nodes: 2_000_000,
            seed: 42,
        }
    }
}

impl MctsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_max_simulations(mut self, max_simulations: u32) -> Self {
        self.max_simulations = max_simulations;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// MCTS player
pub struct MctsPlayer {
    config: MctsConfig,
    rng: ChaCha8Rng,
}

impl MctsPlayer {
    pub fn new(config: MctsConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Search `board` over the given root candidates until `deadline`
    pub fn search(
        &mut self,
        board: &Bitboard,
        candidates: &[Move],
        deadline: Instant,
    ) -> SearchResult {
        run_search(board, candidates, &self.config, deadline, &mut self.rng)
    }

    /// Choose among `candidates`, searching only when there is a real choice.
    ///
    /// Falls back to the first candidate if no simulation completed.
    pub fn choose(
        &mut self,
        board: &Bitboard,
        candidates: &[Move],
        deadline: Instant,
    ) -> Option<Move> {
        match candidates {
            [] => None,
            [only] => Some(*only),
            _ => self
                .search(board, candidates, deadline)
                .best_move()
                .or_else(|| candidates.first().copied()),
        }
    }

    /// Get best move over all symmetry-reduced moves within `budget`
    pub fn best_move(&mut self, board: &Bitboard, budget: Duration) -> Option<Move> {
        let deadline = Instant::now() + budget;
        let candidates = board.legal_moves_reduced();
        self.choose(board, &candidates, deadline)
    }

    /// Play a full game, spending `budget` per move
    pub fn play_game(&mut self, initial: Bitboard, budget: Duration) -> (Bitboard, Vec<Move>) {
        let mut board = initial;
        let mut history = Vec::new();

        while let Some(mv) = self.best_move(&board, budget) {
            board.play(mv);
            history.push(mv);
        }

        (board, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MctsConfig::new()
            .with_exploration(1.0)
            .with_max_simulations(1000)
            .with_max_nodes(0)
            .with_seed(3);
        assert_eq!(config.exploration, 1.0);
        assert_eq!(config.max_simulations, 1000);
        assert_eq!(config.max_nodes, 1);
        assert_eq!(config.seed, 3);
    }

    #[test]
    fn test_config_partial_json() {
        let config: MctsConfig = serde_json::from_str(r#"{"max_simulations": 2000}"#).unwrap();
        assert_eq!(config.max_simulations, 2000);
        assert_eq!(config.exploration, std::f64::consts::SQRT_2);
    }

    #[test]
    fn test_singleton_skips_search() {
        let board = Bitboard::new();
        let only = board.legal_moves_reduced()[0];
        let mut player = MctsPlayer::new(MctsConfig::default());
        assert_eq!(player.choose(&board, &[only], Instant::now()), Some(only));
        assert_eq!(player.choose(&board, &[], Instant::now()), None);
    }

    #[test]
    fn test_expired_budget_falls_back_to_first() {
        let board = Bitboard::new();
        let candidates = board.legal_moves_reduced();
        let mut player = MctsPlayer::new(MctsConfig::default());
        assert_eq!(player.choose(&board, &candidates, Instant::now()), Some(candidates[0]));
    }

    #[test]
    fn test_play_game() {
        let config = MctsConfig::default().with_max_simulations(200);
        let mut player = MctsPlayer::new(config);
        let (board, history) = player.play_game(Bitboard::new(), Duration::from_secs(5));
        assert!(board.is_game_over());
        assert_eq!(history.len(), board.turn_number() as usize);
    }
}
