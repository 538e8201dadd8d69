//! Game runner - plays single games between two agents
//!
//! Level 3 - Step-level implementation

use pentago_core::{Bitboard, GameResult, Move, Player};
use serde::Serialize;

use crate::agent::Agent;
use crate::config::AgentConfig;

/// Outcome of a single game
#[derive(Clone, Debug, Serialize)]
pub struct GameOutcome {
    /// Final game result
    pub result: GameResult,
    /// Number of plies played
    pub plies: u32,
    /// Move history
    pub moves: Vec<Move>,
}

impl GameOutcome {
    /// Get winner (None for draw)
    pub fn winner(&self) -> Option<Player> {
        self.result.winner()
    }

    pub fn is_draw(&self) -> bool {
        self.result == GameResult::Draw
    }
}

/// Game runner that pits a white and a black agent against each other
pub struct GameRunner {
    white: AgentConfig,
    black: AgentConfig,
}

impl GameRunner {
    pub fn new(white: AgentConfig, black: AgentConfig) -> Self {
        Self { white, black }
    }

    /// Both sides use the same configuration
    pub fn self_play(config: AgentConfig) -> Self {
        Self::new(config.clone(), config)
    }

    /// Play a game from the empty board, offsetting both agents' seeds by `seed`
    pub fn play_game(&self, seed: u64) -> GameOutcome {
        self.play_from(Bitboard::new(), seed)
    }

    /// Play a game from `initial` until it is decided
    pub fn play_from(&self, initial: Bitboard, seed: u64) -> GameOutcome {
        let mut white =
            Agent::new(self.white.clone().with_seed(self.white.seed.wrapping_add(seed)));
        let mut black = Agent::new(
            self.black
                .clone()
                .with_seed(self.black.seed.wrapping_add(seed).wrapping_add(1)),
        );

        let mut board = initial;
        let mut moves = Vec::new();

        while !board.is_game_over() {
            let agent = match board.turn_player() {
                Player::White => &mut white,
                Player::Black => &mut black,
            };
            let budget = agent.config().time_budget();
            let Some(mv) = agent.choose_move(&board, budget) else {
                break;
            };
            board.play(mv);
            moves.push(mv);
        }

        GameOutcome {
            result: board.result(),
            plies: moves.len() as u32,
            moves,
        }
    }
}
