//! Rollout (simulation) strategies for MCTS
//!
//! A rollout plays the position out to the end: an immediate win is always
//! taken, otherwise a uniformly random legal move is played.
//!
//! ## Architecture
//! - Level 2: Batch rollout coordination
//! - Level 3: Single rollout implementation

use pentago_core::{Bitboard, GameResult};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// ROLLOUT RESULT
// ============================================================================

/// Result of a rollout simulation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RolloutResult {
    /// Final game result
    pub result: GameResult,
    /// Number of moves played
    pub moves_played: u32,
}

// ============================================================================
// CPU ROLLOUT (Level 3 - Single Rollout)
// ============================================================================

/// Play a position to completion on a copy of the board
pub fn cpu_rollout<R: Rng + ?Sized>(board: &Bitboard, rng: &mut R) -> RolloutResult {
    let mut current = *board;
    let mut moves_played = 0;

    while !current.is_game_over() {
        let mover = current.turn_player();
        let next = match current.winning_move(mover) {
            Some(win) => Some(win),
            None => current.random_move(rng),
        };
        let Some(mv) = next else {
            break;
        };
        current.play(mv);
        moves_played += 1;
    }

    RolloutResult {
        result: current.result(),
        moves_played,
    }
}

// ============================================================================
// BATCH ROLLOUT (Level 2 - Batch Coordination)
// ============================================================================

/// Seeded engine running rollouts one after another
pub struct RolloutEngine {
    rng: ChaCha8Rng,
}

impl RolloutEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn rollout(&mut self, board: &Bitboard) -> RolloutResult {
        cpu_rollout(board, &mut self.rng)
    }

    /// Perform batch rollouts sequentially
    pub fn rollout_batch(&mut self, boards: &[Bitboard]) -> Vec<RolloutResult> {
        boards.iter().map(|board| self.rollout(board)).collect()
    }
}

// ============================================================================
// PARALLEL CPU ROLLOUT
// ============================================================================

/// Parallel CPU rollouts using rayon
#[cfg(feature = "parallel")]
pub fn parallel_cpu_rollouts(boards: &[Bitboard], seed: u64) -> Vec<RolloutResult> {
    use rayon::prelude::*;

    boards
        .par_iter()
        .enumerate()
        .map(|(i, board)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
            cpu_rollout(board, &mut rng)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
