//! Position evaluation
//!
//! Lines are scored under every swap the side to move could make next. A
//! line still open for a player (no opposing piece on it) is worth the square
//! of the pieces already on it.

use crate::board::{swap_quadrants, QUAD_SWAPS, WIN_MASKS};
use crate::game::{Bitboard, GameResult, Player};
use serde::{Deserialize, Serialize};

/// Win value (effectively infinite)
pub const WIN_VALUE: f32 = 100000.0;

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heuristics {
    /// Weight of the evaluating player's open lines
    pub own_line_weight: f32,
    /// Weight of the opponent's open lines
    pub opponent_line_weight: f32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            own_line_weight: 1.0,
            opponent_line_weight: 1.0,
        }
    }
}

/// Evaluate a position from `player`'s perspective
pub fn evaluate(board: &Bitboard, player: Player, heuristics: &Heuristics) -> f32 {
    match board.result() {
        GameResult::Ongoing => {}
        GameResult::Draw => return 0.0,
        result => {
            return if result.winner() == Some(player) {
                WIN_VALUE
            } else {
                -WIN_VALUE
            };
        }
    }

    let mine = board.pieces(player);
    let theirs = board.pieces(player.opponent());

    let mut score = 0.0f32;
    for &(a, b) in &QUAD_SWAPS {
        let mine = swap_quadrants(mine, a, b);
        let theirs = swap_quadrants(theirs, a, b);
        for &mask in WIN_MASKS.iter() {
            let own = (mine & mask).count_ones() as f32;
            let opposing = (theirs & mask).count_ones() as f32;
            if opposing == 0.0 {
                score += heuristics.own_line_weight * own * own;
            }
            if own == 0.0 {
                score -= heuristics.opponent_line_weight * opposing * opposing;
            }
        }
    }
    score
}

/// Evaluate with a depth bonus so faster wins and slower losses score higher
pub fn evaluate_with_depth(
    board: &Bitboard,
    player: Player,
    heuristics: &Heuristics,
    depth: i32,
) -> f32 {
    let base = evaluate(board, player, heuristics);
    if base >= WIN_VALUE {
        base + depth as f32
    } else if base <= -WIN_VALUE {
        base - depth as f32
    } else {
        base
    }
}

impl Bitboard {
    /// Static evaluation from `player`'s perspective with default weights
    pub fn evaluate(&self, player: Player) -> f32 {
        evaluate(self, player, &Heuristics::default())
    }
}
