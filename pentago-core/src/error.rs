//! Error types for move validation and board construction

use crate::game::Player;
use thiserror::Error;

/// Reasons a move cannot be applied to a position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("move belongs to {mover:?} but {expected:?} is to play")]
    WrongPlayer { mover: Player, expected: Player },

    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },

    #[error("swap needs two distinct quadrants, got quadrant {0} twice")]
    SameQuadrant(u8),

    #[error("move has no target cell")]
    NoTarget,

    #[error("move targets {0} cells, expected exactly one")]
    MultipleTargets(u32),

    #[error("game is already over")]
    GameOver,

    #[error("({row}, {col}) is off the board")]
    OutOfRange { row: usize, col: usize },
}

/// Reasons a position cannot be built from external data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell ({row}, {col}) is claimed by both players")]
    Overlap { row: usize, col: usize },

    #[error("ply count {0} is outside 0..=36")]
    PlyOutOfRange(u32),

    #[error("{pieces} pieces on the board but ply count is {ply}")]
    PieceCountMismatch { pieces: u32, ply: u32 },

    #[error("{found:?} cannot be on move at ply {ply}")]
    TurnMismatch { found: Player, ply: u32 },
}
