//! Packed move encoding
//!
//! A move fits in one `u64`:
//!
//! | bits  | field                           |
//! |-------|---------------------------------|
//! | 0-35  | one-hot target cell             |
//! | 36-37 | quadrant B (larger index)       |
//! | 38-39 | quadrant A (smaller index)      |
//! | 40    | player                          |
//! | 42-46 | priority, scratch for filtering |
//!
//! Priority never takes part in equality or hashing, so moves that differ only
//! in priority are the same move.

use crate::board::{bit_to_row_col, cell_bit, Quadrant, BOARD_SIZE, FULL_BOARD};
use crate::error::MoveError;
use crate::game::Player;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

const QUAD_B_SHIFT: u32 = 36;
const QUAD_A_SHIFT: u32 = 38;
const PLAYER_SHIFT: u32 = 40;
const PRIORITY_SHIFT: u32 = 42;

const QUAD_FIELD: u64 = 0b11;
const PRIORITY_FIELD: u64 = 0b1_1111;

/// Largest priority a move can carry
pub const MAX_PRIORITY: u8 = PRIORITY_FIELD as u8;

/// Every bit that identifies a move (all fields except priority)
const KEY_MASK: u64 = FULL_BOARD
    | (QUAD_FIELD << QUAD_B_SHIFT)
    | (QUAD_FIELD << QUAD_A_SHIFT)
    | (1 << PLAYER_SHIFT);

// ============================================================================
// MOVE
// ============================================================================

/// A placement followed by a quadrant swap
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Move(u64);

impl Move {
    /// Build a move; the quadrant pair is stored smaller index first.
    pub fn new(player: Player, quad_a: u8, quad_b: u8, target: u64) -> Self {
        debug_assert!(quad_a < 4 && quad_b < 4);
        let (lo, hi) = if quad_a <= quad_b { (quad_a, quad_b) } else { (quad_b, quad_a) };
        Self(
            (target & FULL_BOARD)
                | ((hi as u64 & QUAD_FIELD) << QUAD_B_SHIFT)
                | ((lo as u64 & QUAD_FIELD) << QUAD_A_SHIFT)
                | ((player as u64) << PLAYER_SHIFT),
        )
    }

    /// Move placing on (row, col)
    pub fn at(player: Player, row: usize, col: usize, quad_a: u8, quad_b: u8) -> Self {
        Self::new(player, quad_a, quad_b, cell_bit(row, col))
    }

    /// Reinterpret a raw encoding; nothing is validated.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Encoding with the priority bits cleared
    pub const fn key(self) -> u64 {
        self.0 & KEY_MASK
    }

    pub const fn target(self) -> u64 {
        self.0 & FULL_BOARD
    }

    pub const fn quad_a(self) -> u8 {
        ((self.0 >> QUAD_A_SHIFT) & QUAD_FIELD) as u8
    }

    pub const fn quad_b(self) -> u8 {
        ((self.0 >> QUAD_B_SHIFT) & QUAD_FIELD) as u8
    }

    pub fn player(self) -> Player {
        if (self.0 >> PLAYER_SHIFT) & 1 == 0 {
            Player::White
        } else {
            Player::Black
        }
    }

    pub const fn priority(self) -> u8 {
        ((self.0 >> PRIORITY_SHIFT) & PRIORITY_FIELD) as u8
    }

    /// Same move carrying a new priority, saturating at [`MAX_PRIORITY`]
    pub fn with_priority(self, priority: u8) -> Self {
        let priority = priority.min(MAX_PRIORITY) as u64;
        Self((self.0 & !(PRIORITY_FIELD << PRIORITY_SHIFT)) | (priority << PRIORITY_SHIFT))
    }

    /// Target cell as (row, col) if the move has exactly one target
    pub fn row_col(self) -> Option<(usize, usize)> {
        match self.target().count_ones() {
            1 => Some(bit_to_row_col(self.target())),
            _ => None,
        }
    }

    /// Structural checks that do not depend on a position
    pub fn check_shape(self) -> Result<(), MoveError> {
        if self.quad_a() == self.quad_b() {
            return Err(MoveError::SameQuadrant(self.quad_a()));
        }
        match self.target().count_ones() {
            0 => Err(MoveError::NoTarget),
            1 => Ok(()),
            n => Err(MoveError::MultipleTargets(n)),
        }
    }

    /// Decode into the external placement form.
    pub fn to_placement(self) -> Result<Placement, MoveError> {
        self.check_shape()?;
        let (row, col) = bit_to_row_col(self.target());
        Ok(Placement {
            row,
            col,
            quad_a: Quadrant::ALL[self.quad_a() as usize],
            quad_b: Quadrant::ALL[self.quad_b() as usize],
            player: self.player(),
        })
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, p={})", self.priority())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_col() {
            Some((row, col)) => write!(
                f,
                "{:?} ({row},{col}) swap {}<->{}",
                self.player(),
                self.quad_a(),
                self.quad_b()
            ),
            None => write!(f, "{:?} <malformed {:#x}>", self.player(), self.0),
        }
    }
}

// ============================================================================
// PLACEMENT
// ============================================================================

/// Coordinate form of a move, as exchanged with an external board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub quad_a: Quadrant,
    pub quad_b: Quadrant,
    pub player: Player,
}

impl Placement {
    pub fn to_move(self) -> Result<Move, MoveError> {
        if self.row >= BOARD_SIZE || self.col >= BOARD_SIZE {
            return Err(MoveError::OutOfRange { row: self.row, col: self.col });
        }
        if self.quad_a == self.quad_b {
            return Err(MoveError::SameQuadrant(self.quad_a.index()));
        }
        Ok(Move::at(
            self.player,
            self.row,
            self.col,
            self.quad_a.index(),
            self.quad_b.index(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::cell_index;

    #[test]
    fn test_field_layout() {
        let mv = Move::at(Player::Black, 2, 4, 3, 1);
        let raw = mv.raw();
        assert_eq!(raw & FULL_BOARD, 1 << cell_index(2, 4));
        assert_eq!((raw >> 36) & 0b11, 3);
        assert_eq!((raw >> 38) & 0b11, 1);
        assert_eq!((raw >> 40) & 1, 1);
        assert_eq!(mv.quad_a(), 1);
        assert_eq!(mv.quad_b(), 3);
        assert_eq!(mv.player(), Player::Black);
        assert_eq!(mv.row_col(), Some((2, 4)));
    }

    #[test]
    fn test_priority_ignored_by_identity() {
        let mv = Move::at(Player::White, 0, 0, 0, 1);
        let ranked = mv.with_priority(7);
        assert_eq!(ranked.priority(), 7);
        assert_eq!(ranked, mv);
        assert_eq!(ranked.key(), mv.key());
        assert_ne!(ranked.raw(), mv.raw());

        let mut set = rustc_hash::FxHashSet::default();
        set.insert(mv);
        assert!(set.contains(&ranked));
    }

    #[test]
    fn test_priority_saturates() {
        let mv = Move::at(Player::White, 1, 1, 0, 2).with_priority(200);
        assert_eq!(mv.priority(), MAX_PRIORITY);
        assert_eq!(mv.player(), Player::White);
        assert_eq!(mv.quad_b(), 2);
    }

    #[test]
    fn test_malformed_moves_rejected() {
        let same = Move::at(Player::White, 0, 0, 2, 2);
        assert_eq!(same.check_shape(), Err(MoveError::SameQuadrant(2)));

        let none = Move::new(Player::White, 0, 1, 0);
        assert_eq!(none.check_shape(), Err(MoveError::NoTarget));

        let two = Move::new(Player::White, 0, 1, 0b11);
        assert_eq!(two.check_shape(), Err(MoveError::MultipleTargets(2)));
        assert!(two.to_placement().is_err());
    }

    #[test]
    fn test_placement_conversion() {
        let mv = Move::at(Player::Black, 5, 3, 0, 3);
        let placement = mv.to_placement().unwrap();
        assert_eq!(placement.row, 5);
        assert_eq!(placement.col, 3);
        assert_eq!(placement.quad_a, Quadrant::TopLeft);
        assert_eq!(placement.quad_b, Quadrant::BottomRight);
        assert_eq!(placement.to_move().unwrap(), mv);

        let off_board = Placement { row: 6, ..placement };
        assert!(matches!(off_board.to_move(), Err(MoveError::OutOfRange { .. })));

        let same = Placement { quad_b: Quadrant::TopLeft, ..placement };
        assert_eq!(same.to_move(), Err(MoveError::SameQuadrant(0)));
    }

    #[test]
    fn test_serde_is_raw_encoding() {
        let mv = Move::at(Player::White, 3, 3, 1, 2).with_priority(4);
        let json = serde_json::to_string(&mv).unwrap();
        assert_eq!(json, mv.raw().to_string());
        let back: Move = serde_json::from_str(&json).unwrap();
        assert_eq!(back.raw(), mv.raw());
    }
}
