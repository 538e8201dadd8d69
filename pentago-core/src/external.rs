//! Adapter between external board representations and [`Bitboard`]

use crate::board::{cell_bit, BOARD_SIZE, MAX_PLIES};
use crate::error::BoardError;
use crate::game::{Bitboard, GameResult, Player};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Contents of one cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    White,
    Black,
}

impl From<Option<Player>> for Cell {
    fn from(owner: Option<Player>) -> Self {
        match owner {
            Some(Player::White) => Cell::White,
            Some(Player::Black) => Cell::Black,
            None => Cell::Empty,
        }
    }
}

/// Any board that can report cell contents, side to move and plies played
pub trait ExternalBoard {
    fn cell(&self, row: usize, col: usize) -> Cell;
    fn turn_player(&self) -> Player;
    fn ply_count(&self) -> u32;
    /// Outcome as the external board sees it.
    ///
    /// Advisory only: [`Bitboard::from_external`] recomputes the result from
    /// the pieces and logs a disagreement instead of failing.
    fn outcome(&self) -> GameResult;
}

impl Bitboard {
    /// Read an external board in row-major order.
    ///
    /// The result is recomputed from the pieces; a differing external outcome
    /// is logged and ignored.
    pub fn from_external<B: ExternalBoard + ?Sized>(external: &B) -> Result<Self, BoardError> {
        let ply = external.ply_count();
        if ply > MAX_PLIES as u32 {
            return Err(BoardError::PlyOutOfRange(ply));
        }

        let mut white = 0u64;
        let mut black = 0u64;
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                match external.cell(row, col) {
                    Cell::White => white |= cell_bit(row, col),
                    Cell::Black => black |= cell_bit(row, col),
                    Cell::Empty => {}
                }
            }
        }

        let board = Bitboard::from_parts(white, black, ply)?;
        if board.turn_player() != external.turn_player() {
            return Err(BoardError::TurnMismatch {
                found: external.turn_player(),
                ply,
            });
        }
        let reported = external.outcome();
        if reported != board.result() {
            debug!(?reported, recomputed = ?board.result(), "external outcome disagrees");
        }
        Ok(board)
    }
}

// ============================================================================
// GRID BOARD
// ============================================================================

/// Plain grid board, the JSON exchange format of the CLI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBoard {
    /// Rows top to bottom, each a string of `W`, `B` or `.` (spaces ignored)
    pub rows: Vec<String>,
    pub turn_player: Player,
    pub ply: u32,
    #[serde(default = "ongoing")]
    pub outcome: GameResult,
}

fn ongoing() -> GameResult {
    GameResult::Ongoing
}

impl GridBoard {
    pub fn from_bitboard(board: &Bitboard) -> Self {
        let rows = (0..BOARD_SIZE)
            .map(|row| {
                (0..BOARD_SIZE)
                    .map(|col| match board.cell(row, col) {
                        Some(Player::White) => 'W',
                        Some(Player::Black) => 'B',
                        None => '.',
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            turn_player: board.turn_player(),
            ply: board.turn_number() as u32,
            outcome: board.result(),
        }
    }
}

impl ExternalBoard for GridBoard {
    fn cell(&self, row: usize, col: usize) -> Cell {
        self.rows
            .get(row)
            .and_then(|line| line.chars().filter(|c| !c.is_whitespace()).nth(col))
            .map_or(Cell::Empty, |symbol| match symbol {
                'W' | 'w' => Cell::White,
                'B' | 'b' => Cell::Black,
                _ => Cell::Empty,
            })
    }

    fn turn_player(&self) -> Player {
        self.turn_player
    }

    fn ply_count(&self) -> u32 {
        self.ply
    }

    fn outcome(&self) -> GameResult {
        self.outcome
    }
}

impl ExternalBoard for Bitboard {
    fn cell(&self, row: usize, col: usize) -> Cell {
        Bitboard::cell(self, row, col).into()
    }

    fn turn_player(&self) -> Player {
        Bitboard::turn_player(self)
    }

    fn ply_count(&self) -> u32 {
        self.turn_number() as u32
    }

    fn outcome(&self) -> GameResult {
        self.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::double_threat_board;
    use crate::moves::Move;

    #[test]
    fn test_grid_round_trip() {
        let board = double_threat_board();
        let grid = GridBoard::from_bitboard(&board);
        assert_eq!(grid.rows[0], ".BB.BB");
        assert_eq!(Bitboard::from_external(&grid).unwrap(), board);
        assert_eq!(Bitboard::from_external(&board).unwrap(), board);
    }

    #[test]
    fn test_grid_from_json() {
        let json = r#"{
            "rows": ["W . . . . .", ". . . . . .", ". . . . . .",
                     ". . . . . .", ". . . . . .", ". . . . . B"],
            "turn_player": "White",
            "ply": 2
        }"#;
        let grid: GridBoard = serde_json::from_str(json).unwrap();
        assert_eq!(grid.outcome(), GameResult::Ongoing);
        assert_eq!(grid.cell(0, 0), Cell::White);
        assert_eq!(grid.cell(5, 5), Cell::Black);
        assert_eq!(grid.cell(9, 9), Cell::Empty);

        let board = Bitboard::from_external(&grid).unwrap();
        assert_eq!(board.turn_player(), Player::White);
        assert_eq!(board.pieces(Player::Black), cell_bit(5, 5));
    }

    #[test]
    fn test_outcome_is_recomputed() {
        let mut board = Bitboard::new();
        for (player, row, col) in [
            (Player::White, 0, 0),
            (Player::Black, 5, 5),
            (Player::White, 0, 1),
            (Player::Black, 5, 4),
            (Player::White, 0, 2),
            (Player::Black, 4, 5),
            (Player::White, 0, 3),
            (Player::Black, 4, 4),
            (Player::White, 0, 4),
        ] {
            board.apply(Move::at(player, row, col, 2, 3)).unwrap();
        }
        assert_eq!(board.result(), GameResult::WhiteWins);

        let mut grid = GridBoard::from_bitboard(&board);
        grid.outcome = GameResult::Ongoing;
        let loaded = Bitboard::from_external(&grid).unwrap();
        assert_eq!(loaded.result(), GameResult::WhiteWins);
        assert_eq!(loaded, board);

        let mut grid = GridBoard::from_bitboard(&Bitboard::new());
        grid.outcome = GameResult::Draw;
        assert_eq!(Bitboard::from_external(&grid).unwrap().result(), GameResult::Ongoing);
    }

    #[test]
    fn test_rejects_inconsistent_boards() {
        let mut grid = GridBoard::from_bitboard(&Bitboard::new());
        grid.ply = 40;
        assert_eq!(Bitboard::from_external(&grid), Err(BoardError::PlyOutOfRange(40)));

        grid.ply = 1;
        assert!(matches!(
            Bitboard::from_external(&grid),
            Err(BoardError::PieceCountMismatch { .. })
        ));

        let mut board = Bitboard::new();
        board.apply(Move::at(Player::White, 2, 2, 0, 1)).unwrap();
        let mut grid = GridBoard::from_bitboard(&board);
        grid.turn_player = Player::White;
        assert!(matches!(
            Bitboard::from_external(&grid),
            Err(BoardError::TurnMismatch { .. })
        ));
    }
}
