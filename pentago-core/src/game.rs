//! Game state: bitboard position, move generation and threat queries

use crate::board::{
    bit_to_row_col, cell_bit, has_line, iter_bits, nth_bit, quadrant_bits, swap_quadrants,
    BOARD_SIZE, FULL_BOARD, MAX_PLIES, QUADRANT_MASKS, QUAD_SWAPS, WIN_MASKS,
};
use crate::error::{BoardError, MoveError};
use crate::moves::Move;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player color; White moves first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    White = 0,
    Black = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Player whose turn it is after `ply` plies
    pub fn to_move_at(ply: u32) -> Self {
        if ply % 2 == 0 {
            Player::White
        } else {
            Player::Black
        }
    }
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    pub fn win_for(player: Player) -> Self {
        match player {
            Player::White => GameResult::WhiteWins,
            Player::Black => GameResult::BlackWins,
        }
    }

    /// Winning player, if any
    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::WhiteWins => Some(Player::White),
            GameResult::BlackWins => Some(Player::Black),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }

    pub fn is_decided(self) -> bool {
        self != GameResult::Ongoing
    }
}

// ============================================================================
// BITBOARD
// ============================================================================

/// A Pentago-Swap position.
///
/// `pieces[p]` holds the cells owned by player `p`. The result is cached and
/// recomputed after every `play`/`undo`, so it always agrees with a full scan
/// of the win masks. Deserializing goes through [`Bitboard::from_parts`]; the
/// serialized side to move and result are derived again, never trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitboard")]
pub struct Bitboard {
    pieces: [u64; 2],
    turn_player: Player,
    turn_number: u8,
    result: GameResult,
}

/// Serialized fields a position is rebuilt from
#[derive(Deserialize)]
struct RawBitboard {
    pieces: [u64; 2],
    turn_number: u32,
}

impl TryFrom<RawBitboard> for Bitboard {
    type Error = BoardError;

    fn try_from(raw: RawBitboard) -> Result<Self, Self::Error> {
        Bitboard::from_parts(raw.pieces[0], raw.pieces[1], raw.turn_number)
    }
}

impl Default for Bitboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Bitboard {
    /// Empty board, White to move
    pub fn new() -> Self {
        Self {
            pieces: [0, 0],
            turn_player: Player::White,
            turn_number: 0,
            result: GameResult::Ongoing,
        }
    }

    /// Build a position from raw piece masks and the number of plies played.
    ///
    /// The side to move follows from the ply parity.
    pub fn from_parts(white: u64, black: u64, ply: u32) -> Result<Self, BoardError> {
        if ply > MAX_PLIES as u32 {
            return Err(BoardError::PlyOutOfRange(ply));
        }
        let overlap = white & black;
        if overlap != 0 {
            let (row, col) = bit_to_row_col(overlap);
            return Err(BoardError::Overlap { row, col });
        }
        let white = white & FULL_BOARD;
        let black = black & FULL_BOARD;
        let count = (white | black).count_ones();
        if count != ply {
            return Err(BoardError::PieceCountMismatch { pieces: count, ply });
        }

        let mut board = Self {
            pieces: [white, black],
            turn_player: Player::to_move_at(ply),
            turn_number: ply as u8,
            result: GameResult::Ongoing,
        };
        board.update_result();
        Ok(board)
    }

    pub fn pieces(&self, player: Player) -> u64 {
        self.pieces[player.index()]
    }

    pub fn occupied(&self) -> u64 {
        self.pieces[0] | self.pieces[1]
    }

    pub fn empty_cells(&self) -> u64 {
        !self.occupied() & FULL_BOARD
    }

    /// Owner of a cell
    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        let bit = cell_bit(row, col);
        if self.pieces[0] & bit != 0 {
            Some(Player::White)
        } else if self.pieces[1] & bit != 0 {
            Some(Player::Black)
        } else {
            None
        }
    }

    pub fn turn_player(&self) -> Player {
        self.turn_player
    }

    /// Plies played so far
    pub fn turn_number(&self) -> u8 {
        self.turn_number
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_game_over(&self) -> bool {
        self.turn_number >= MAX_PLIES || self.result.is_decided()
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Every placement on an empty cell inside `scope`, combined with every swap
    pub fn legal_moves(&self, scope: u64) -> Vec<Move> {
        if self.is_game_over() {
            return Vec::new();
        }
        let empty = self.empty_cells() & scope;
        let mut moves = Vec::with_capacity(empty.count_ones() as usize * QUAD_SWAPS.len());
        for target in iter_bits(empty) {
            for &(a, b) in &QUAD_SWAPS {
                moves.push(Move::new(self.turn_player, a, b, target));
            }
        }
        moves
    }

    pub fn all_legal_moves(&self) -> Vec<Move> {
        self.legal_moves(FULL_BOARD)
    }

    /// Legal moves with quadrant symmetries folded away.
    ///
    /// Quadrants with identical contents are interchangeable, so only one
    /// representative of each class needs placements. Every legal move has a
    /// counterpart here that yields the same multiset of quadrant contents.
    pub fn legal_moves_reduced(&self) -> Vec<Move> {
        if self.is_game_over() {
            return Vec::new();
        }
        let player = self.turn_player;
        let classes = self.quadrant_classes();

        match classes.as_slice() {
            [all] => iter_bits(self.empty_cells() & QUADRANT_MASKS[all[0]])
                .map(|target| Move::new(player, 1, 2, target))
                .collect(),
            [first, second] if first.len() == 2 => {
                self.legal_moves(QUADRANT_MASKS[first[0]] | QUADRANT_MASKS[second[0]])
            }
            [first, second] => {
                let (unique, trio) = if first.len() == 1 {
                    (first[0], second)
                } else {
                    (second[0], first)
                };
                let mut moves = self.legal_moves(QUADRANT_MASKS[trio[0]]);

                let mut swaps: Vec<(u8, u8)> = trio
                    .iter()
                    .map(|&t| (unique.min(t) as u8, unique.max(t) as u8))
                    .collect();
                swaps.push((trio[0] as u8, trio[1] as u8));

                for target in iter_bits(self.empty_cells() & QUADRANT_MASKS[unique]) {
                    for &(a, b) in &swaps {
                        moves.push(Move::new(player, a, b, target));
                    }
                }
                moves
            }
            _ => self.all_legal_moves(),
        }
    }

    /// Group quadrants with identical contents, in order of first appearance
    fn quadrant_classes(&self) -> Vec<Vec<usize>> {
        let mut classes: Vec<((u64, u64), Vec<usize>)> = Vec::with_capacity(4);
        for quadrant in 0..4 {
            let key = (
                quadrant_bits(self.pieces[0], quadrant),
                quadrant_bits(self.pieces[1], quadrant),
            );
            match classes.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(quadrant),
                None => classes.push((key, vec![quadrant])),
            }
        }
        classes.into_iter().map(|(_, members)| members).collect()
    }

    /// Uniformly random empty cell with a uniformly random swap
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        if self.is_game_over() {
            return None;
        }
        let empty = self.empty_cells();
        if empty == 0 {
            return None;
        }
        let target = nth_bit(empty, rng.gen_range(0..empty.count_ones()))?;
        let (a, b) = QUAD_SWAPS[rng.gen_range(0..QUAD_SWAPS.len())];
        Some(Move::new(self.turn_player, a, b, target))
    }

    // ========================================================================
    // APPLY / UNDO
    // ========================================================================

    /// Check a move against this position without applying it
    pub fn check_legal(&self, mv: Move) -> Result<(), MoveError> {
        mv.check_shape()?;
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if mv.player() != self.turn_player {
            return Err(MoveError::WrongPlayer {
                mover: mv.player(),
                expected: self.turn_player,
            });
        }
        if self.occupied() & mv.target() != 0 {
            let (row, col) = bit_to_row_col(mv.target());
            return Err(MoveError::Occupied { row, col });
        }
        Ok(())
    }

    /// Validate and apply a move; the position is unchanged on error.
    pub fn apply(&mut self, mv: Move) -> Result<(), MoveError> {
        self.check_legal(mv)?;
        self.play(mv);
        Ok(())
    }

    /// Apply a move known to be legal.
    ///
    /// Used on search hot paths where moves come straight from move
    /// generation. Legality is only checked in debug builds.
    #[inline]
    pub fn play(&mut self, mv: Move) {
        debug_assert_eq!(self.check_legal(mv), Ok(()), "illegal move {mv}");
        self.pieces[self.turn_player.index()] |= mv.target();
        self.swap(mv.quad_a(), mv.quad_b());
        self.turn_number += 1;
        self.update_result();
        self.turn_player = self.turn_player.opponent();
    }

    /// Revert the most recent `play`/`apply` of `mv`.
    ///
    /// Only valid in LIFO order with the exact move that was played.
    #[inline]
    pub fn undo(&mut self, mv: Move) {
        let mover = self.turn_player.opponent();
        debug_assert_eq!(mv.player(), mover, "undo out of order: {mv}");
        debug_assert!(self.turn_number > 0);
        self.swap(mv.quad_a(), mv.quad_b());
        debug_assert!(self.pieces[mover.index()] & mv.target() != 0);
        self.pieces[mover.index()] &= !mv.target();
        self.turn_number -= 1;
        self.update_result();
        self.turn_player = mover;
    }

    #[inline]
    fn swap(&mut self, a: u8, b: u8) {
        self.pieces[0] = swap_quadrants(self.pieces[0], a, b);
        self.pieces[1] = swap_quadrants(self.pieces[1], a, b);
    }

    fn update_result(&mut self) {
        let white = has_line(self.pieces[0]);
        let black = has_line(self.pieces[1]);
        self.result = match (white, black) {
            (true, true) => GameResult::Draw,
            (true, false) => GameResult::WhiteWins,
            (false, true) => GameResult::BlackWins,
            (false, false) if self.turn_number >= MAX_PLIES => GameResult::Draw,
            (false, false) => GameResult::Ongoing,
        };
    }

    // ========================================================================
    // THREAT QUERIES
    // ========================================================================

    /// A move that wins on the spot for `player`, if one exists.
    ///
    /// Pure query: `player` need not be the side to move.
    pub fn winning_move(&self, player: Player) -> Option<Move> {
        if self.is_game_over() {
            return None;
        }
        QUAD_SWAPS
            .iter()
            .find_map(|&(a, b)| self.winning_placement(player, a, b))
    }

    /// Number of swaps under which `player` has a winning placement
    pub fn threat_count(&self, player: Player) -> u8 {
        if self.is_game_over() {
            return 0;
        }
        QUAD_SWAPS
            .iter()
            .filter(|&&(a, b)| self.winning_placement(player, a, b).is_some())
            .count() as u8
    }

    /// Winning placement for `player` combined with swap (a, b).
    ///
    /// Lines are read in swapped coordinates, and the target is mapped back
    /// through the same swap.
    fn winning_placement(&self, player: Player, a: u8, b: u8) -> Option<Move> {
        let mine = swap_quadrants(self.pieces[player.index()], a, b);
        let theirs = swap_quadrants(self.pieces[player.opponent().index()], a, b);
        // Opponent line after this swap means a draw at best
        if has_line(theirs) {
            return None;
        }
        let empty = !(mine | theirs) & FULL_BOARD;
        if empty == 0 {
            return None;
        }

        for &mask in WIN_MASKS.iter() {
            if mask & theirs != 0 {
                continue;
            }
            let missing = mask & !mine;
            let target = match missing.count_ones() {
                0 => empty & empty.wrapping_neg(),
                1 => missing,
                _ => continue,
            };
            return Some(Move::new(player, a, b, swap_quadrants(target, a, b)));
        }
        None
    }

    /// True when the player who just moved has a win that the side to move
    /// cannot stop with any reply.
    pub fn is_critical_state(&self) -> bool {
        if self.is_game_over() {
            return false;
        }
        let defender = self.turn_player;
        let attacker = defender.opponent();
        if self.winning_move(defender).is_some() || self.winning_move(attacker).is_none() {
            return false;
        }

        let mut scratch = *self;
        let mut stack = MoveStack::new(&mut scratch);
        for reply in self.legal_moves_reduced() {
            stack.push(reply);
            let after = stack.board();
            let holds = match after.result() {
                GameResult::Ongoing => after.winning_move(attacker).is_some(),
                result => result.winner() == Some(attacker),
            };
            stack.pop();
            if !holds {
                return false;
            }
        }
        true
    }

    /// True when, whatever the side to move replies, the player who just
    /// moved can win outright or reach a critical state on the next move.
    pub fn is_two_move_critical_state(&self) -> bool {
        if self.is_game_over() {
            return false;
        }
        let defender = self.turn_player;
        let attacker = defender.opponent();
        if self.winning_move(defender).is_some() {
            return false;
        }

        let mut scratch = *self;
        let mut stack = MoveStack::new(&mut scratch);
        for reply in self.legal_moves_reduced() {
            stack.push(reply);
            let after = *stack.board();
            let holds = match after.result() {
                GameResult::Ongoing => {
                    after.winning_move(attacker).is_some()
                        || (after.has_developing_line(attacker) && after.has_critical_follow_up())
                }
                result => result.winner() == Some(attacker),
            };
            stack.pop();
            if !holds {
                return false;
            }
        }
        true
    }

    /// Some move of the side to move wins or leaves a critical state
    pub fn has_critical_follow_up(&self) -> bool {
        let mover = self.turn_player;
        let mut scratch = *self;
        let mut stack = MoveStack::new(&mut scratch);
        for mv in self.legal_moves_reduced() {
            stack.push(mv);
            let after = stack.board();
            let found = match after.result() {
                GameResult::Ongoing => after.is_critical_state(),
                result => result.winner() == Some(mover),
            };
            stack.pop();
            if found {
                return true;
            }
        }
        false
    }

    /// True if, under some composition of at most two swaps, `player` holds
    /// at least three cells of a win line with no opposing piece on it.
    ///
    /// Necessary for `player` to reach a critical state within one move.
    pub fn has_developing_line(&self, player: Player) -> bool {
        let mine = self.pieces[player.index()];
        let theirs = self.pieces[player.opponent().index()];
        let developing = |mine: u64, theirs: u64| {
            WIN_MASKS
                .iter()
                .any(|&mask| mask & theirs == 0 && (mask & mine).count_ones() >= 3)
        };

        if developing(mine, theirs) {
            return true;
        }
        QUAD_SWAPS.iter().any(|&(a, b)| {
            let mine = swap_quadrants(mine, a, b);
            let theirs = swap_quadrants(theirs, a, b);
            developing(mine, theirs)
                || QUAD_SWAPS.iter().any(|&(c, d)| {
                    developing(swap_quadrants(mine, c, d), swap_quadrants(theirs, c, d))
                })
        })
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            if row == 3 {
                writeln!(f, "------+------")?;
            }
            for col in 0..BOARD_SIZE {
                if col == 3 {
                    write!(f, "|")?;
                }
                let symbol = match self.cell(row, col) {
                    Some(Player::White) => 'W',
                    Some(Player::Black) => 'B',
                    None => '.',
                };
                write!(f, "{symbol} ")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "ply {} | {:?} to move | {:?}",
            self.turn_number, self.turn_player, self.result
        )
    }
}

// ============================================================================
// MOVE STACK
// ============================================================================

/// LIFO apply/undo over a borrowed board.
///
/// Every pushed move is undone when the stack is dropped, so the board is
/// always returned to the position it had when the stack was created.
pub struct MoveStack<'a> {
    board: &'a mut Bitboard,
    moves: Vec<Move>,
}

impl<'a> MoveStack<'a> {
    pub fn new(board: &'a mut Bitboard) -> Self {
        Self {
            board,
            moves: Vec::with_capacity(8),
        }
    }

    pub fn board(&self) -> &Bitboard {
        self.board
    }

    pub fn depth(&self) -> usize {
        self.moves.len()
    }

    /// Play a move from move generation (unchecked in release builds)
    pub fn push(&mut self, mv: Move) {
        self.board.play(mv);
        self.moves.push(mv);
    }

    /// Validate, then play
    pub fn try_push(&mut self, mv: Move) -> Result<(), MoveError> {
        self.board.apply(mv)?;
        self.moves.push(mv);
        Ok(())
    }

    /// Undo the most recent move
    pub fn pop(&mut self) -> Option<Move> {
        let mv = self.moves.pop()?;
        self.board.undo(mv);
        Some(mv)
    }
}

impl Drop for MoveStack<'_> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Build a position from a picture: 'W', 'B' or '.' per cell, rows top down
    pub(crate) fn board_from_rows(rows: [&str; 6]) -> Bitboard {
        let mut white = 0;
        let mut black = 0;
        for (row, line) in rows.iter().enumerate() {
            for (col, symbol) in line.chars().filter(|c| !c.is_whitespace()).enumerate() {
                match symbol {
                    'W' => white |= cell_bit(row, col),
                    'B' => black |= cell_bit(row, col),
                    _ => {}
                }
            }
        }
        let ply = (white | black).count_ones();
        Bitboard::from_parts(white, black, ply).unwrap()
    }

    /// Each quadrant holds Black at local (0,1),(0,2) and White at local
    /// (1,2),(2,0). Black just moved and threatens both top rows of the
    /// quadrant pairs; White cannot cover both.
    pub(crate) fn double_threat_board() -> Bitboard {
        board_from_rows([
            ". B B . B B",
            ". . W . . W",
            "W . . W . .",
            ". B B . B B",
            ". . W . . W",
            "W . . W . .",
        ])
    }

    pub(crate) fn random_position(rng: &mut ChaCha8Rng, plies: usize) -> Bitboard {
        let mut board = Bitboard::new();
        for _ in 0..plies {
            match board.random_move(rng) {
                Some(mv) => board.play(mv),
                None => break,
            }
        }
        board
    }

    fn scanned_result(board: &Bitboard) -> GameResult {
        let white = has_line(board.pieces(Player::White));
        let black = has_line(board.pieces(Player::Black));
        match (white, black) {
            (true, true) => GameResult::Draw,
            (true, false) => GameResult::WhiteWins,
            (false, true) => GameResult::BlackWins,
            _ if board.turn_number() >= MAX_PLIES => GameResult::Draw,
            _ => GameResult::Ongoing,
        }
    }

    fn quadrant_multiset(board: &Bitboard) -> Vec<(u64, u64)> {
        let mut contents: Vec<(u64, u64)> = (0..4)
            .map(|q| {
                (
                    quadrant_bits(board.pieces(Player::White), q),
                    quadrant_bits(board.pieces(Player::Black), q),
                )
            })
            .collect();
        contents.sort_unstable();
        contents
    }

    #[test]
    fn test_empty_board() {
        let board = Bitboard::new();
        assert_eq!(board.turn_player(), Player::White);
        assert_eq!(board.result(), GameResult::Ongoing);
        assert!(!board.is_game_over());
        assert_eq!(board.all_legal_moves().len(), 216);
        assert_eq!(board.legal_moves_reduced().len(), 9);
        assert!(board.winning_move(Player::White).is_none());
        assert!(board.winning_move(Player::Black).is_none());
    }

    #[test]
    fn test_apply_validation() {
        let mut board = Bitboard::new();
        let before = board;

        let wrong = Move::at(Player::Black, 0, 0, 0, 1);
        assert!(matches!(board.apply(wrong), Err(MoveError::WrongPlayer { .. })));
        let same = Move::at(Player::White, 0, 0, 1, 1);
        assert_eq!(board.apply(same), Err(MoveError::SameQuadrant(1)));
        assert_eq!(board, before);

        board.apply(Move::at(Player::White, 1, 1, 2, 3)).unwrap();
        assert_eq!(board.turn_player(), Player::Black);
        assert_eq!(board.turn_number(), 1);
        assert_eq!(board.cell(1, 1), Some(Player::White));

        let occupied = Move::at(Player::Black, 1, 1, 0, 1);
        assert_eq!(board.apply(occupied), Err(MoveError::Occupied { row: 1, col: 1 }));
    }

    #[test]
    fn test_swap_moves_placed_piece() {
        let mut board = Bitboard::new();
        board.apply(Move::at(Player::White, 0, 0, 0, 3)).unwrap();
        assert_eq!(board.cell(0, 0), None);
        assert_eq!(board.cell(3, 3), Some(Player::White));
    }

    #[test]
    fn test_apply_undo_random_walk() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let mut board = Bitboard::new();
            let mut history = Vec::new();
            let mut snapshots = vec![board];
            while let Some(mv) = board.random_move(&mut rng) {
                board.apply(mv).unwrap();
                assert_eq!(board.result(), scanned_result(&board));
                assert_eq!(board.pieces(Player::White) & board.pieces(Player::Black), 0);
                history.push(mv);
                snapshots.push(board);
            }
            assert!(board.is_game_over());
            snapshots.pop();
            while let Some(mv) = history.pop() {
                board.undo(mv);
                assert_eq!(Some(board), snapshots.pop());
                assert_eq!(board.result(), scanned_result(&board));
            }
            assert_eq!(board, Bitboard::new());
        }
    }

    #[test]
    fn test_move_stack_restores_on_drop() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut board = random_position(&mut rng, 8);
        let original = board;
        {
            let mut stack = MoveStack::new(&mut board);
            while stack.depth() < 5 {
                match stack.board().random_move(&mut rng) {
                    Some(mv) => stack.push(mv),
                    None => break,
                }
            }
            let depth = stack.depth();
            assert!(depth > 0);
            assert!(stack.pop().is_some());
            let bad = Move::at(Player::White, 0, 0, 0, 0);
            assert!(stack.try_push(bad).is_err());
            assert_eq!(stack.depth(), depth - 1);
        }
        assert_eq!(board, original);
    }

    #[test]
    fn test_legal_move_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for plies in [0, 5, 12, 20] {
            let board = random_position(&mut rng, plies);
            if board.is_game_over() {
                assert!(board.all_legal_moves().is_empty());
                continue;
            }
            let empty = board.empty_cells().count_ones() as usize;
            assert_eq!(board.all_legal_moves().len(), 6 * empty);
        }
    }

    #[test]
    fn test_reduced_moves_cover_full_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut positions = vec![Bitboard::new(), double_threat_board()];
        // Two identical pairs
        positions.push(board_from_rows([
            "W . . W . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
        ]));
        // Three identical quadrants and one unique
        positions.push(board_from_rows([
            ". . . . . .",
            ". W . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
        ]));
        for plies in 0..8 {
            positions.push(random_position(&mut rng, plies));
        }

        for board in positions {
            let full = board.all_legal_moves();
            let reduced = board.legal_moves_reduced();
            assert!(!reduced.is_empty() || full.is_empty());
            for mv in &reduced {
                assert!(full.contains(mv), "{mv} not legal on\n{board}");
            }

            let reachable: Vec<_> = reduced
                .iter()
                .map(|&mv| {
                    let mut next = board;
                    next.play(mv);
                    quadrant_multiset(&next)
                })
                .collect();
            for &mv in &full {
                let mut next = board;
                next.play(mv);
                let contents = quadrant_multiset(&next);
                assert!(reachable.contains(&contents), "{mv} has no reduced counterpart");
            }
        }
    }

    #[test]
    fn test_reduced_symmetry_cases() {
        let pairs = board_from_rows([
            "W . . W . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
        ]);
        // 8 + 9 empty cells in the two representatives, 6 swaps each
        assert_eq!(pairs.legal_moves_reduced().len(), 17 * 6);

        let single = board_from_rows([
            ". . . . . .",
            ". W . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
        ]);
        // Unique quadrant: 8 cells x 4 swaps; trio representative: 9 cells x 6
        assert_eq!(single.legal_moves_reduced().len(), 8 * 4 + 9 * 6);
    }

    #[test]
    fn test_winning_move_with_untouched_line() {
        let board = board_from_rows([
            "W W W W . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . . B B",
            ". . . . B B",
        ]);
        let mv = board.winning_move(Player::White).expect("white has a win");
        assert_eq!(mv.row_col(), Some((0, 4)));
        assert_eq!((mv.quad_a(), mv.quad_b()), (2, 3));

        let mut next = board;
        next.apply(mv).unwrap();
        assert_eq!(next.result(), GameResult::WhiteWins);
        assert!(board.winning_move(Player::Black).is_none());
    }

    #[test]
    fn test_winning_move_through_swapped_quadrant() {
        // Only swaps that move a quadrant onto the line complete it
        let board = board_from_rows([
            "W W W . . .",
            ". . . . . .",
            ". . . . . .",
            ". . . W . .",
            "B B . . . .",
            "B B . . . .",
        ]);
        let mv = board.winning_move(Player::White).expect("white has a win");
        assert_eq!(mv.row_col(), Some((3, 4)));
        let mut next = board;
        next.apply(mv).unwrap();
        assert_eq!(next.result(), GameResult::WhiteWins);

        // Bringing the bottom-right quadrant up also wins
        let mut via_top = board;
        via_top.apply(Move::at(Player::White, 3, 4, 1, 3)).unwrap();
        assert_eq!(via_top.result(), GameResult::WhiteWins);
        assert_eq!(via_top.cell(0, 3), Some(Player::White));
        assert_eq!(via_top.cell(0, 4), Some(Player::White));
    }

    #[test]
    fn test_winning_move_iff_some_move_wins() {
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        let mut checked = 0;
        while checked < 200 {
            let plies = rng.gen_range(6..30);
            let board = random_position(&mut rng, plies);
            if board.is_game_over() {
                continue;
            }
            checked += 1;
            let player = board.turn_player();
            let brute = board.all_legal_moves().into_iter().any(|mv| {
                let mut next = board;
                next.play(mv);
                next.result() == GameResult::win_for(player)
            });
            let found = board.winning_move(player);
            assert_eq!(found.is_some(), brute, "mismatch on\n{board}");
            if let Some(mv) = found {
                let mut next = board;
                next.apply(mv).unwrap();
                assert_eq!(next.result(), GameResult::win_for(player));
                assert!(board.threat_count(player) >= 1);
            } else {
                assert_eq!(board.threat_count(player), 0);
            }
        }
    }

    #[test]
    fn test_double_alignment_is_draw() {
        let board = board_from_rows([
            "W W W W . .",
            ". . . . . W",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
            "B B B . B B",
        ]);
        assert_eq!(board.turn_player(), Player::White);

        // Completes White's top row while the swap lines up Black's bottom row
        let mut next = board;
        next.apply(Move::at(Player::White, 0, 4, 2, 3)).unwrap();
        assert_eq!(next.result(), GameResult::Draw);
        assert!(next.is_game_over());

        // A winning move never settles for the draw
        if let Some(mv) = board.winning_move(Player::White) {
            let mut won = board;
            won.apply(mv).unwrap();
            assert_eq!(won.result(), GameResult::WhiteWins);
        }
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let mut white = 0;
        let mut black = 0;
        for row in 0..6 {
            for col in 0..6 {
                if (col + 2 * row) % 4 < 2 {
                    white |= cell_bit(row, col);
                } else {
                    black |= cell_bit(row, col);
                }
            }
        }
        let board = Bitboard::from_parts(white, black, 36).unwrap();
        assert!(!has_line(white) && !has_line(black));
        assert_eq!(board.result(), GameResult::Draw);
        assert!(board.is_game_over());
        assert!(board.all_legal_moves().is_empty());
        assert!(board.legal_moves_reduced().is_empty());
        assert!(board.winning_move(Player::White).is_none());

        // Last ply always ends the game
        let last = cell_bit(5, 5);
        let almost = Bitboard::from_parts(white & !last, black & !last, 35).unwrap();
        assert!(!almost.is_game_over());
        for mv in almost.all_legal_moves() {
            let mut next = almost;
            next.apply(mv).unwrap();
            assert!(next.is_game_over());
            assert!(next.result().is_decided());
        }
    }

    #[test]
    fn test_from_parts_validation() {
        assert!(matches!(
            Bitboard::from_parts(1, 1, 2),
            Err(BoardError::Overlap { row: 0, col: 0 })
        ));
        assert_eq!(Bitboard::from_parts(0, 0, 40), Err(BoardError::PlyOutOfRange(40)));
        assert_eq!(
            Bitboard::from_parts(0b1, 0, 2),
            Err(BoardError::PieceCountMismatch { pieces: 1, ply: 2 })
        );
        let board = Bitboard::from_parts(0b1, 0b10, 2).unwrap();
        assert_eq!(board.turn_player(), Player::White);
    }

    #[test]
    fn test_deserialize_validates() {
        let board = double_threat_board();
        let json = serde_json::to_string(&board).unwrap();
        let back: Bitboard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);

        // Both players claim (0,0)..(0,4)
        let overlap = r#"{"pieces":[31,31],"turn_number":0,"result":"Ongoing"}"#;
        assert!(serde_json::from_str::<Bitboard>(overlap).is_err());

        let miscounted = r#"{"pieces":[1,2],"turn_number":5}"#;
        assert!(serde_json::from_str::<Bitboard>(miscounted).is_err());

        // White's row 0 line is found even though the input claims otherwise
        let stale = r#"{"pieces":[31,992],"turn_number":10,"result":"Ongoing"}"#;
        let board: Bitboard = serde_json::from_str(stale).unwrap();
        assert_eq!(board.result(), GameResult::WhiteWins);
        assert_eq!(board.turn_player(), Player::White);
        assert!(board.is_game_over());
        let late = Move::at(Player::White, 5, 5, 0, 1);
        assert_eq!(board.check_legal(late), Err(MoveError::GameOver));
    }

    #[test]
    fn test_critical_state_double_threat() {
        let board = double_threat_board();
        assert_eq!(board.turn_player(), Player::White);
        assert!(board.winning_move(Player::White).is_none());
        assert!(board.winning_move(Player::Black).is_some());
        assert!(board.is_critical_state());
        assert!(board.is_two_move_critical_state());

        // Every white reply leaves black a winning move
        for reply in board.all_legal_moves() {
            let mut next = board;
            next.play(reply);
            assert!(next.winning_move(Player::Black).is_some(), "{reply} escapes");
        }
    }

    #[test]
    fn test_no_critical_state_early() {
        let board = board_from_rows([
            "W . . . . .",
            ". . . . . .",
            ". . . . B .",
            ". . . . . .",
            ". . . . . .",
            ". . . . . .",
        ]);
        assert!(!board.is_critical_state());
        assert!(!board.has_developing_line(Player::Black));
        assert!(!board.is_two_move_critical_state());
        assert!(double_threat_board().has_developing_line(Player::Black));
    }

    #[test]
    fn test_random_move_is_legal() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let board = random_position(&mut rng, 6);
        for _ in 0..100 {
            let mv = board.random_move(&mut rng).unwrap();
            assert_eq!(board.check_legal(mv), Ok(()));
        }
    }

    #[test]
    fn test_display() {
        let text = double_threat_board().to_string();
        assert!(text.starts_with(". B B |. B B"));
        assert!(text.contains("White to move"));
    }
}
