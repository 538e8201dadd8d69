//! CPU-based Alpha-Beta AI

use crate::eval::{evaluate, evaluate_with_depth, Heuristics, WIN_VALUE};
use crate::game::{Bitboard, MoveStack};
use crate::moves::Move;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::debug;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Noise scale for evaluation variety
const NOISE_SCALE: f32 = 0.1;

/// Nodes between deadline checks
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Default number of moves searched per node after ordering
const DEFAULT_MAX_MOVES: usize = 24;

// ============================================================================
// ALPHA-BETA AI
// ============================================================================

/// Alpha-Beta AI player
pub struct AlphaBetaAI {
    pub depth: u32,
    pub max_moves_per_node: usize,
    pub heuristics: Heuristics,
    rng: ChaCha8Rng,
}

impl AlphaBetaAI {
    pub fn new(depth: u32, heuristics: Heuristics) -> Self {
        Self::with_seed(depth, heuristics, 42)
    }

    pub fn with_seed(depth: u32, heuristics: Heuristics, seed: u64) -> Self {
        Self {
            depth: depth.max(1),
            max_moves_per_node: DEFAULT_MAX_MOVES,
            heuristics,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Get best move for current position
    pub fn best_move(&mut self, board: &Bitboard) -> Option<Move> {
        self.best_move_until(board, None)
    }

    /// Iterative deepening up to `depth`, keeping the last completed iteration
    /// when `deadline` passes. Returns `None` if no iteration completed.
    pub fn best_move_until(&mut self, board: &Bitboard, deadline: Option<Instant>) -> Option<Move> {
        let moves = board.legal_moves_reduced();
        if moves.is_empty() {
            return None;
        }
        if let Some(win) = board.winning_move(board.turn_player()) {
            return Some(win);
        }
        self.best_move_among(board, &moves, deadline)
    }

    /// Iterative deepening restricted to `candidates` at the root
    pub fn best_move_among(
        &mut self,
        board: &Bitboard,
        candidates: &[Move],
        deadline: Option<Instant>,
    ) -> Option<Move> {
        match candidates {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }

        let mut search = Search {
            heuristics: &self.heuristics,
            max_moves: self.max_moves_per_node,
            rng: &mut self.rng,
            deadline,
            nodes: 0,
            aborted: false,
        };

        let mut best = None;
        for depth in 1..=self.depth as i32 {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                break;
            }
            match search.root(board, candidates, depth) {
                Some((mv, score)) => {
                    debug!(depth, %mv, score, nodes = search.nodes, "alpha-beta iteration");
                    best = Some(mv);
                    if score >= WIN_VALUE {
                        break;
                    }
                }
                None => break,
            }
        }
        best
    }

    /// Play a complete game against itself
    pub fn play_game(&mut self, initial: Bitboard) -> (Bitboard, Vec<Move>) {
        let mut board = initial;
        let mut history = Vec::new();

        while !board.is_game_over() {
            match self.best_move(&board) {
                Some(mv) => {
                    board.play(mv);
                    history.push(mv);
                }
                None => break,
            }
        }

        (board, history)
    }

    /// Evaluate a position for the side to move
    pub fn evaluate(&self, board: &Bitboard) -> f32 {
        evaluate(board, board.turn_player(), &self.heuristics)
    }
}

// ============================================================================
// NEGAMAX WITH ALPHA-BETA
// ============================================================================

struct Search<'a> {
    heuristics: &'a Heuristics,
    max_moves: usize,
    rng: &'a mut ChaCha8Rng,
    deadline: Option<Instant>,
    nodes: u64,
    aborted: bool,
}

impl Search<'_> {
    fn out_of_time(&mut self) -> bool {
        if !self.aborted && self.nodes % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                self.aborted = Instant::now() >= deadline;
            }
        }
        self.aborted
    }

    /// Moves ordered by threats created minus threats left to the opponent,
    /// optionally truncated
    fn ordered_moves(&self, board: &Bitboard, moves: &[Move], limit: Option<usize>) -> Vec<Move> {
        let mover = board.turn_player();
        let mut scratch = *board;
        let mut stack = MoveStack::new(&mut scratch);
        let mut scored: Vec<(Move, i16)> = moves
            .iter()
            .map(|&mv| {
                stack.push(mv);
                let after = stack.board();
                let score = after.threat_count(mover) as i16
                    - after.threat_count(mover.opponent()) as i16;
                stack.pop();
                (mv, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            scored.truncate(limit);
        }
        scored.into_iter().map(|(mv, _)| mv).collect()
    }

    fn root(&mut self, board: &Bitboard, candidates: &[Move], depth: i32) -> Option<(Move, f32)> {
        let moves = self.ordered_moves(board, candidates, None);
        let mut best: Option<(Move, f32)> = None;
        let mut alpha = f32::NEG_INFINITY;
        let mut scratch = *board;

        for mv in moves {
            scratch.play(mv);
            let score = -self.negamax(&mut scratch, depth - 1, f32::NEG_INFINITY, -alpha);
            scratch.undo(mv);
            if self.aborted {
                return None;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }
        best
    }

    fn negamax(&mut self, board: &mut Bitboard, depth: i32, mut alpha: f32, beta: f32) -> f32 {
        self.nodes += 1;
        if self.out_of_time() {
            return 0.0;
        }

        let player = board.turn_player();

        // Terminal check with depth bonus
        if board.is_game_over() {
            return evaluate_with_depth(board, player, self.heuristics, depth);
        }

        if board.winning_move(player).is_some() {
            return WIN_VALUE + depth as f32;
        }

        // Depth limit
        if depth <= 0 {
            let base = evaluate(board, player, self.heuristics);
            let noise = (self.rng.gen::<f32>() - 0.5) * NOISE_SCALE;
            return base + noise;
        }

        let moves = self.ordered_moves(board, &board.legal_moves_reduced(), Some(self.max_moves));
        let mut best = f32::NEG_INFINITY;
        for mv in moves {
            board.play(mv);
            let score = -self.negamax(board, depth - 1, -beta, -alpha);
            board.undo(mv);
            if self.aborted {
                return 0.0;
            }

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

// ============================================================================
// TESTS
// ============================================================================
