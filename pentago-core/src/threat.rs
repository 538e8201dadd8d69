//! Threat filter: screens candidate moves by how quickly they lose or win
//!
//! Every symmetry-reduced move of the side to move is played out a few plies
//! and classified. Tiers are resolved in strict order:
//!
//! 0. the side to move wins on the spot
//! 1. moves that complete an opponent line are removed
//! 2. moves that leave the opponent a winning move are removed
//! 3. a move reaching a critical state is returned alone
//! 4. a move after which every reply leaves us a win or a critical move is
//!    returned alone
//! 5. moves letting the opponent reach a critical state (one ply, then two)
//!    are removed
//!
//! A removal that would leave nothing falls back to the removed tier itself.

use crate::game::{Bitboard, GameResult, MoveStack, Player};
use crate::moves::Move;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

// ============================================================================
// CONFIG
// ============================================================================

/// Threat filter configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Run the two-ply checks (tier 4 and the second half of tier 5)
    pub two_ply: bool,
    /// Share of the decision budget the two-ply checks may use
    pub deadline_fraction: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            two_ply: true,
            deadline_fraction: 0.4,
        }
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_two_ply(mut self, enabled: bool) -> Self {
        self.two_ply = enabled;
        self
    }

    pub fn with_deadline_fraction(mut self, fraction: f64) -> Self {
        self.deadline_fraction = fraction.clamp(0.0, 1.0);
        self
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Which tier produced a screening
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The side to move wins immediately
    ImmediateWin,
    /// Every move completes an opponent line
    ForcedLoss,
    /// Every remaining move leaves the opponent a winning move
    Cornered,
    /// The move leaves the opponent without a defence
    CriticalWin,
    /// Every reply to the move leaves us a win or a critical move
    TwoPlyCriticalWin,
    /// Every remaining move lets the opponent reach a critical state
    OpponentCritical,
    /// Every remaining move lets the opponent reach a two-move critical state
    OpponentTwoPlyCritical,
    /// Moves that survived every removal
    Safe,
    /// No legal move exists
    NoMoves,
}

impl Verdict {
    /// True when the returned moves are all known to lose
    pub fn is_losing(self) -> bool {
        matches!(
            self,
            Verdict::ForcedLoss
                | Verdict::Cornered
                | Verdict::OpponentCritical
                | Verdict::OpponentTwoPlyCritical
        )
    }

    /// True when the returned move is a known win
    pub fn is_winning(self) -> bool {
        matches!(
            self,
            Verdict::ImmediateWin | Verdict::CriticalWin | Verdict::TwoPlyCriticalWin
        )
    }
}

/// Filtered candidate moves and the tier that produced them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Screening {
    pub moves: Vec<Move>,
    pub verdict: Verdict,
}

impl Screening {
    fn new(moves: Vec<Move>, verdict: Verdict) -> Self {
        Self { moves, verdict }
    }
}

/// Moves collected per tier, in generation order
#[derive(Default)]
struct Tiers {
    hands_win: Vec<Move>,
    allows_win: Vec<Move>,
    critical: Vec<Move>,
    two_ply_critical: Vec<Move>,
    opponent_critical: Vec<Move>,
    opponent_two_ply: Vec<Move>,
    evaluated: Vec<Move>,
}

// ============================================================================
// FILTER
// ============================================================================

/// Bounded-lookahead move screener
#[derive(Clone, Debug)]
pub struct ThreatFilter {
    config: FilterConfig,
    deadline: Option<Instant>,
}

impl ThreatFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            deadline: None,
        }
    }

    /// Stop the two-ply checks once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn two_ply_allowed(&self) -> bool {
        self.config.two_ply && self.deadline.map_or(true, |d| Instant::now() < d)
    }

    /// Screen the moves of the side to move.
    ///
    /// The result is never empty while a legal move exists.
    pub fn screen(&self, board: &Bitboard) -> Screening {
        let me = board.turn_player();
        if let Some(win) = board.winning_move(me) {
            debug!(%win, "immediate win");
            return Screening::new(vec![win], Verdict::ImmediateWin);
        }

        let moves = board.legal_moves_reduced();
        if moves.is_empty() {
            debug_assert!(board.is_game_over(), "no moves on a live board");
            return Screening::new(Vec::new(), Verdict::NoMoves);
        }

        let tiers = self.classify(board, &moves);
        self.resolve(tiers)
    }

    /// Play every candidate and sort it into tiers
    fn classify(&self, board: &Bitboard, moves: &[Move]) -> Tiers {
        let me = board.turn_player();
        let opponent = me.opponent();
        let mut tiers = Tiers::default();
        let mut two_ply_skipped = false;

        let mut scratch = *board;
        let mut stack = MoveStack::new(&mut scratch);

        for &mv in moves {
            stack.push(mv);
            let after = *stack.board();
            let mv = mv.with_priority(after.threat_count(me));
            tiers.evaluated.push(mv);

            match after.result() {
                GameResult::Ongoing => {
                    if after.is_critical_state() {
                        tiers.critical.push(mv);
                    } else if after.winning_move(opponent).is_some() {
                        tiers.allows_win.push(mv);
                    } else {
                        let two_ply = self.two_ply_allowed();
                        if !two_ply && self.config.two_ply && !two_ply_skipped {
                            debug!("filter deadline passed, skipping two-ply checks");
                            two_ply_skipped = true;
                        }
                        self.examine_replies(&mut stack, me, mv, two_ply, &mut tiers);
                    }
                }
                result if result.winner() == Some(opponent) => tiers.hands_win.push(mv),
                // Our own win is caught by winning_move; a draw needs no reply analysis
                _ => {}
            }
            stack.pop();
        }
        tiers
    }

    /// Look at every opponent reply after `mv` (already on the stack)
    fn examine_replies(
        &self,
        stack: &mut MoveStack<'_>,
        me: Player,
        mv: Move,
        two_ply: bool,
        tiers: &mut Tiers,
    ) {
        let opponent = me.opponent();
        let replies = stack.board().legal_moves_reduced();
        let mut forced_win = two_ply;

        for reply in replies {
            stack.push(reply);
            let after = *stack.board();
            stack.pop();

            match after.result() {
                GameResult::Ongoing => {
                    if after.is_critical_state() {
                        tiers.opponent_critical.push(mv);
                        return;
                    }
                    if two_ply && self.two_ply_allowed() {
                        if after.is_two_move_critical_state() {
                            tiers.opponent_two_ply.push(mv);
                            return;
                        }
                        if forced_win && !can_force_critical(&after, me) {
                            forced_win = false;
                        }
                    } else {
                        forced_win = false;
                    }
                }
                result if result.winner() == Some(opponent) => {
                    tiers.allows_win.push(mv);
                    return;
                }
                GameResult::Draw => forced_win = false,
                _ => {}
            }
        }

        if forced_win {
            tiers.two_ply_critical.push(mv);
        }
    }

    /// Apply tier precedence and the empty-set fallbacks
    fn resolve(&self, tiers: Tiers) -> Screening {
        let hands_win: FxHashSet<Move> = tiers.hands_win.iter().copied().collect();
        let survivors: Vec<Move> = tiers
            .evaluated
            .iter()
            .copied()
            .filter(|mv| !hands_win.contains(mv))
            .collect();
        if survivors.is_empty() {
            debug!(
                count = tiers.hands_win.len(),
                "every move completes an opponent line"
            );
            return Screening::new(tiers.hands_win, Verdict::ForcedLoss);
        }

        let allows_win: FxHashSet<Move> = tiers.allows_win.iter().copied().collect();
        let survivors: Vec<Move> = survivors
            .into_iter()
            .filter(|mv| !allows_win.contains(mv))
            .collect();
        if survivors.is_empty() {
            let moves = without(&tiers.allows_win, &hands_win);
            debug!(count = moves.len(), "every move leaves the opponent a win");
            return Screening::new(moves, Verdict::Cornered);
        }

        if let Some(&mv) = best_by_priority(&tiers.critical) {
            debug!(%mv, "critical-state win");
            return Screening::new(vec![mv], Verdict::CriticalWin);
        }
        if let Some(&mv) = best_by_priority(&tiers.two_ply_critical) {
            debug!(%mv, "two-ply critical win");
            return Screening::new(vec![mv], Verdict::TwoPlyCriticalWin);
        }

        let opponent_critical: FxHashSet<Move> =
            tiers.opponent_critical.iter().copied().collect();
        let after_critical: Vec<Move> = survivors
            .iter()
            .copied()
            .filter(|mv| !opponent_critical.contains(mv))
            .collect();
        if after_critical.is_empty() {
            debug!(
                count = survivors.len(),
                "every move lets the opponent reach a critical state"
            );
            return Screening::new(sorted_by_priority(survivors), Verdict::OpponentCritical);
        }

        let opponent_two_ply: FxHashSet<Move> = tiers.opponent_two_ply.iter().copied().collect();
        let safe: Vec<Move> = after_critical
            .iter()
            .copied()
            .filter(|mv| !opponent_two_ply.contains(mv))
            .collect();
        if safe.is_empty() {
            debug!(
                count = after_critical.len(),
                "every move lets the opponent reach a two-move critical state"
            );
            return Screening::new(
                sorted_by_priority(after_critical),
                Verdict::OpponentTwoPlyCritical,
            );
        }

        debug!(
            evaluated = tiers.evaluated.len(),
            safe = safe.len(),
            "filter complete"
        );
        Screening::new(sorted_by_priority(safe), Verdict::Safe)
    }
}

impl Default for ThreatFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

/// With `me` to move: a win now, or a move that leaves a critical state
fn can_force_critical(board: &Bitboard, me: Player) -> bool {
    board.winning_move(me).is_some() || board.has_critical_follow_up()
}

fn without(moves: &[Move], removed: &FxHashSet<Move>) -> Vec<Move> {
    moves.iter().copied().filter(|mv| !removed.contains(mv)).collect()
}

fn best_by_priority(moves: &[Move]) -> Option<&Move> {
    moves.iter().rev().max_by_key(|mv| mv.priority())
}

/// Highest priority first, generation order among equals
fn sorted_by_priority(mut moves: Vec<Move>) -> Vec<Move> {
    moves.sort_by_key(|mv| std::cmp::Reverse(mv.priority()));
    moves
}

// ============================================================================
// TESTS
// ============================================================================
