//! Decision policies run over the filtered candidate moves
//!
//! Level 3 - Step-level implementation

use crate::config::{AgentConfig, PolicyKind};
use pentago_core::{AlphaBetaAI, Bitboard, Heuristics, Move};
use pentago_mcts::{MctsPlayer, MoveStatistics};
use std::time::Instant;

/// Picks one of several candidate moves before a deadline
pub trait DecisionPolicy {
    fn name(&self) -> &'static str;

    /// Choose among `candidates`; None when nothing could be decided in time
    fn decide(&mut self, board: &Bitboard, candidates: &[Move], deadline: Instant) -> Option<Move>;

    /// Statistics of the most recent decision, if the policy keeps any
    fn last_report(&self) -> Option<&SearchReport> {
        None
    }
}

/// Search statistics kept by a policy
#[derive(Clone, Debug, Default)]
pub struct SearchReport {
    pub simulations: u32,
    pub move_stats: Vec<MoveStatistics>,
}

// ============================================================================
// MCTS
// ============================================================================

pub struct MctsPolicy {
    player: MctsPlayer,
    report: Option<SearchReport>,
}

impl MctsPolicy {
    pub fn new(config: &AgentConfig) -> Self {
        let mcts = config.mcts.clone().with_seed(config.seed);
        Self {
            player: MctsPlayer::new(mcts),
            report: None,
        }
    }
}

impl DecisionPolicy for MctsPolicy {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn decide(&mut self, board: &Bitboard, candidates: &[Move], deadline: Instant) -> Option<Move> {
        if candidates.len() < 2 {
            self.report = None;
            return candidates.first().copied();
        }
        let result = self.player.search(board, candidates, deadline);
        let best = result.best_move();
        self.report = Some(SearchReport {
            simulations: result.total_simulations,
            move_stats: result.move_stats,
        });
        best
    }

    fn last_report(&self) -> Option<&SearchReport> {
        self.report.as_ref()
    }
}

// ============================================================================
// ALPHA-BETA
// ============================================================================

pub struct AlphaBetaPolicy {
    ai: AlphaBetaAI,
}

impl AlphaBetaPolicy {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            ai: AlphaBetaAI::with_seed(config.alpha_beta_depth, Heuristics::default(), config.seed),
        }
    }
}

impl DecisionPolicy for AlphaBetaPolicy {
    fn name(&self) -> &'static str {
        "alpha-beta"
    }

    fn decide(&mut self, board: &Bitboard, candidates: &[Move], deadline: Instant) -> Option<Move> {
        self.ai.best_move_among(board, candidates, Some(deadline))
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Concrete policy for this position (never `Hybrid`)
pub fn select_policy(board: &Bitboard, config: &AgentConfig) -> PolicyKind {
    match config.policy {
        PolicyKind::Hybrid if board.turn_number() > config.minimax_after_ply => {
            PolicyKind::AlphaBeta
        }
        PolicyKind::Hybrid => PolicyKind::Mcts,
        kind => kind,
    }
}
