//! Decision agent: threat filter first, search policy second
//!
//! Level 2 - Phase-level implementation

use crate::config::{AgentConfig, PolicyKind};
use crate::error::AgentError;
use crate::policy::{select_policy, AlphaBetaPolicy, DecisionPolicy, MctsPolicy};
use pentago_core::{Bitboard, ExternalBoard, Move, Placement, ThreatFilter, Verdict};
use pentago_mcts::MoveStatistics;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything known about one decision
#[derive(Clone, Debug, Serialize)]
pub struct Decision {
    pub mv: Option<Move>,
    pub verdict: Verdict,
    /// Moves left after threat filtering
    pub candidates: usize,
    /// Policy that searched, None when the filter alone decided
    pub policy: Option<&'static str>,
    pub simulations: u32,
    pub move_stats: Vec<MoveStatistics>,
    pub elapsed_ms: u64,
}

/// Move-choosing agent
pub struct Agent {
    config: AgentConfig,
    mcts: MctsPolicy,
    alpha_beta: AlphaBetaPolicy,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        let mcts = MctsPolicy::new(&config);
        let alpha_beta = AlphaBetaPolicy::new(&config);
        Self {
            config,
            mcts,
            alpha_beta,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Choose a move for the side to move within `budget`
    pub fn choose_move(&mut self, board: &Bitboard, budget: Duration) -> Option<Move> {
        self.decide(board, budget).mv
    }

    /// Choose a move for an external board and decode it
    pub fn choose_placement<B: ExternalBoard + ?Sized>(
        &mut self,
        external: &B,
        budget: Duration,
    ) -> Result<Placement, AgentError> {
        let board = Bitboard::from_external(external)?;
        let mv = self.choose_move(&board, budget).ok_or(AgentError::NoLegalMoves)?;
        Ok(mv.to_placement()?)
    }

    /// Run the full decision pipeline and keep its statistics
    pub fn decide(&mut self, board: &Bitboard, budget: Duration) -> Decision {
        let start = Instant::now();
        let budget = self.config.search_budget(budget);
        let deadline = start + budget;

        let filter = ThreatFilter::new(self.config.filter.clone())
            .with_deadline(start + budget.mul_f64(self.config.filter.deadline_fraction));
        let screening = filter.screen(board);
        debug!(
            verdict = ?screening.verdict,
            candidates = screening.moves.len(),
            "threat filter"
        );

        let mut decision = Decision {
            mv: None,
            verdict: screening.verdict,
            candidates: screening.moves.len(),
            policy: None,
            simulations: 0,
            move_stats: Vec::new(),
            elapsed_ms: 0,
        };

        match screening.moves.as_slice() {
            [] => {
                debug_assert!(board.is_game_over(), "no candidates on a live board");
            }
            [only] => decision.mv = Some(*only),
            candidates => {
                let mut kind = select_policy(board, &self.config);
                let mut chosen = self.policy_mut(kind).decide(board, candidates, deadline);

                if chosen.is_none()
                    && self.config.policy == PolicyKind::Hybrid
                    && kind == PolicyKind::AlphaBeta
                {
                    kind = PolicyKind::Mcts;
                    chosen = self.mcts.decide(board, candidates, deadline);
                }

                let policy = self.policy_mut(kind);
                decision.policy = Some(policy.name());
                if let Some(report) = policy.last_report() {
                    decision.simulations = report.simulations;
                    decision.move_stats = report.move_stats.clone();
                }

                if chosen.is_none() {
                    warn!(
                        candidates = candidates.len(),
                        "no search result, playing first candidate"
                    );
                }
                decision.mv = chosen.or_else(|| candidates.first().copied());
            }
        }

        decision.elapsed_ms = start.elapsed().as_millis() as u64;
        if let Some(mv) = decision.mv {
            info!(
                %mv,
                verdict = ?decision.verdict,
                policy = decision.policy.unwrap_or("filter"),
                simulations = decision.simulations,
                elapsed_ms = decision.elapsed_ms,
                "move chosen"
            );
        }
        decision
    }

    fn policy_mut(&mut self, kind: PolicyKind) -> &mut dyn DecisionPolicy {
        match kind {
            PolicyKind::AlphaBeta => &mut self.alpha_beta,
            PolicyKind::Mcts | PolicyKind::Hybrid => &mut self.mcts,
        }
    }
}
