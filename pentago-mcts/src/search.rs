//! MCTS Search Loop
//!
//! Implements the core MCTS algorithm:
//! 1. Selection - Use UCT to traverse tree
//! 2. Expansion - Add children for every symmetry-reduced move
//! 3. Simulation - Rollout to terminal state
//! 4. Backpropagation - Update statistics
//!
//! ## Architecture
//! - Level 2: Search loop coordination
//! - Level 3: Individual MCTS phases
//! - Level 4: Utilities

use crate::rollout::cpu_rollout;
use crate::tree::{MctsTree, NodeId};
use crate::MctsConfig;
use pentago_core::{Bitboard, Move};
use rand::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

// ============================================================================
// SEARCH RESULT
// ============================================================================

/// Result of MCTS search
#[derive(Debug)]
pub struct SearchResult {
    /// The final tree after search
    pub tree: MctsTree,
    /// Iterations of the search loop
    pub iterations: u32,
    /// Root simulation count (two per iteration)
    pub total_simulations: u32,
    /// Statistics for each root move
    pub move_stats: Vec<MoveStatistics>,
}

/// Statistics for a single move at root
#[derive(Clone, Debug, Serialize)]
pub struct MoveStatistics {
    pub mv: Move,
    pub sims: u32,
    pub win_rate: f64,
    pub ucb1: f64,
}

impl SearchResult {
    /// Root move with the highest win rate, if any simulation ran
    pub fn best_move(&self) -> Option<Move> {
        self.tree.best_move()
    }

    /// Get all moves sorted by simulations
    pub fn moves_by_sims(&self) -> Vec<(Move, u32)> {
        let mut moves: Vec<_> = self.move_stats.iter().map(|s| (s.mv, s.sims)).collect();
        moves.sort_by(|a, b| b.1.cmp(&a.1));
        moves
    }
}

// ============================================================================
// SEARCH LOOP (Level 2 - Main Coordination)
// ============================================================================

/// Run MCTS from `board` over the given root candidates.
///
/// Stops at `deadline` or once the root has `max_simulations` simulations.
pub fn run_search<R: Rng + ?Sized>(
    board: &Bitboard,
    candidates: &[Move],
    config: &MctsConfig,
    deadline: Instant,
    rng: &mut R,
) -> SearchResult {
    let mut tree = MctsTree::new(*board, candidates);
    let mut iterations = 0u32;

    if !candidates.is_empty() {
        while tree.total_simulations() < config.max_simulations && Instant::now() < deadline {
            run_single_iteration(&mut tree, config, rng);
            iterations += 1;
        }
    }

    let total_simulations = tree.total_simulations();
    let move_stats = collect_move_statistics(&tree, config.exploration);

    if iterations == 0 {
        warn!(candidates = candidates.len(), "search budget exhausted before any simulation");
    } else {
        debug!(
            iterations,
            total_simulations,
            nodes = tree.len(),
            "mcts search finished"
        );
    }

    SearchResult {
        tree,
        iterations,
        total_simulations,
        move_stats,
    }
}

// ============================================================================
// SEARCH ITERATION (Level 3 - MCTS Phases)
// ============================================================================

/// Single MCTS iteration
fn run_single_iteration<R: Rng + ?Sized>(tree: &mut MctsTree, config: &MctsConfig, rng: &mut R) {
    // Phase 1: Selection
    let leaf_id = tree.select_leaf(config.exploration);
    let mut board = tree.replay(leaf_id);

    // Phase 2: Expansion (if not terminal and the arena has room)
    let simulation_node = expand_leaf(tree, leaf_id, &mut board, config.max_nodes, rng);

    // Phase 3: Simulation
    let rollout = cpu_rollout(&board, rng);

    // Phase 4: Backpropagation
    tree.backpropagate(simulation_node, rollout.result);
}

/// Expand a leaf and advance `board` into one random new child.
///
/// Returns the node the simulation starts from.
fn expand_leaf<R: Rng + ?Sized>(
    tree: &mut MctsTree,
    leaf_id: NodeId,
    board: &mut Bitboard,
    max_nodes: usize,
    rng: &mut R,
) -> NodeId {
    if board.is_game_over() || tree.len() >= max_nodes {
        return leaf_id;
    }

    let moves = board.legal_moves_reduced();
    if moves.is_empty() {
        return leaf_id;
    }

    let children = tree.expand(leaf_id, &moves);
    let child_id = NodeId(rng.gen_range(children));
    if let Some(mv) = tree.get(child_id).mv {
        board.play(mv);
    }
    child_id
}

// ============================================================================
// STATISTICS COLLECTION (Level 4 - Utilities)
// ============================================================================

/// Collect statistics for root moves
fn collect_move_statistics(tree: &MctsTree, exploration: f64) -> Vec<MoveStatistics> {
    let root = tree.get(tree.root());
    let parent_sims = root.stats.num_sims;

    root.children()
        .filter_map(|child_id| {
            let child = tree.get(child_id);
            child.mv.map(|mv| MoveStatistics {
                mv,
                sims: child.stats.num_sims,
                win_rate: child.stats.win_rate(),
                ucb1: tree.uct(child_id, parent_sims, exploration),
            })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pentago_core::{GameResult, Player};
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    fn config_with_cap(max_simulations: u32) -> MctsConfig {
        MctsConfig::default().with_max_simulations(max_simulations)
    }

    #[test]
    fn test_simulation_cap() {
        let board = Bitboard::new();
        let moves = board.legal_moves_reduced();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = run_search(&board, &moves, &config_with_cap(400), far_deadline(), &mut rng);
        assert_eq!(result.iterations, 200);
        assert_eq!(result.total_simulations, 400);
        assert_eq!(result.move_stats.len(), 9);
        assert!(result.best_move().is_some());

        let ranked = result.moves_by_sims();
        assert_eq!(ranked.iter().map(|&(_, sims)| sims).sum::<u32>(), 400);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_num_sims_conservation() {
        let board = Bitboard::new();
        let moves = board.legal_moves_reduced();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let result = run_search(&board, &moves, &config_with_cap(600), far_deadline(), &mut rng);
        let tree = &result.tree;
        assert_eq!(tree.total_simulations(), 2 * result.iterations);

        for id in tree.node_ids() {
            let node = tree.get(id);
            if !node.is_expanded() {
                continue;
            }
            let child_sims: u32 = node.children().map(|c| tree.get(c).stats.num_sims).sum();
            let own = node.stats.num_sims - child_sims;
            if id == NodeId::ROOT {
                assert_eq!(own, 0);
            } else {
                // A node simulates once from itself before its first expansion
                assert!(own == 0 || own == 2, "node {id:?}: {own}");
            }
        }
    }

    #[test]
    fn test_expired_deadline_runs_nothing() {
        let board = Bitboard::new();
        let moves = board.legal_moves_reduced();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let result = run_search(&board, &moves, &MctsConfig::default(), Instant::now(), &mut rng);
        assert_eq!(result.iterations, 0);
        assert!(result.best_move().is_none());
        assert!(result.move_stats.iter().all(|s| s.ucb1.is_infinite()));
    }

    #[test]
    fn test_node_cap_stops_expansion() {
        let board = Bitboard::new();
        let moves = board.legal_moves_reduced();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = config_with_cap(200).with_max_nodes(10);

        let result = run_search(&board, &moves, &config, far_deadline(), &mut rng);
        assert_eq!(result.tree.len(), 10);
        assert_eq!(result.total_simulations, 200);
    }

    #[test]
    fn test_finds_winning_reply() {
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
        ] {
            board.apply(Move::at(player, row, col, 2, 3)).unwrap();
        }
        let moves = board.legal_moves_reduced();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let result = run_search(&board, &moves, &config_with_cap(4_000), far_deadline(), &mut rng);

        let wins_now = |mv: Move| {
            let mut next = board;
            next.play(mv);
            next.result() == GameResult::WhiteWins
        };
        let winning: Vec<&MoveStatistics> =
            result.move_stats.iter().filter(|s| wins_now(s.mv)).collect();
        assert!(!winning.is_empty());
        for stats in winning {
            assert!(stats.sims > 0);
            assert_eq!(stats.win_rate, 1.0);
        }

        let best = result.best_move().unwrap();
        let best_stats = result.move_stats.iter().find(|s| s.mv == best).unwrap();
        assert_eq!(best_stats.win_rate, 1.0);
    }
}
