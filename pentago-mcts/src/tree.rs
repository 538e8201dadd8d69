//! MCTS Tree structure and node management
//!
//! Uses arena allocation for efficient tree operations. Nodes store only the
//! move that reached them; positions are rebuilt by replaying moves from the
//! root board.
//!
//! ## Architecture
//! - Level 2: Tree operations (select_leaf, expand, backpropagate)
//! - Level 3: UCT calculation, node accessors
//! - Level 4: Statistics, utilities

use pentago_core::{Bitboard, GameResult, Move, Player};
use std::ops::Range;

// ============================================================================
// TYPES
// ============================================================================

/// Node identifier (index into arena)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Statistics for a tree node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Two per simulation through this node
    pub num_sims: u32,
    /// Two per win and one per draw for the player who made the node's move
    pub win_score: u32,
}

impl NodeStats {
    /// Win rate from the perspective of the player who moved into this node
    pub fn win_rate(&self) -> f64 {
        if self.num_sims == 0 {
            0.0
        } else {
            self.win_score as f64 / self.num_sims as f64
        }
    }
}

/// A node in the MCTS tree
#[derive(Clone, Debug)]
pub struct MctsNode {
    /// Move that led to this node (None for root)
    pub mv: Option<Move>,
    /// Parent node (None for root)
    pub parent: Option<NodeId>,
    /// Children occupy `first_child .. first_child + child_count` in the arena
    first_child: u32,
    child_count: u16,
    /// Simulation statistics
    pub stats: NodeStats,
}

impl MctsNode {
    fn new(mv: Option<Move>, parent: Option<NodeId>) -> Self {
        Self {
            mv,
            parent,
            first_child: 0,
            child_count: 0,
            stats: NodeStats::default(),
        }
    }

    /// Player whose move this node represents (None for root)
    pub fn player(&self) -> Option<Player> {
        self.mv.map(Move::player)
    }

    pub fn is_expanded(&self) -> bool {
        self.child_count > 0
    }

    pub fn num_children(&self) -> usize {
        self.child_count as usize
    }

    /// Ids of this node's children
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        let start = self.first_child;
        (start..start + self.child_count as u32).map(NodeId)
    }
}

// ============================================================================
// MCTS TREE (Level 2 - Tree Operations)
// ============================================================================

/// MCTS search tree with arena allocation
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storage for nodes
    nodes: Vec<MctsNode>,
    /// Position at the root
    root_board: Bitboard,
}

impl MctsTree {
    /// Create a tree whose root is already expanded with `root_moves`
    pub fn new(root_board: Bitboard, root_moves: &[Move]) -> Self {
        let mut tree = Self {
            nodes: vec![MctsNode::new(None, None)],
            root_board,
        };
        tree.expand(NodeId::ROOT, root_moves);
        tree
    }

    /// Get the root node id
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn root_board(&self) -> &Bitboard {
        &self.root_board
    }

    /// Get a reference to a node
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.index()]
    }

    /// Get the number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the tree empty?
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Level 2: Tree Operations
    // ========================================================================

    /// Descend from the root by UCT until reaching a node without children
    pub fn select_leaf(&self, exploration: f64) -> NodeId {
        let mut current = self.root();
        while let Some(child) = self.select_best_child(current, exploration) {
            current = child;
        }
        current
    }

    /// Rebuild the position at a node by replaying moves from the root
    pub fn replay(&self, node_id: NodeId) -> Bitboard {
        let mut path = Vec::new();
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.get(id);
            if let Some(mv) = node.mv {
                path.push(mv);
            }
            current = node.parent;
        }

        let mut board = self.root_board;
        for mv in path.into_iter().rev() {
            board.play(mv);
        }
        board
    }

    /// Attach one child per move to an unexpanded node.
    ///
    /// Returns the ids of the new children.
    pub fn expand(&mut self, node_id: NodeId, moves: &[Move]) -> Range<u32> {
        debug_assert!(!self.get(node_id).is_expanded(), "node expanded twice");
        let count = moves.len().min(u16::MAX as usize);
        let first = self.nodes.len() as u32;

        self.nodes
            .extend(moves[..count].iter().map(|&mv| MctsNode::new(Some(mv), Some(node_id))));

        let node = self.get_mut(node_id);
        node.first_child = first;
        node.child_count = count as u16;
        first..first + count as u32
    }

    // ========================================================================
    // Level 3: Selection Helpers
    // ========================================================================

    /// Select best child using UCT; None for a node without children
    fn select_best_child(&self, node_id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(node_id);
        let parent_sims = node.stats.num_sims;

        node.children().max_by(|&a, &b| {
            let uct_a = self.uct(a, parent_sims, exploration);
            let uct_b = self.uct(b, parent_sims, exploration);
            uct_a.partial_cmp(&uct_b).unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// UCT = win_score/num_sims + C * sqrt(ln(parent_sims) / num_sims)
    pub fn uct(&self, node_id: NodeId, parent_sims: u32, exploration: f64) -> f64 {
        let stats = self.get(node_id).stats;
        if stats.num_sims == 0 {
            return f64::INFINITY;
        }
        let exploration_term =
            exploration * ((parent_sims.max(1) as f64).ln() / stats.num_sims as f64).sqrt();
        stats.win_rate() + exploration_term
    }

    // ========================================================================
    // Level 2: Backpropagation
    // ========================================================================

    /// Propagate a simulation result from a node to the root
    pub fn backpropagate(&mut self, leaf_id: NodeId, result: GameResult) {
        let winner = result.winner();
        let mut current = Some(leaf_id);

        while let Some(node_id) = current {
            let node = self.get_mut(node_id);
            node.stats.num_sims += 2;
            match (node.player(), result) {
                (Some(_), GameResult::Draw) => node.stats.win_score += 1,
                (Some(player), _) if winner == Some(player) => node.stats.win_score += 2,
                _ => {}
            }
            current = node.parent;
        }
    }

    // ========================================================================
    // Level 3: Best Move Selection
    // ========================================================================

    /// Root child with the highest win rate among visited children
    pub fn best_move(&self) -> Option<Move> {
        self.get(self.root())
            .children()
            .map(|id| self.get(id))
            .filter(|node| node.stats.num_sims > 0)
            .max_by(|a, b| {
                a.stats
                    .win_rate()
                    .partial_cmp(&b.stats.win_rate())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .and_then(|node| node.mv)
    }

    /// Get all root moves with their simulation counts and win rates
    pub fn move_statistics(&self) -> Vec<(Move, u32, f64)> {
        self.get(self.root())
            .children()
            .filter_map(|id| {
                let node = self.get(id);
                node.mv.map(|mv| (mv, node.stats.num_sims, node.stats.win_rate()))
            })
            .collect()
    }

    /// Get total simulations run (root sims)
    pub fn total_simulations(&self) -> u32 {
        self.get(self.root()).stats.num_sims
    }

    /// Iterate over every node id
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_tree() -> MctsTree {
        let board = Bitboard::new();
        let moves = board.legal_moves_reduced();
        MctsTree::new(board, &moves)
    }

    #[test]
    fn test_tree_creation() {
        let tree = mock_tree();
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.root(), NodeId::ROOT);
        let root = tree.get(NodeId::ROOT);
        assert!(root.parent.is_none());
        assert!(root.mv.is_none());
        assert!(root.player().is_none());
        assert_eq!(root.num_children(), 9);
        for child in root.children() {
            assert_eq!(tree.get(child).parent, Some(NodeId::ROOT));
            assert_eq!(tree.get(child).player(), Some(Player::White));
        }
    }

    #[test]
    fn test_node_stats_win_rate() {
        let mut stats = NodeStats::default();
        assert_eq!(stats.win_rate(), 0.0);

        stats.num_sims = 10;
        stats.win_score = 7;
        assert!((stats.win_rate() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_uct_unexplored() {
        let tree = mock_tree();
        let child = tree.get(NodeId::ROOT).children().next().unwrap();
        assert!(tree.uct(child, 100, std::f64::consts::SQRT_2).is_infinite());
    }

    #[test]
    fn test_select_prefers_unvisited() {
        let mut tree = mock_tree();
        let first = tree.select_leaf(std::f64::consts::SQRT_2);
        assert_ne!(first, NodeId::ROOT);
        tree.backpropagate(first, GameResult::BlackWins);
        let second = tree.select_leaf(std::f64::consts::SQRT_2);
        assert_ne!(second, first);
    }

    #[test]
    fn test_replay_and_expand() {
        let mut tree = mock_tree();
        let child = tree.get(NodeId::ROOT).children().next().unwrap();
        let board = tree.replay(child);
        assert_eq!(board.turn_number(), 1);
        assert_eq!(board.turn_player(), Player::Black);

        let moves = board.legal_moves_reduced();
        let range = tree.expand(child, &moves);
        assert_eq!(range.len(), moves.len());
        let grandchild = NodeId(range.start);
        assert_eq!(tree.get(grandchild).parent, Some(child));
        assert_eq!(tree.replay(grandchild).turn_number(), 2);
    }

    #[test]
    fn test_backpropagation_scoring() {
        let mut tree = mock_tree();
        let child = tree.get(NodeId::ROOT).children().next().unwrap();

        tree.backpropagate(child, GameResult::WhiteWins);
        assert_eq!(tree.get(child).stats, NodeStats { num_sims: 2, win_score: 2 });
        assert_eq!(tree.get(NodeId::ROOT).stats, NodeStats { num_sims: 2, win_score: 0 });

        tree.backpropagate(child, GameResult::Draw);
        tree.backpropagate(child, GameResult::BlackWins);
        assert_eq!(tree.get(child).stats, NodeStats { num_sims: 6, win_score: 3 });
        assert_eq!(tree.total_simulations(), 6);
    }

    #[test]
    fn test_best_move_by_win_rate() {
        let mut tree = mock_tree();
        let children: Vec<NodeId> = tree.get(NodeId::ROOT).children().collect();
        tree.backpropagate(children[0], GameResult::BlackWins);
        tree.backpropagate(children[0], GameResult::WhiteWins);
        tree.backpropagate(children[1], GameResult::WhiteWins);
        assert_eq!(tree.best_move(), tree.get(children[1]).mv);

        let stats = tree.move_statistics();
        assert_eq!(stats.len(), 9);
        assert_eq!(stats[0].1, 4);
    }

    #[test]
    fn test_best_move_without_simulations() {
        assert!(mock_tree().best_move().is_none());
    }
}
