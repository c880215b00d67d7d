//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! Each search cycle:
//! - descends from the root by UCT to a leaf
//! - expands the leaf into a bounded number of distinct random actions
//! - plays one child out with the random policy
//! - propagates the result back to the root
//!
//! Outcomes are always scored for the side to move at the root. Nodes live in
//! an arena owned by [`SearchTree`]; a node refers to its parent and children
//! by [`NodeId`], so the tree has no ownership cycles.
//!
//! An undetermined playout (the side to move had no action) is backed up as
//! a win, whichever side was stuck. This is a known asymmetry: a dead end for
//! the root player scores the same as a dead end for the opponent.

use fastrand::Rng;
use log::{debug, trace, warn};

use crate::action::Action;
use crate::board::Board;
use crate::constants::UCT_EPSILON;
use crate::playout::{choose_random_action, playout, Outcome};
use crate::rules::Phase;

/// Index of a node in its [`SearchTree`].
pub type NodeId = usize;

/// Id of the root node of every tree.
pub const ROOT: NodeId = 0;

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// Position at this node
    pub board: Board,
    /// Action that led here from the parent (`None` for the root)
    pub action: Option<Action>,
    /// Parent node (`None` for the root)
    pub parent: Option<NodeId>,
    /// Child nodes, in creation order
    pub children: Vec<NodeId>,
    /// Number of playouts through this node
    pub visits: u32,
    /// Playouts through this node won for the root player
    pub wins: u32,
}

impl TreeNode {
    fn new(board: Board, action: Option<Action>, parent: Option<NodeId>) -> Self {
        Self {
            board,
            action,
            parent,
            children: Vec::new(),
            visits: 0,
            wins: 0,
        }
    }

    /// Fraction of playouts won through this node, or `None` if unvisited.
    #[inline]
    pub fn winrate(&self) -> Option<f64> {
        (self.visits > 0).then(|| self.wins as f64 / self.visits as f64)
    }

    /// Record one playout result.
    fn update(&mut self, reward: u32) {
        self.visits += 1;
        self.wins += reward;
    }
}

/// Value backed up for a playout outcome. Undetermined counts as a win.
#[inline]
pub fn reward(outcome: Outcome) -> u32 {
    match outcome {
        Outcome::Win | Outcome::Undetermined => 1,
        Outcome::Loss => 0,
    }
}

/// A search tree rooted at one position, with its own random source.
pub struct SearchTree {
    nodes: Vec<TreeNode>,
    rng: Rng,
}

impl SearchTree {
    /// Create a tree seeded from the system entropy source.
    pub fn new(board: &Board) -> Self {
        Self::with_rng(board, Rng::new())
    }

    /// Create a tree whose searches are reproducible for a given seed.
    pub fn with_seed(board: &Board, seed: u64) -> Self {
        Self::with_rng(board, Rng::with_seed(seed))
    }

    pub fn with_rng(board: &Board, rng: Rng) -> Self {
        Self {
            nodes: vec![TreeNode::new(board.clone(), None, None)],
            rng,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Win rate at the root, or `None` before any playout.
    pub fn winrate(&self) -> Option<f64> {
        self.root().winrate()
    }

    /// UCT score of `child` under `parent_visits`.
    ///
    /// A tiny random jitter breaks ties between otherwise equal children.
    fn uct(&mut self, child: NodeId, parent_visits: u32) -> f64 {
        let node = &self.nodes[child];
        let visits = node.visits as f64 + UCT_EPSILON;
        let exploit = node.wins as f64 / visits;
        let explore = ((parent_visits as f64 + 1.0).ln() / visits).sqrt();
        exploit + explore + self.rng.f64() * UCT_EPSILON
    }

    /// Select the child of `id` with the highest UCT score. Earlier children
    /// win exact ties.
    fn most_urgent(&mut self, id: NodeId) -> Option<NodeId> {
        let parent_visits = self.nodes[id].visits;
        let mut best = None;
        let mut best_value = f64::NEG_INFINITY;
        for i in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[i];
            let value = self.uct(child, parent_visits);
            if value > best_value {
                best = Some(child);
                best_value = value;
            }
        }
        best
    }

    /// Descend from the root to a leaf (a node without children).
    fn tree_descend(&mut self) -> NodeId {
        let mut id = ROOT;
        while let Some(child) = self.most_urgent(id) {
            id = child;
        }
        id
    }

    /// Expand a leaf into up to `breadth` children with distinct random
    /// actions, and return one of its children to play out.
    ///
    /// Returns `None` for a terminal position or one with no legal action.
    /// If drawing a fresh action keeps producing duplicates (more than
    /// `2 * breadth` retries), expansion stops early and an existing child is
    /// returned.
    fn expand(&mut self, id: NodeId, breadth: usize) -> Option<NodeId> {
        if self.nodes[id].board.is_terminal() {
            return None;
        }
        let board = self.nodes[id].board.clone();
        let mut actions: Vec<Action> = Vec::with_capacity(breadth);
        let mut action = choose_random_action(&board, &mut self.rng)?;

        'outer: for _ in 0..breadth {
            let mut retries = 0;
            while actions.contains(&action) {
                action = choose_random_action(&board, &mut self.rng)?;
                retries += 1;
                if retries > breadth * 2 {
                    trace!(
                        "expansion of node {id} stopped early after {} children",
                        actions.len()
                    );
                    break 'outer;
                }
            }
            let mut next = board.clone();
            if !next.apply(&action) {
                warn!("random action {action} failed to apply during expansion");
                break;
            }
            actions.push(action);
            let child = self.nodes.len();
            self.nodes.push(TreeNode::new(next, Some(action), Some(id)));
            self.nodes[id].children.push(child);
        }

        let children = &self.nodes[id].children;
        if children.is_empty() {
            return None;
        }
        Some(children[self.rng.usize(..children.len())])
    }

    /// Back up one playout result from `id` to the root.
    fn tree_update(&mut self, id: NodeId, outcome: Outcome) {
        let value = reward(outcome);
        let mut current = Some(id);
        while let Some(n) = current {
            let node = &mut self.nodes[n];
            node.update(value);
            current = node.parent;
        }
    }

    /// Run `iterations` search cycles and return the best root action.
    ///
    /// The root and any previously visited leaf are expanded by `breadth`
    /// actions; a leaf that has never been visited is played out directly.
    /// Returns `None` if the root position is already decided or the side to
    /// move has no legal action.
    pub fn search(&mut self, iterations: usize, breadth: usize) -> Option<Action> {
        let target = target_phase(&self.root().board)?;

        for _ in 0..iterations {
            let leaf = self.tree_descend();
            let child = if leaf == ROOT || self.nodes[leaf].visits > 0 {
                self.expand(leaf, breadth)
            } else {
                Some(leaf)
            };
            match child {
                Some(c) => {
                    let outcome = playout(&self.nodes[c].board, target, &mut self.rng);
                    self.tree_update(c, outcome);
                }
                None => self.tree_update(leaf, Outcome::Undetermined),
            }
        }

        let best = self.best_move();
        debug!(
            "search: {} iterations, {} nodes, root {}/{}, best {}",
            iterations,
            self.nodes.len(),
            self.root().wins,
            self.root().visits,
            best.map(|a| a.to_string()).unwrap_or_else(|| "none".to_string())
        );
        best
    }

    /// The root child with the highest win rate. Unvisited children are
    /// skipped and the earliest child wins ties.
    pub fn best_move(&self) -> Option<Action> {
        let mut best: Option<(f64, NodeId)> = None;
        for &c in &self.root().children {
            if let Some(rate) = self.nodes[c].winrate() {
                if best.is_none_or(|(r, _)| rate > r) {
                    best = Some((rate, c));
                }
            }
        }
        best.and_then(|(_, c)| self.nodes[c].action)
    }

    /// Print statistics for the root's children to stderr.
    pub fn dump_children(&self) {
        for &c in &self.root().children {
            let child = &self.nodes[c];
            eprintln!(
                "action {} v={} w={} wr={:.3}",
                child.action.map(|a| a.to_string()).unwrap_or_default(),
                child.visits,
                child.wins,
                child.winrate().unwrap_or(0.0)
            );
        }
    }

    /// Render the whole tree, one node per line, indented by depth.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        self.print_subtree(ROOT, 0, &mut out);
        out
    }

    fn print_subtree(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id];
        if depth > 0 {
            out.push_str(&"| ".repeat(depth - 1));
            out.push_str("+-");
        }
        let action = node
            .action
            .map(|a| a.to_string())
            .unwrap_or_else(|| "none".to_string());
        out.push_str(&format!(
            "won/total: {}/{}, action: {}, phase: {}\n",
            node.wins,
            node.visits,
            action,
            node.board.phase()
        ));
        for &c in &node.children {
            self.print_subtree(c, depth + 1, out);
        }
    }
}

/// Search `board` with a fresh tree and return the best action.
pub fn tree_search(board: &Board, iterations: usize, breadth: usize, rng: Rng) -> Option<Action> {
    SearchTree::with_rng(board, rng).search(iterations, breadth)
}

/// The phase the root player is playing for, if the game is still running.
pub fn target_phase(board: &Board) -> Option<Phase> {
    board.phase().won_phase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Color;

    #[test]
    fn test_reward_is_optimistic() {
        assert_eq!(reward(Outcome::Win), 1);
        assert_eq!(reward(Outcome::Undetermined), 1);
        assert_eq!(reward(Outcome::Loss), 0);
    }

    #[test]
    fn test_first_iteration_expands_root() {
        let mut tree = SearchTree::with_seed(&Board::new(), 1);
        tree.search(1, 4);
        let root = tree.root();
        assert_eq!(root.visits, 1);
        assert!(!root.children.is_empty());
        assert!(root.children.len() <= 4);
        let visited: u32 = root.children.iter().map(|&c| tree.node(c).visits).sum();
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_children_are_distinct_and_linked() {
        let mut tree = SearchTree::with_seed(&Board::new(), 2);
        tree.search(30, 5);
        for id in 0..tree.len() {
            let node = tree.node(id);
            let mut actions: Vec<_> = node
                .children
                .iter()
                .map(|&c| tree.node(c).action.unwrap())
                .collect();
            let n = actions.len();
            actions.sort_by_key(|a| a.to_string());
            actions.dedup();
            assert_eq!(actions.len(), n, "duplicate child action under {id}");
            for &c in &node.children {
                assert_eq!(tree.node(c).parent, Some(id));
            }
        }
    }

    #[test]
    fn test_visits_accumulate() {
        let mut tree = SearchTree::with_seed(&Board::new(), 3);
        tree.search(40, 5);
        let root = tree.root();
        assert_eq!(root.visits, 40);
        assert!(root.wins <= root.visits);
        for id in 0..tree.len() {
            let node = tree.node(id);
            let below: u32 = node.children.iter().map(|&c| tree.node(c).visits).sum();
            assert!(below <= node.visits);
        }
    }

    #[test]
    fn test_terminal_root_returns_none() {
        let mut board = Board::empty(Phase::RedWon);
        board.set(0, 0, Some(Color::Red));
        let mut tree = SearchTree::with_seed(&board, 4);
        assert_eq!(tree.search(10, 3), None);
        assert_eq!(tree.root().visits, 0);
    }

    #[test]
    fn test_stuck_root_backs_up_undetermined() {
        let mut board = Board::empty(Phase::RedToMove);
        board.set(0, 0, Some(Color::Red));
        board.set(1, 0, Some(Color::Black));
        board.set(0, 1, Some(Color::Black));
        board.set(1, 1, Some(Color::Black));
        let mut tree = SearchTree::with_seed(&board, 5);
        assert_eq!(tree.search(3, 3), None);
        assert_eq!(tree.root().visits, 3);
        assert_eq!(tree.root().wins, 3);
    }

    #[test]
    fn test_finds_winning_capture() {
        let mut board = Board::empty(Phase::RedToMove);
        board.set(1, 4, Some(Color::Red));
        board.set(4, 1, Some(Color::Black));
        let mut tree = SearchTree::with_seed(&board, 6);
        let best = tree.search(10, 3);
        assert_eq!(
            best,
            Some(Action::Capture {
                x: 1,
                y: 4,
                to_x: 4,
                to_y: 1
            })
        );
        assert_eq!(tree.winrate(), Some(1.0));
    }

    #[test]
    fn test_print_tree() {
        let mut tree = SearchTree::with_seed(&Board::new(), 8);
        tree.search(5, 2);
        let text = tree.print_tree();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("won/total: "));
        assert!(first.ends_with("action: none, phase: red's turn"));
        assert_eq!(text.lines().count(), tree.len());
        assert!(text.lines().skip(1).all(|l| l.contains("+-")));
    }

    #[test]
    fn test_target_phase() {
        assert_eq!(target_phase(&Board::new()), Some(Phase::RedWon));
        assert_eq!(target_phase(&Board::empty(Phase::BlackWon)), None);
    }
}
