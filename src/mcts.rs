//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! Each decision builds a fresh tree rooted at the current position:
//! - **Selection**: descend by UCT; unvisited children come first
//! - **Expansion**: a leaf gets one child per candidate move
//! - **Simulation**: a heuristic playout from the expanded node
//! - **Backpropagation**: visits and root-player wins up the parent chain
//!
//! Nodes live in an arena (`Vec<TreeNode>`) and refer to each other by
//! [`NodeId`], so the parent links do not own anything.

use std::time::{Duration, Instant};

use crate::board::{Board, Move, Player, winner};
use crate::constants::{DEFAULT_EXPLORATION, DEFAULT_TIME_MS, REPORT_PERIOD};
use crate::error::{Error, Result};
use crate::movegen::generate_moves;
use crate::playout::rollout;

/// How long a search may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Budget {
    /// Stop starting new iterations once this much wall-clock time has passed.
    Time(Duration),
    /// Run exactly this many iterations.
    Iterations(usize),
}

impl Budget {
    fn exhausted(&self, iterations: usize, started: Instant) -> bool {
        match *self {
            Budget::Time(limit) => started.elapsed() >= limit,
            Budget::Iterations(n) => iterations >= n,
        }
    }
}

/// MCTS configuration parameters.
#[derive(Clone, Debug)]
pub struct MctsConfig {
    pub budget: Budget,

    /// UCT exploration constant `C`.
    pub exploration: f64,

    /// Seed for the playout RNG; `None` seeds from the environment.
    pub seed: Option<u64>,

    /// Score children from the chooser's side at opponent nodes.
    ///
    /// Statistics always count wins for the root player. By default every
    /// node ranks its children by `wins / visits`; with this set, a node
    /// where the opponent chooses uses `(visits - wins) / visits` instead.
    pub opponent_aware: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            budget: Budget::Time(Duration::from_millis(DEFAULT_TIME_MS)),
            exploration: DEFAULT_EXPLORATION,
            seed: None,
            opponent_aware: false,
        }
    }
}

impl MctsConfig {
    /// Run a fixed number of iterations per decision.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            budget: Budget::Iterations(iterations),
            ..Self::default()
        }
    }

    /// Run for a fixed wall-clock time per decision.
    pub fn with_time(limit: Duration) -> Self {
        Self {
            budget: Budget::Time(limit),
            ..Self::default()
        }
    }

    pub fn exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn opponent_aware(mut self, on: bool) -> Self {
        self.opponent_aware = on;
        self
    }
}

/// Index of a node in the [`Tree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the MCTS search tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// Position at this node
    pub board: Board,
    /// Side to move at this node
    pub to_move: Player,
    /// Move that produced this node (`None` for the root)
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Number of visits
    pub v: u32,
    /// Number of root-player wins (winrate = w/v)
    pub w: u32,
    pub expanded: bool,
    /// Someone has a completed line here
    pub winner: Option<Player>,
    /// No further play is possible (won or full)
    pub terminal: bool,
}

impl TreeNode {
    fn new(
        board: Board,
        to_move: Player,
        mv: Option<Move>,
        parent: Option<NodeId>,
        winner: Option<Player>,
    ) -> Self {
        let terminal = winner.is_some() || board.is_full();
        Self {
            board,
            to_move,
            mv,
            parent,
            children: Vec::new(),
            v: 0,
            w: 0,
            expanded: false,
            winner,
            terminal,
        }
    }

    /// Calculate the winrate for this node.
    #[inline]
    pub fn winrate(&self) -> f64 {
        if self.v > 0 {
            self.w as f64 / self.v as f64
        } else {
            0.0
        }
    }
}

/// Arena-allocated search tree.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    fn new(board: Board, to_move: Player, line_length: usize) -> Self {
        let won = winner(&board, line_length);
        Self {
            nodes: vec![TreeNode::new(board, to_move, None, None, won)],
        }
    }

    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    fn add(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> &TreeNode {
        self.get(NodeId::ROOT)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, root first.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }
}

/// Result of one MCTS decision.
#[derive(Clone, Debug)]
pub struct MctsOutcome {
    pub best: Move,
    /// Completed iterations
    pub iterations: usize,
    pub root_visits: u32,
    /// Root-player winrate of the chosen child
    pub winrate: f64,
    /// Nodes in the tree when the search stopped
    pub nodes: usize,
    pub elapsed: Duration,
}

/// Monte Carlo Tree Search engine.
#[derive(Debug)]
pub struct Mcts {
    config: MctsConfig,
    line_length: usize,
    rng: fastrand::Rng,
    tree: Tree,
    root_player: Player,
}

impl Mcts {
    pub fn new(line_length: usize, config: MctsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            config,
            line_length,
            rng,
            tree: Tree::new(Board::new(0), Player::A, line_length),
            root_player: Player::A,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// The tree built by the last search.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Search for `player`'s move on `board`.
    ///
    /// Fails with [`Error::NoLegalMove`] on a full board, before any
    /// iteration runs.
    pub fn search(&mut self, board: &Board, player: Player) -> Result<MctsOutcome> {
        if generate_moves(board).is_empty() {
            return Err(Error::NoLegalMove);
        }
        if let Some(seed) = self.config.seed {
            self.rng.seed(seed);
        }

        self.root_player = player;
        self.tree = Tree::new(board.clone(), player, self.line_length);
        self.expand(NodeId::ROOT);

        let started = Instant::now();
        let mut iterations = 0;
        while !self.config.budget.exhausted(iterations, started) {
            self.iterate();
            iterations += 1;

            if iterations % REPORT_PERIOD == 0 {
                let root = self.tree.root();
                log::debug!(
                    "mcts: {iterations} iterations, {} nodes, root winrate {:.3}",
                    self.tree.len(),
                    root.winrate()
                );
            }
        }
        if iterations == 0 {
            log::warn!("mcts: budget expired before the first iteration");
        }

        let best_id = self.best_child(NodeId::ROOT).ok_or(Error::BudgetExhausted)?;
        let best = self.tree.get(best_id);
        let mv = best.mv.ok_or(Error::BudgetExhausted)?;

        let outcome = MctsOutcome {
            best: mv,
            iterations,
            root_visits: self.tree.root().v,
            winrate: best.winrate(),
            nodes: self.tree.len(),
            elapsed: started.elapsed(),
        };
        log::debug!(
            "mcts: chose {} after {} iterations in {:?} (v={} wr={:.3})",
            outcome.best,
            outcome.iterations,
            outcome.elapsed,
            best.v,
            outcome.winrate
        );
        Ok(outcome)
    }

    /// One selection / expansion / simulation / backpropagation cycle.
    fn iterate(&mut self) {
        let leaf = self.select(NodeId::ROOT);

        let node = self.tree.get(leaf);
        if !node.expanded && !node.terminal {
            self.expand(leaf);
        }

        let node = self.tree.get(leaf);
        let result = if node.terminal {
            node.winner
        } else {
            rollout(&node.board, node.to_move, self.line_length, &mut self.rng)
        };

        self.backpropagate(leaf, result);
    }

    /// Descend from `from` while the current node has children.
    fn select(&self, from: NodeId) -> NodeId {
        let mut id = from;
        loop {
            let node = self.tree.get(id);
            if node.children.is_empty() {
                return id;
            }
            id = self.most_urgent(node);
        }
    }

    /// Child of `parent` with the highest UCT score; unvisited children win
    /// immediately, earliest first.
    fn most_urgent(&self, parent: &TreeNode) -> NodeId {
        let mut best = parent.children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &child_id in &parent.children {
            let score = self.uct(parent, self.tree.get(child_id));
            if score == f64::INFINITY {
                return child_id;
            }
            if score > best_score {
                best_score = score;
                best = child_id;
            }
        }
        best
    }

    fn uct(&self, parent: &TreeNode, child: &TreeNode) -> f64 {
        if child.v == 0 {
            return f64::INFINITY;
        }
        let v = child.v as f64;
        let exploit = if self.config.opponent_aware && parent.to_move != self.root_player {
            (child.v - child.w) as f64 / v
        } else {
            child.w as f64 / v
        };
        let explore = (parent.v.max(1) as f64).ln() / v;
        exploit + self.config.exploration * explore.sqrt()
    }

    /// Create one child per candidate move.
    fn expand(&mut self, id: NodeId) {
        let node = self.tree.get(id);
        if node.expanded {
            return;
        }
        let mover = node.to_move;
        let parent_board = node.board.clone();

        let mut children = Vec::new();
        for mv in generate_moves(&parent_board) {
            let wins = parent_board.completes_line(mv, mover, self.line_length);
            let mut board = parent_board.clone();
            if board.place(mv, mover).is_err() {
                continue;
            }
            let child = TreeNode::new(
                board,
                mover.opponent(),
                Some(mv),
                Some(id),
                wins.then_some(mover),
            );
            children.push(self.tree.add(child));
        }

        let node = self.tree.get_mut(id);
        node.children = children;
        node.expanded = true;
    }

    /// Walk from `id` to the root, counting a visit everywhere and a win
    /// wherever the simulation was won by the root player.
    fn backpropagate(&mut self, id: NodeId, result: Option<Player>) {
        let won = result == Some(self.root_player);
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.tree.get_mut(id);
            node.v += 1;
            if won {
                node.w += 1;
            }
            current = node.parent;
        }
    }

    /// Most visited child; ties go to the higher winrate, then the earlier move.
    fn best_child(&self, id: NodeId) -> Option<NodeId> {
        let mut best: Option<&TreeNode> = None;
        let mut best_id = None;
        for &child_id in &self.tree.get(id).children {
            let child = self.tree.get(child_id);
            let better = match best {
                None => true,
                Some(b) => child.v > b.v || (child.v == b.v && child.winrate() > b.winrate()),
            };
            if better {
                best = Some(child);
                best_id = Some(child_id);
            }
        }
        best_id
    }
}

/// Log the statistics of the root's children.
pub fn dump_children(tree: &Tree) {
    for &id in &tree.root().children {
        let child = tree.get(id);
        if let Some(mv) = child.mv {
            log::debug!(
                "move {} v={} w={} wr={:.3}",
                mv,
                child.v,
                child.w,
                child.winrate()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;

    fn mv(s: &str) -> Move {
        parse_coord(s).unwrap()
    }

    fn small_position() -> Board {
        let mut board = Board::new(6);
        board.place(mv("C3"), Player::A).unwrap();
        board.place(mv("D4"), Player::B).unwrap();
        board
    }

    #[test]
    fn test_visit_counts_add_up() {
        let mut mcts = Mcts::new(4, MctsConfig::with_iterations(300).seed(42));
        let outcome = mcts.search(&small_position(), Player::A).unwrap();
        assert_eq!(outcome.iterations, 300);

        let tree = mcts.tree();
        let root = tree.root();
        let root_sum: u32 = root.children.iter().map(|&c| tree.get(c).v).sum();
        assert_eq!(root_sum, root.v);
        assert_eq!(root.v, 300);

        for id in tree.ids().skip(1) {
            let node = tree.get(id);
            assert!(node.w <= node.v);
            if node.children.is_empty() {
                continue;
            }
            let sum: u32 = node.children.iter().map(|&c| tree.get(c).v).sum();
            assert_eq!(sum, node.v - 1, "node {id:?}");
        }
    }

    #[test]
    fn test_child_boards_follow_moves() {
        let mut mcts = Mcts::new(4, MctsConfig::with_iterations(100).seed(1));
        mcts.search(&small_position(), Player::A).unwrap();
        let tree = mcts.tree();
        for id in tree.ids().skip(1) {
            let node = tree.get(id);
            let parent = tree.get(node.parent.unwrap());
            let mut expected = parent.board.clone();
            expected.place(node.mv.unwrap(), parent.to_move).unwrap();
            assert_eq!(node.board, expected);
            assert_eq!(node.to_move, parent.to_move.opponent());
        }
    }

    #[test]
    fn test_full_board_is_no_legal_move() {
        let mut board = Board::new(2);
        board.place(Move::new(0, 0), Player::A).unwrap();
        board.place(Move::new(0, 1), Player::B).unwrap();
        board.place(Move::new(1, 0), Player::B).unwrap();
        board.place(Move::new(1, 1), Player::A).unwrap();
        let mut mcts = Mcts::new(3, MctsConfig::with_iterations(10));
        assert_eq!(mcts.search(&board, Player::A).unwrap_err(), Error::NoLegalMove);
    }

    #[test]
    fn test_zero_iterations_falls_back_to_first_child() {
        let mut mcts = Mcts::new(4, MctsConfig::with_iterations(0));
        let board = small_position();
        let outcome = mcts.search(&board, Player::A).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best, generate_moves(&board)[0]);
    }

    #[test]
    fn test_never_picks_unvisited_child() {
        let board = small_position();
        let candidates = generate_moves(&board).len();
        let mut mcts = Mcts::new(4, MctsConfig::with_iterations(candidates / 2).seed(9));
        let outcome = mcts.search(&board, Player::A).unwrap();
        let tree = mcts.tree();
        let chosen = tree
            .root()
            .children
            .iter()
            .map(|&c| tree.get(c))
            .find(|c| c.mv == Some(outcome.best))
            .unwrap();
        assert!(chosen.v > 0);
    }

    #[test]
    fn test_finds_immediate_win() {
        let mut board = Board::new(6);
        for s in ["B2", "C2", "D2"] {
            board.place(mv(s), Player::A).unwrap();
        }
        // O threatens too, so every non-winning move loses
        for s in ["B5", "C5", "D5"] {
            board.place(mv(s), Player::B).unwrap();
        }
        let mut mcts = Mcts::new(4, MctsConfig::with_iterations(600).seed(5));
        let outcome = mcts.search(&board, Player::A).unwrap();
        assert!(
            outcome.best == mv("A2") || outcome.best == mv("E2"),
            "got {}",
            outcome.best
        );
    }

    #[test]
    fn test_uct_exploitation_modes() {
        let mut parent = TreeNode::new(small_position(), Player::B, None, None, None);
        parent.v = 10;
        let mut child = TreeNode::new(small_position(), Player::A, Some(mv("A1")), None, None);
        child.v = 4;
        child.w = 3;
        let explore = std::f64::consts::SQRT_2 * (10f64.ln() / 4.0).sqrt();

        // root is X, so the parent is an opponent node
        let plain = Mcts::new(4, MctsConfig::with_iterations(1));
        assert!(!plain.config().opponent_aware);
        assert!((plain.uct(&parent, &child) - (0.75 + explore)).abs() < 1e-12);

        let aware = Mcts::new(4, MctsConfig::with_iterations(1).opponent_aware(true));
        assert!((aware.uct(&parent, &child) - (0.25 + explore)).abs() < 1e-12);

        child.v = 0;
        assert_eq!(plain.uct(&parent, &child), f64::INFINITY);
    }

    #[test]
    fn test_time_budget_stops() {
        let mut mcts = Mcts::new(4, MctsConfig::with_time(Duration::from_millis(30)).seed(3));
        let outcome = mcts.search(&small_position(), Player::B).unwrap();
        assert!(outcome.iterations > 0);
        assert!(outcome.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let board = small_position();
        let mut a = Mcts::new(4, MctsConfig::with_iterations(200).seed(77));
        let mut b = Mcts::new(4, MctsConfig::with_iterations(200).seed(77));
        let ra = a.search(&board, Player::A).unwrap();
        let rb = b.search(&board, Player::A).unwrap();
        assert_eq!(ra.best, rb.best);
        assert_eq!(a.tree().len(), b.tree().len());
    }
}
