//! Depth-bounded minimax with alpha-beta pruning.
//!
//! The root plays each candidate move on a copy of the board and scores it
//! with one recursive call in which the opponent moves next. Scores are
//! always from the root player's point of view:
//!
//! - root player has a completed line: `WIN_SCORE - ply`
//! - opponent has a completed line: `-WIN_SCORE + ply`
//! - board full: `0`
//! - depth exhausted: heuristic evaluation for the root player, with the
//!   side to move at the leaf taken into account
//!
//! `ply` counts moves from the root, so faster wins and slower losses score
//! better.
//!
//! With `parallel` set, root moves are searched on the rayon pool, each with
//! its own full window. Workers never share alpha/beta, so there is no
//! cross-worker pruning.

use rayon::prelude::*;

use crate::board::{Board, Move, Player, has_won};
use crate::constants::{DEFAULT_DEPTH, WIN_SCORE};
use crate::error::{Error, Result};
use crate::heuristic::Heuristic;
use crate::movegen::{generate_moves, generate_moves_with_threats};

/// Bound for alpha-beta windows; larger than any reachable score.
const INF: i32 = i32::MAX;

/// Minimax configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinimaxConfig {
    /// Plies searched below each root move.
    pub depth: u32,
    /// Alpha-beta cutoffs; `false` searches the full tree.
    pub pruning: bool,
    /// Search root moves on the rayon thread pool.
    pub parallel: bool,
    /// Add block/extend moves around opponent lines to the candidates.
    pub threat_moves: bool,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            pruning: true,
            parallel: false,
            threat_moves: false,
        }
    }
}

impl MinimaxConfig {
    pub fn with_depth(depth: u32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    pub fn pruning(mut self, on: bool) -> Self {
        self.pruning = on;
        self
    }

    pub fn parallel(mut self, on: bool) -> Self {
        self.parallel = on;
        self
    }

    pub fn threat_moves(mut self, on: bool) -> Self {
        self.threat_moves = on;
        self
    }
}

/// Result of a minimax search.
#[derive(Clone, Debug)]
pub struct MinimaxOutcome {
    pub best: Move,
    /// Score of the best move for the root player
    pub score: i32,
    /// Every root move with the score it received, in search order. With
    /// pruning, moves that were cut off carry an upper bound.
    pub root_scores: Vec<(Move, i32)>,
    /// Total nodes visited
    pub nodes: u64,
}

/// Per-search state.
struct SearchContext {
    root: Player,
    nodes: u64,
}

/// Alpha-beta searcher.
#[derive(Clone, Debug)]
pub struct Minimax {
    config: MinimaxConfig,
    line_length: usize,
    heuristic: Heuristic,
}

impl Minimax {
    pub fn new(line_length: usize, config: MinimaxConfig) -> Self {
        Self {
            config,
            line_length,
            heuristic: Heuristic::new(line_length),
        }
    }

    /// Replace the evaluator (for example to change its weights).
    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }

    /// Find the best move for `player`.
    ///
    /// Fails with [`Error::NoLegalMove`] when the board is full.
    pub fn search(&self, board: &Board, player: Player) -> Result<MinimaxOutcome> {
        let moves = self.candidates(board, player);
        if moves.is_empty() {
            return Err(Error::NoLegalMove);
        }

        let (root_scores, nodes) = if self.config.parallel {
            self.search_root_parallel(board, player, &moves)
        } else {
            self.search_root(board, player, &moves)
        };

        let mut best: Option<(Move, i32)> = None;
        for &(mv, score) in &root_scores {
            log::trace!("minimax: {mv} -> {score}");
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((mv, score));
            }
        }
        let (best, score) = best.ok_or(Error::NoLegalMove)?;

        log::debug!(
            "minimax: chose {best} score={score} depth={} nodes={nodes}",
            self.config.depth
        );
        Ok(MinimaxOutcome {
            best,
            score,
            root_scores,
            nodes,
        })
    }

    fn search_root(&self, board: &Board, player: Player, moves: &[Move]) -> (Vec<(Move, i32)>, u64) {
        let mut ctx = SearchContext {
            root: player,
            nodes: 0,
        };
        let mut alpha = -INF;
        let mut scores = Vec::with_capacity(moves.len());

        for &mv in moves {
            let mut child = board.clone();
            if child.place(mv, player).is_err() {
                continue;
            }
            let score = self.alphabeta(&mut ctx, &child, self.config.depth, 1, alpha, INF, false);
            if self.config.pruning {
                alpha = alpha.max(score);
            }
            scores.push((mv, score));
        }

        (scores, ctx.nodes)
    }

    fn search_root_parallel(
        &self,
        board: &Board,
        player: Player,
        moves: &[Move],
    ) -> (Vec<(Move, i32)>, u64) {
        let results: Vec<(Move, i32, u64)> = moves
            .par_iter()
            .filter_map(|&mv| {
                let mut child = board.clone();
                child.place(mv, player).ok()?;
                let mut ctx = SearchContext {
                    root: player,
                    nodes: 0,
                };
                let score = self.alphabeta(&mut ctx, &child, self.config.depth, 1, -INF, INF, false);
                Some((mv, score, ctx.nodes))
            })
            .collect();

        let nodes = results.iter().map(|&(_, _, n)| n).sum();
        let scores = results.into_iter().map(|(mv, s, _)| (mv, s)).collect();
        (scores, nodes)
    }

    fn candidates(&self, board: &Board, mover: Player) -> Vec<Move> {
        if self.config.threat_moves {
            generate_moves_with_threats(board, mover, self.line_length)
        } else {
            generate_moves(board)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn alphabeta(
        &self,
        ctx: &mut SearchContext,
        board: &Board,
        depth: u32,
        ply: i32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> i32 {
        ctx.nodes += 1;

        if has_won(ctx.root, board, self.line_length) {
            return WIN_SCORE - ply;
        }
        if has_won(ctx.root.opponent(), board, self.line_length) {
            return -WIN_SCORE + ply;
        }
        if board.is_full() {
            return 0;
        }
        let mover = if maximizing {
            ctx.root
        } else {
            ctx.root.opponent()
        };
        if depth == 0 {
            return self.heuristic.evaluate_to_move(board, ctx.root, mover);
        }

        let moves = self.candidates(board, mover);
        if moves.is_empty() {
            return 0;
        }

        if maximizing {
            let mut best = -INF;
            for mv in moves {
                let mut child = board.clone();
                if child.place(mv, mover).is_err() {
                    continue;
                }
                let score = self.alphabeta(ctx, &child, depth - 1, ply + 1, alpha, beta, false);
                best = best.max(score);
                alpha = alpha.max(score);
                if self.config.pruning && beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INF;
            for mv in moves {
                let mut child = board.clone();
                if child.place(mv, mover).is_err() {
                    continue;
                }
                let score = self.alphabeta(ctx, &child, depth - 1, ply + 1, alpha, beta, true);
                best = best.min(score);
                beta = beta.min(score);
                if self.config.pruning && beta <= alpha {
                    break;
                }
            }
            best
        }
    }
}
