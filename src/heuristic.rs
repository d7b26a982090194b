//! Positional heuristic for N-in-a-row boards.
//!
//! The score of a position for `player` is the sum of the *cell scores* of
//! `player`'s stones minus the sum for the opponent's stones, so
//! `evaluate(b, p) == -evaluate(b, p.opponent())`.
//!
//! A cell score has two parts:
//! - **Line patterns**: every maximal run through the stone, along the four
//!   axes, is weighted by how close it is to the line length and whether it
//!   still has room to get there. Each run is counted once, at its first stone.
//! - **Potential moves**: each empty neighbour to the right, left, below and
//!   diagonally below is tried as a hypothetical stone; the lines through it
//!   are scored and the stone is taken back.
//!
//! Pattern sums cannot tell whose turn it is, so a four for the side to
//! move looks no more urgent than an open four for the other side.
//! [`Heuristic::evaluate_to_move`] adds that: if the side to move can
//! complete a line with its next stone, the position scores `±EVAL_BOUND`,
//! above any pattern total. Search leaves use this form.

use crate::board::{Board, Move, Player};
use crate::constants::{
    EVAL_BOUND, LINE_COMPLETE, LINE_DIRECTIONS, NEAR_WIN, OPEN_LINE, PATTERN_BOUND,
    POTENTIAL_DIVISOR, POTENTIAL_NEIGHBOURS,
};

/// Tunable pattern weights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeuristicWeights {
    pub line_complete: i32,
    pub near_win: i32,
    pub open_line: i32,
    pub potential_divisor: i32,
    /// Bonus per stone of the *evaluating* player on the centre 3x3.
    ///
    /// Non-zero values make the evaluation deliberately asymmetric (an
    /// aggressiveness bias); minimax then no longer sees a zero-sum score.
    pub centre_bonus: i32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            line_complete: LINE_COMPLETE,
            near_win: NEAR_WIN,
            open_line: OPEN_LINE,
            potential_divisor: POTENTIAL_DIVISOR,
            centre_bonus: 0,
        }
    }
}

/// Shape of one maximal run along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    len: usize,
    open_ends: usize,
    /// Run length plus the empty-or-own cells either side of it.
    room: usize,
}

/// Line-pattern evaluator for a fixed line length.
#[derive(Clone, Debug)]
pub struct Heuristic {
    line_length: usize,
    weights: HeuristicWeights,
}

impl Heuristic {
    pub fn new(line_length: usize) -> Self {
        Self {
            line_length,
            weights: HeuristicWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn line_length(&self) -> usize {
        self.line_length
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Score `board` from `player`'s point of view.
    pub fn evaluate(&self, board: &Board, player: Player) -> i32 {
        let mut scratch = board.clone();
        let stones: Vec<(Move, Player)> = board.stones().collect();

        let mut score: i64 = 0;
        for (mv, owner) in stones {
            let cell = self.cell_score(&mut scratch, mv, owner) as i64;
            if owner == player {
                score += cell;
            } else {
                score -= cell;
            }
        }

        if self.weights.centre_bonus != 0 {
            score += self.centre_bonus(board, player) as i64;
        }

        score.clamp(-(PATTERN_BOUND as i64), PATTERN_BOUND as i64) as i32
    }

    /// Score `board` from `player`'s point of view with `to_move` to play.
    ///
    /// A position where `to_move` can complete a line next is decided:
    /// `EVAL_BOUND` if that is `player`, `-EVAL_BOUND` otherwise. Any other
    /// position falls back to [`Heuristic::evaluate`].
    pub fn evaluate_to_move(&self, board: &Board, player: Player, to_move: Player) -> i32 {
        if self.can_complete(board, to_move) {
            return if to_move == player { EVAL_BOUND } else { -EVAL_BOUND };
        }
        self.evaluate(board, player)
    }

    /// True if one more `player` stone anywhere would complete a line.
    pub fn can_complete(&self, board: &Board, player: Player) -> bool {
        board
            .empty_cells()
            .any(|mv| board.completes_line(mv, player, self.line_length))
    }

    /// Positional weight of playing `player` on the empty point `mv`: the
    /// line patterns through the new stone. Illegal points weigh 0.
    pub fn move_weight(&self, board: &Board, mv: Move, player: Player) -> i32 {
        let mut scratch = board.clone();
        match scratch.scoped(mv, player) {
            Some(placed) => self.lines_through(&placed, mv, player),
            None => 0,
        }
    }

    /// Line patterns starting at `mv` plus the scaled potential-move score.
    fn cell_score(&self, scratch: &mut Board, mv: Move, owner: Player) -> i32 {
        let lines = self.line_score(scratch, mv, owner);
        let potential = self.potential_score(scratch, mv, owner);
        lines + potential / self.weights.potential_divisor.max(1)
    }

    /// Runs whose first stone is `mv`.
    fn line_score(&self, board: &Board, mv: Move, owner: Player) -> i32 {
        let size = board.size();
        LINE_DIRECTIONS
            .iter()
            .filter(|&&(dr, dc)| {
                mv.offset(dr, dc, -1, size).and_then(|b| board.get(b)) != Some(owner)
            })
            .map(|&(dr, dc)| self.pattern_weight(self.run_from(board, mv, owner, dr, dc)))
            .sum()
    }

    /// Every run passing through `mv`, which must hold an `owner` stone.
    fn lines_through(&self, board: &Board, mv: Move, owner: Player) -> i32 {
        let size = board.size();
        LINE_DIRECTIONS
            .iter()
            .map(|&(dr, dc)| {
                let back = board.count_direction(mv, owner, -dr, -dc) as isize;
                let start = mv.offset(dr, dc, -back, size).unwrap_or(mv);
                self.pattern_weight(self.run_from(board, start, owner, dr, dc))
            })
            .sum()
    }

    fn potential_score(&self, scratch: &mut Board, mv: Move, owner: Player) -> i32 {
        let size = scratch.size();
        let mut score = 0;
        for &(dr, dc) in &POTENTIAL_NEIGHBOURS {
            let Some(next) = mv.offset(dr, dc, 1, size) else {
                continue;
            };
            if let Some(placed) = scratch.scoped(next, owner) {
                score += self.lines_through(&placed, next, owner);
            }
        }
        score
    }

    /// Measure the run that starts at `start` and extends along `(dr, dc)`.
    fn run_from(&self, board: &Board, start: Move, owner: Player, dr: isize, dc: isize) -> Run {
        let size = board.size();
        let len = 1 + board.count_direction(start, owner, dr, dc);

        let mut open_ends = 0;
        let mut room = len;
        for (step, from) in [(-1isize, 0isize), (1, len as isize - 1)] {
            if let Some(end) = start.offset(dr, dc, from + step, size) {
                if board.is_empty_at(end) {
                    open_ends += 1;
                }
            }
            let mut k = from + step;
            while room < self.line_length {
                match start.offset(dr, dc, k, size) {
                    Some(cell) if board.get(cell) != Some(owner.opponent()) => room += 1,
                    _ => break,
                }
                k += step;
            }
        }

        Run {
            len,
            open_ends,
            room,
        }
    }

    fn pattern_weight(&self, run: Run) -> i32 {
        let x = self.line_length;
        if run.len >= x {
            return self.weights.line_complete;
        }
        if run.room < x || run.open_ends == 0 {
            return 0;
        }
        if run.len + 1 == x {
            self.weights.near_win
        } else if run.len + 2 == x {
            self.weights.open_line
        } else {
            (run.len * run.open_ends) as i32
        }
    }

    fn centre_bonus(&self, board: &Board, player: Player) -> i32 {
        let centre = board.centre();
        let near = |a: usize, b: usize| a.abs_diff(b) <= 1;
        let count = board
            .stones()
            .filter(|&(mv, owner)| {
                owner == player && near(mv.row, centre.row) && near(mv.col, centre.col)
            })
            .count();
        count as i32 * self.weights.centre_bonus
    }
}

/// Shorthand for `Heuristic::new(line_length).evaluate(board, player)`.
pub fn evaluate(board: &Board, player: Player, line_length: usize) -> i32 {
    Heuristic::new(line_length).evaluate(board, player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;

    fn board_with(size: usize, xs: &[&str], os: &[&str]) -> Board {
        let mut board = Board::new(size);
        for s in xs {
            board.place(parse_coord(s).unwrap(), Player::A).unwrap();
        }
        for s in os {
            board.place(parse_coord(s).unwrap(), Player::B).unwrap();
        }
        board
    }

    #[test]
    fn test_empty_board_is_zero() {
        let h = Heuristic::new(5);
        assert_eq!(h.evaluate(&Board::new(9), Player::A), 0);
    }

    #[test]
    fn test_antisymmetric() {
        let h = Heuristic::new(5);
        let board = board_with(9, &["C3", "D4", "E5", "E4"], &["F6", "C4", "A1"]);
        let a = h.evaluate(&board, Player::A);
        let b = h.evaluate(&board, Player::B);
        assert_eq!(a, -b);
    }

    #[test]
    fn test_evaluate_leaves_board_untouched() {
        let h = Heuristic::new(4);
        let board = board_with(6, &["A1", "B1", "C2"], &["D4", "D5"]);
        let before = board.clone();
        let first = h.evaluate(&board, Player::A);
        assert_eq!(board, before);
        assert_eq!(h.evaluate(&board, Player::A), first);
    }

    #[test]
    fn test_run_weights() {
        let h = Heuristic::new(5);
        let near = board_with(9, &["B2", "C2", "D2", "E2"], &[]);
        let open = board_with(9, &["B2", "C2", "D2"], &[]);
        let near_score = h.evaluate(&near, Player::A);
        let open_score = h.evaluate(&open, Player::A);
        assert!(near_score >= NEAR_WIN, "got {near_score}");
        assert!(open_score >= OPEN_LINE && open_score < NEAR_WIN, "got {open_score}");
    }

    #[test]
    fn test_dead_run_scores_nothing() {
        let h = Heuristic::new(5);
        // three X boxed in by O on a five-wide row
        let board = board_with(5, &["B1", "C1", "D1"], &["A1", "E1"]);
        let run = h.run_from(&board, parse_coord("B1").unwrap(), Player::A, 0, 1);
        assert_eq!(run.len, 3);
        assert_eq!(run.open_ends, 0);
        assert_eq!(h.pattern_weight(run), 0);
    }

    #[test]
    fn test_opponent_threat_outweighs_own_three() {
        let h = Heuristic::new(5);
        let board = board_with(11, &["B8", "C8", "D8"], &["F2", "G2", "H2", "I2"]);
        assert!(h.evaluate(&board, Player::A) < 0);
    }

    #[test]
    fn test_move_weight_prefers_completion() {
        let h = Heuristic::new(5);
        // four in a row against the left edge: only E1 completes
        let board = board_with(8, &["A1", "B1", "C1", "D1"], &["A2"]);
        let completing = parse_coord("E1").unwrap();
        let best = board
            .empty_cells()
            .max_by_key(|&mv| h.move_weight(&board, mv, Player::A))
            .unwrap();
        assert_eq!(best, completing);
        assert!(h.move_weight(&board, completing, Player::A) >= LINE_COMPLETE);
        assert_eq!(h.move_weight(&board, parse_coord("A1").unwrap(), Player::A), 0);
    }

    #[test]
    fn test_corner_stones_do_not_panic() {
        let h = Heuristic::new(5);
        let board = board_with(5, &["A1", "E5", "A5"], &["E1"]);
        let _ = h.evaluate(&board, Player::A);
    }

    #[test]
    fn test_threat_to_move_outranks_own_open_four() {
        let h = Heuristic::new(5);
        // O's four on row 2 is capped by X at A2 and open at F2
        let base = board_with(9, &["A2", "B6", "C6", "D6"], &["B2", "C2", "D2", "E2"]);

        let mut extend = base.clone();
        extend.place(parse_coord("E6").unwrap(), Player::A).unwrap();
        let mut block = base.clone();
        block.place(parse_coord("F2").unwrap(), Player::A).unwrap();

        let after_extend = h.evaluate_to_move(&extend, Player::A, Player::B);
        let after_block = h.evaluate_to_move(&block, Player::A, Player::B);
        assert_eq!(after_extend, -EVAL_BOUND);
        assert!(after_block > after_extend, "{after_block} vs {after_extend}");
        assert_eq!(h.evaluate_to_move(&extend, Player::B, Player::B), EVAL_BOUND);
    }

    #[test]
    fn test_evaluate_to_move_without_threat_matches_evaluate() {
        let h = Heuristic::new(5);
        let board = board_with(9, &["C3", "D4", "E5"], &["F6", "C4"]);
        assert!(!h.can_complete(&board, Player::A));
        assert!(!h.can_complete(&board, Player::B));
        assert_eq!(
            h.evaluate_to_move(&board, Player::A, Player::B),
            h.evaluate(&board, Player::A)
        );
    }

    #[test]
    fn test_centre_bonus_is_one_sided() {
        let weights = HeuristicWeights {
            centre_bonus: 50,
            ..HeuristicWeights::default()
        };
        let h = Heuristic::new(5).with_weights(weights);
        let board = board_with(9, &["E5"], &["A1"]);
        let a = h.evaluate(&board, Player::A);
        let b = h.evaluate(&board, Player::B);
        assert_eq!(a + b, 50);
    }
}
