//! Monte Carlo playouts (heuristic-guided game simulation).
//!
//! A playout plays the game out from a position until someone completes a
//! line or no candidate move is left. Each ply follows a fast policy:
//!
//! 1. complete a line if the side to move can;
//! 2. otherwise block the opponent's immediate win if there is one;
//! 3. otherwise score every candidate by the longest run it would make
//!    (`len²` once the run reaches `line_length - 1`) and pick uniformly
//!    among the best.

use crate::board::{Board, Move, Player, winner};
use crate::constants::LINE_DIRECTIONS;
use crate::movegen::generate_moves;

/// Play out the game from `board` with `to_move` to play.
///
/// Each ply scores only the neighbourhood candidates from
/// [`generate_moves`], not every empty point: a stone with no neighbour
/// cannot win, block or extend a run, so the policy picks the same moves
/// from the smaller set. The game ends as a draw once no candidate is left,
/// which only happens on a full board.
///
/// Returns the winner, or `None` for a draw.
pub fn rollout(
    board: &Board,
    to_move: Player,
    line_length: usize,
    rng: &mut fastrand::Rng,
) -> Option<Player> {
    if let Some(w) = winner(board, line_length) {
        return Some(w);
    }

    let mut board = board.clone();
    let mut player = to_move;

    loop {
        let candidates = generate_moves(&board);
        let Some(mv) = choose_playout_move(&board, player, line_length, &candidates, rng) else {
            return None;
        };

        let wins = board.completes_line(mv, player, line_length);
        // candidates are always empty points
        if board.place(mv, player).is_err() {
            return None;
        }
        if wins {
            return Some(player);
        }
        player = player.opponent();
    }
}

/// Pick the playout move for `player` among `candidates`.
pub fn choose_playout_move(
    board: &Board,
    player: Player,
    line_length: usize,
    candidates: &[Move],
    rng: &mut fastrand::Rng,
) -> Option<Move> {
    if candidates.is_empty() {
        return None;
    }

    if let Some(&mv) = candidates
        .iter()
        .find(|&&mv| board.completes_line(mv, player, line_length))
    {
        return Some(mv);
    }
    if let Some(&mv) = candidates
        .iter()
        .find(|&&mv| board.completes_line(mv, player.opponent(), line_length))
    {
        return Some(mv);
    }

    let scores: Vec<usize> = candidates
        .iter()
        .map(|&mv| run_bonus(board, mv, player, line_length))
        .collect();
    let top = scores.iter().copied().max().unwrap_or(0);
    let best: Vec<Move> = candidates
        .iter()
        .zip(&scores)
        .filter(|&(_, &s)| s == top)
        .map(|(&mv, _)| mv)
        .collect();

    Some(best[rng.usize(..best.len())])
}

/// `len²` for the longest run through `mv`, if it reaches `line_length - 1`.
fn run_bonus(board: &Board, mv: Move, player: Player, line_length: usize) -> usize {
    let longest = LINE_DIRECTIONS
        .iter()
        .map(|&(dr, dc)| board.run_through(mv, player, dr, dc))
        .max()
        .unwrap_or(0);
    if longest + 1 >= line_length {
        longest * longest
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;

    fn mv(s: &str) -> Move {
        parse_coord(s).unwrap()
    }

    #[test]
    fn test_takes_immediate_win() {
        let mut board = Board::new(7);
        for s in ["B2", "C2", "D2"] {
            board.place(mv(s), Player::A).unwrap();
        }
        for s in ["B4", "C4", "D4"] {
            board.place(mv(s), Player::B).unwrap();
        }
        let mut rng = fastrand::Rng::with_seed(7);
        let candidates = generate_moves(&board);
        for _ in 0..10 {
            let chosen = choose_playout_move(&board, Player::A, 4, &candidates, &mut rng).unwrap();
            assert!(chosen == mv("A2") || chosen == mv("E2"), "got {chosen}");
        }
    }

    #[test]
    fn test_blocks_opponent_win() {
        let mut board = Board::new(7);
        for s in ["A1", "A2", "A3"] {
            board.place(mv(s), Player::B).unwrap();
        }
        board.place(mv("F6"), Player::A).unwrap();
        let mut rng = fastrand::Rng::with_seed(3);
        let candidates = generate_moves(&board);
        let chosen = choose_playout_move(&board, Player::A, 4, &candidates, &mut rng);
        assert_eq!(chosen, Some(mv("A4")));
    }

    #[test]
    fn test_rollout_reports_existing_winner() {
        let mut board = Board::new(5);
        for s in ["A1", "B1", "C1"] {
            board.place(mv(s), Player::B).unwrap();
        }
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(rollout(&board, Player::A, 3, &mut rng), Some(Player::B));
    }

    #[test]
    fn test_rollout_terminates() {
        let board = Board::new(6);
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..20 {
            let result = rollout(&board, Player::A, 4, &mut rng);
            if let Some(w) = result {
                assert!(w == Player::A || w == Player::B);
            }
        }
    }

    #[test]
    fn test_rollout_on_full_board_is_draw() {
        let mut board = Board::new(2);
        board.place(Move::new(0, 0), Player::A).unwrap();
        board.place(Move::new(0, 1), Player::B).unwrap();
        board.place(Move::new(1, 0), Player::B).unwrap();
        board.place(Move::new(1, 1), Player::A).unwrap();
        let mut rng = fastrand::Rng::with_seed(5);
        assert_eq!(rollout(&board, Player::A, 3, &mut rng), None);
    }

    #[test]
    fn test_run_bonus_threshold() {
        let mut board = Board::new(7);
        for s in ["B2", "C2"] {
            board.place(mv(s), Player::A).unwrap();
        }
        assert_eq!(run_bonus(&board, mv("D2"), Player::A, 5), 0);
        assert_eq!(run_bonus(&board, mv("D2"), Player::A, 4), 9);
    }
}
