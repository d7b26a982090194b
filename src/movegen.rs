//! Candidate move generation.
//!
//! Only empty points next to an existing stone are considered, which keeps
//! the branching factor small on sparse boards. Results are always in
//! row-major order so searches are reproducible.

use std::collections::BTreeSet;

use crate::board::{Board, Move, Player, legal};
use crate::constants::NEIGHBOURS;

/// Empty points within one step (diagonals included) of any stone.
///
/// An empty board yields just the centre point; a full board yields nothing.
pub fn generate_moves(board: &Board) -> Vec<Move> {
    if board.is_blank() {
        return if board.size() > 0 {
            vec![board.centre()]
        } else {
            Vec::new()
        };
    }

    let size = board.size();
    board
        .empty_cells()
        .filter(|&mv| {
            NEIGHBOURS.iter().any(|&(dr, dc)| {
                mv.offset(dr, dc, 1, size)
                    .is_some_and(|n| board.get(n).is_some())
            })
        })
        .collect()
}

/// [`generate_moves`] plus block/extend points around opponent lines.
///
/// From every opponent stone, a window of `line_length` points is projected
/// along each of the eight directions. A window that fits on the board,
/// holds no `player` stone and already has at least `line_length - 2`
/// opponent stones is a developing threat: its empty points and the two
/// points capping it are added, even when they lie outside the one-step
/// neighbourhood.
pub fn generate_moves_with_threats(board: &Board, player: Player, line_length: usize) -> Vec<Move> {
    let mut moves: BTreeSet<Move> = generate_moves(board).into_iter().collect();
    if line_length < 2 {
        return moves.into_iter().collect();
    }

    let size = board.size();
    let opponent = player.opponent();
    let threshold = line_length.saturating_sub(2).max(1);
    let span = line_length as isize;

    for (anchor, _) in board.stones().filter(|&(_, owner)| owner == opponent) {
        for &(dr, dc) in &NEIGHBOURS {
            let Some(window) = (0..span)
                .map(|k| anchor.offset(dr, dc, k, size))
                .collect::<Option<Vec<Move>>>()
            else {
                continue;
            };
            if window.iter().any(|&mv| board.get(mv) == Some(player)) {
                continue;
            }
            let stones = window.iter().filter(|&&mv| board.get(mv) == Some(opponent)).count();
            if stones < threshold {
                continue;
            }

            moves.extend(window.iter().copied().filter(|&mv| legal(board, mv)));
            for cap in [anchor.offset(dr, dc, -1, size), anchor.offset(dr, dc, span, size)] {
                if let Some(cap) = cap.filter(|&c| legal(board, c)) {
                    moves.insert(cap);
                }
            }
        }
    }

    moves.into_iter().collect()
}
