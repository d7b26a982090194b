//! Error types for board handling and move search.

use thiserror::Error;

use crate::board::Move;

/// Errors raised by the board utilities and the search engines.
///
/// None of these are fatal to a caller of
/// [`Agent::choose_move`](crate::agent::Agent::choose_move): the driver turns
/// search failures into "no move available".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("illegal move {mv}: {reason}")]
    InvalidMove { mv: Move, reason: MoveError },

    #[error("no legal moves available")]
    NoLegalMove,

    #[error("search budget exhausted before any iteration completed")]
    BudgetExhausted,

    #[error("board parse error on line {line}: {message}")]
    BoardParse { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why a single placement was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("point is off the board")]
    OutOfBounds,

    #[error("point is not empty")]
    Occupied,
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
