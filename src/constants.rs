//! Constants for board geometry, heuristic weights, and search defaults.
//!
//! Runtime structures ([`MinimaxConfig`](crate::minimax::MinimaxConfig),
//! [`MctsConfig`](crate::mcts::MctsConfig),
//! [`AgentConfig`](crate::agent::AgentConfig)) take their `Default` values
//! from here, and the command line overrides them.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN).
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// Default number of consecutive stones needed to win.
pub const DEFAULT_LINE_LENGTH: usize = 5;

/// Largest board accepted by the text formats (columns are lettered `A..Z`).
pub const MAX_BOARD_SIZE: usize = 26;

/// Axis directions scanned for lines: horizontal, vertical, diagonal, anti-diagonal.
pub const LINE_DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// All eight neighbour offsets, row-major.
pub const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Neighbours probed by potential-move scoring: right, left, down, down-right, down-left.
pub const POTENTIAL_NEIGHBOURS: [(isize, isize); 5] = [(0, 1), (0, -1), (1, 0), (1, 1), (1, -1)];

// =============================================================================
// Heuristic Weights
// =============================================================================

/// A run that already reaches the line length.
pub const LINE_COMPLETE: i32 = 100_000;

/// A run one stone short of the line length with at least one open end.
pub const NEAR_WIN: i32 = 10_000;

/// A run two stones short of the line length with room to grow.
pub const OPEN_LINE: i32 = 1_000;

/// Potential-move contributions are scaled down by this factor.
pub const POTENTIAL_DIVISOR: i32 = 10;

/// Heuristic values are clamped to `±EVAL_BOUND`.
pub const EVAL_BOUND: i32 = 100_000_000;

/// Pattern sums are clamped to `±PATTERN_BOUND`, strictly inside
/// `EVAL_BOUND`, so a completion threat for the side to move (scored at
/// `±EVAL_BOUND`) outranks any pattern total.
pub const PATTERN_BOUND: i32 = EVAL_BOUND / 2;

// =============================================================================
// Minimax Parameters
// =============================================================================

/// Score of a won position (before the ply adjustment).
pub const WIN_SCORE: i32 = 1_000_000_000;

/// Default search depth below the root move.
pub const DEFAULT_DEPTH: u32 = 2;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of iterations when running on an iteration budget.
pub const DEFAULT_ITERATIONS: usize = 2_000;

/// Default wall-clock budget per decision, in milliseconds.
pub const DEFAULT_TIME_MS: u64 = 5_000;

/// Default UCT exploration constant.
pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Simulations between progress reports in the log.
pub const REPORT_PERIOD: usize = 500;
