//! Gomoku-Search: move search for N-in-a-row games.
//!
//! Two engines choose moves on a square board where the first player to
//! place `line_length` stones in a row (horizontally, vertically or
//! diagonally) wins: a depth-bounded alpha-beta minimax driven by a line
//! pattern heuristic, and a Monte Carlo Tree Search with heuristic playouts.
//!
//! ## Modules
//!
//! - [`constants`] - Default geometry, heuristic weights and search parameters
//! - [`board`] - Board state, players, coordinates and win detection
//! - [`heuristic`] - Line-pattern position evaluation
//! - [`movegen`] - Candidate move generation
//! - [`minimax`] - Alpha-beta minimax search
//! - [`mcts`] - Monte Carlo Tree Search with UCT
//! - [`playout`] - Heuristic game simulation for MCTS
//! - [`agent`] - Search driver choosing between the engines
//! - [`session`] - Text command loop for interactive play
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use gomoku_search::agent::{Agent, AgentConfig};
//! use gomoku_search::board::{Board, Player, parse_coord};
//!
//! let mut board = Board::new(9);
//! board.place(parse_coord("E5").unwrap(), Player::A).unwrap();
//!
//! let config = AgentConfig::new(Player::B).with_geometry(9, 5);
//! let mut agent = Agent::new(config).unwrap();
//! let reply = agent.choose_move(&board).unwrap();
//! println!("O plays {reply}");
//! ```

pub mod agent;
pub mod board;
pub mod constants;
pub mod error;
pub mod heuristic;
pub mod mcts;
pub mod minimax;
pub mod movegen;
pub mod playout;
pub mod session;

pub use error::{Error, Result};
