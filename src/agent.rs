//! Search driver: one player, one board geometry, one engine.
//!
//! An [`Agent`] owns the configured engine and turns its result into either
//! a legal move or an explicit "no move". Engine errors never escape
//! [`Agent::choose_move`]; they are logged and reported as `None`.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Move, Player};
use crate::constants::{DEFAULT_BOARD_SIZE, DEFAULT_LINE_LENGTH, MAX_BOARD_SIZE};
use crate::error::{Error, Result};
use crate::mcts::{Budget, Mcts, MctsConfig, dump_children};
use crate::minimax::{Minimax, MinimaxConfig};

/// Which engine an agent searches with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Minimax,
    Mcts,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Minimax => write!(f, "minimax"),
            SearchMode::Mcts => write!(f, "mcts"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimax" | "alphabeta" => Ok(SearchMode::Minimax),
            "mcts" => Ok(SearchMode::Mcts),
            other => Err(Error::InvalidConfig(format!("unknown search mode: {other}"))),
        }
    }
}

/// Agent configuration.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub player: Player,
    pub board_size: usize,
    /// Stones in a row needed to win
    pub line_length: usize,
    pub mode: SearchMode,
    pub minimax: MinimaxConfig,
    pub mcts: MctsConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(Player::A)
    }
}

impl AgentConfig {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            board_size: DEFAULT_BOARD_SIZE,
            line_length: DEFAULT_LINE_LENGTH,
            mode: SearchMode::default(),
            minimax: MinimaxConfig::default(),
            mcts: MctsConfig::default(),
        }
    }

    pub fn with_geometry(mut self, board_size: usize, line_length: usize) -> Self {
        self.board_size = board_size;
        self.line_length = line_length;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_minimax(mut self, minimax: MinimaxConfig) -> Self {
        self.minimax = minimax;
        self
    }

    pub fn with_mcts(mut self, mcts: MctsConfig) -> Self {
        self.mcts = mcts;
        self
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.player = player;
        self
    }

    /// Reject geometries and search parameters no engine can work with.
    pub fn validate(&self) -> Result<()> {
        if self.board_size == 0 || self.board_size > MAX_BOARD_SIZE {
            return Err(Error::InvalidConfig(format!(
                "board size must be between 1 and {MAX_BOARD_SIZE}, got {}",
                self.board_size
            )));
        }
        if self.line_length == 0 || self.line_length > self.board_size {
            return Err(Error::InvalidConfig(format!(
                "line length must be between 1 and the board size ({}), got {}",
                self.board_size, self.line_length
            )));
        }
        let c = self.mcts.exploration;
        if !c.is_finite() || c < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "exploration constant must be finite and non-negative, got {c}"
            )));
        }
        if let Budget::Iterations(0) = self.mcts.budget {
            log::warn!("mcts: iteration budget is 0, moves will fall back to the first child");
        }
        Ok(())
    }
}

/// Search engine selected by [`SearchMode`].
#[derive(Debug)]
enum Engine {
    Minimax(Minimax),
    Mcts(Box<Mcts>),
}

/// A player backed by a search engine.
#[derive(Debug)]
pub struct Agent {
    config: AgentConfig,
    engine: Engine,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let engine = match config.mode {
            SearchMode::Minimax => {
                Engine::Minimax(Minimax::new(config.line_length, config.minimax.clone()))
            }
            SearchMode::Mcts => {
                Engine::Mcts(Box::new(Mcts::new(config.line_length, config.mcts.clone())))
            }
        };
        Ok(Self { config, engine })
    }

    pub fn player(&self) -> Player {
        self.config.player
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Pick a move for this agent's player, or `None` when there is none.
    ///
    /// The returned move is always legal on `board`.
    pub fn choose_move(&mut self, board: &Board) -> Option<Move> {
        match self.search(board) {
            Ok(mv) => Some(mv),
            Err(Error::NoLegalMove) => {
                log::info!("{}: no legal move", self.config.player);
                None
            }
            Err(e) => {
                log::warn!("{}: search failed: {e}", self.config.player);
                None
            }
        }
    }

    /// Like [`Agent::choose_move`], but keeps the reason when no move is found.
    pub fn search(&mut self, board: &Board) -> Result<Move> {
        if board.size() != self.config.board_size {
            log::warn!(
                "board is {}x{}, agent was configured for {}x{}",
                board.size(),
                board.size(),
                self.config.board_size,
                self.config.board_size
            );
        }

        let player = self.config.player;
        let mv = match &mut self.engine {
            Engine::Minimax(engine) => engine.search(board, player)?.best,
            Engine::Mcts(engine) => {
                let outcome = engine.search(board, player)?;
                if log::log_enabled!(log::Level::Debug) {
                    dump_children(engine.tree());
                }
                outcome.best
            }
        };

        board.validate_move(mv)?;
        log::debug!("{player} ({}) plays {mv}", self.config.mode);
        Ok(mv)
    }
}
