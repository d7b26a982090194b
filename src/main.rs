//! Gomoku-Search: N-in-a-row move search from the command line.
//!
//! ## Usage
//!
//! - `gomoku-search` - Engine-vs-engine game on the default board
//! - `gomoku-search move --player o < board.txt` - Best move for a position
//! - `gomoku-search play` - Text session for GUIs and manual play
//!
//! Set `RUST_LOG=debug` to see search statistics.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use gomoku_search::agent::{Agent, AgentConfig, SearchMode};
use gomoku_search::board::{Board, Player, winner};
use gomoku_search::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_DEPTH, DEFAULT_EXPLORATION, DEFAULT_ITERATIONS, DEFAULT_LINE_LENGTH,
    DEFAULT_TIME_MS,
};
use gomoku_search::mcts::MctsConfig;
use gomoku_search::minimax::MinimaxConfig;
use gomoku_search::session::Session;

/// Gomoku-Search: minimax and MCTS move search for N-in-a-row games
#[derive(Parser)]
#[command(name = "gomoku-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the engine's move for a position read from a file or stdin
    Move {
        /// Board file ('.', 'X', 'O' per cell); stdin when omitted
        #[arg(long)]
        board: Option<PathBuf>,
        /// Side to move: x or o
        #[arg(long)]
        player: Player,
        /// Stones in a row needed to win
        #[arg(long, default_value_t = DEFAULT_LINE_LENGTH)]
        line: usize,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Play a game between two engines and print every position
    Selfplay(SelfplayArgs),
    /// Start the text command session on stdin/stdout
    Play {
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
        #[arg(long, default_value_t = DEFAULT_LINE_LENGTH)]
        line: usize,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args, Clone)]
struct SelfplayArgs {
    #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,
    #[arg(long, default_value_t = DEFAULT_LINE_LENGTH)]
    line: usize,
    /// Engine for X, who moves first
    #[arg(long, default_value_t = SearchMode::Minimax)]
    black: SearchMode,
    /// Engine for O
    #[arg(long, default_value_t = SearchMode::Mcts)]
    white: SearchMode,
    #[command(flatten)]
    search: SearchArgs,
}

impl Default for SelfplayArgs {
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            line: DEFAULT_LINE_LENGTH,
            black: SearchMode::Minimax,
            white: SearchMode::Mcts,
            search: SearchArgs::default(),
        }
    }
}

/// Search parameters shared by every subcommand.
#[derive(Args, Clone)]
struct SearchArgs {
    /// Search engine: minimax (default) or mcts; selfplay uses --black/--white
    #[arg(long)]
    mode: Option<SearchMode>,
    /// Minimax plies below each root move
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    depth: u32,
    /// MCTS time budget per move in milliseconds
    #[arg(long, conflicts_with = "iterations")]
    time_ms: Option<u64>,
    /// MCTS iteration budget per move
    #[arg(long)]
    iterations: Option<usize>,
    /// UCT exploration constant
    #[arg(long, default_value_t = DEFAULT_EXPLORATION)]
    exploration: f64,
    /// Seed for reproducible MCTS playouts
    #[arg(long)]
    seed: Option<u64>,
    /// Search minimax root moves in parallel
    #[arg(long)]
    parallel: bool,
    /// Add block/extend moves around opponent lines to minimax candidates
    #[arg(long)]
    threats: bool,
}

impl Default for SearchArgs {
    fn default() -> Self {
        Self {
            mode: None,
            depth: DEFAULT_DEPTH,
            time_ms: None,
            iterations: Some(DEFAULT_ITERATIONS),
            exploration: DEFAULT_EXPLORATION,
            seed: None,
            parallel: false,
            threats: false,
        }
    }
}

impl SearchArgs {
    fn agent_config(&self, player: Player, size: usize, line: usize) -> AgentConfig {
        let minimax = MinimaxConfig::with_depth(self.depth)
            .parallel(self.parallel)
            .threat_moves(self.threats);

        let mut mcts = match (self.iterations, self.time_ms) {
            (Some(n), _) => MctsConfig::with_iterations(n),
            (None, Some(ms)) => MctsConfig::with_time(Duration::from_millis(ms)),
            (None, None) => MctsConfig::with_time(Duration::from_millis(DEFAULT_TIME_MS)),
        }
        .exploration(self.exploration);
        if let Some(seed) = self.seed {
            mcts = mcts.seed(seed);
        }

        AgentConfig::new(player)
            .with_geometry(size, line)
            .with_mode(self.mode.unwrap_or_default())
            .with_minimax(minimax)
            .with_mcts(mcts)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Move {
            board,
            player,
            line,
            search,
        }) => run_move(board, player, line, &search),
        Some(Commands::Play { size, line, search }) => {
            let config = search.agent_config(Player::A, size, line);
            config.validate().context("invalid session settings")?;
            let mut session = Session::new(config);
            let stdin = io::stdin();
            session
                .run(stdin.lock(), io::stdout())
                .context("session I/O failed")
        }
        Some(Commands::Selfplay(args)) => run_selfplay(&args),
        None => run_selfplay(&SelfplayArgs::default()),
    }
}

fn run_move(path: Option<PathBuf>, player: Player, line: usize, search: &SearchArgs) -> Result<()> {
    let text = match &path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read board from {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read board from stdin")?;
            text
        }
    };
    let board = Board::parse(&text).context("failed to parse board")?;

    if let Some(w) = winner(&board, line) {
        bail!("game is already over: {w} has {line} in a row");
    }

    let config = search.agent_config(player, board.size(), line);
    let mut agent = Agent::new(config).context("invalid search settings")?;
    match agent.choose_move(&board) {
        Some(mv) => println!("{mv}"),
        None => println!("none"),
    }
    Ok(())
}

fn run_selfplay(args: &SelfplayArgs) -> Result<()> {
    if args.search.mode.is_some() {
        bail!("selfplay picks engines with --black and --white, not --mode");
    }
    let mut black = Agent::new(
        args.search
            .agent_config(Player::A, args.size, args.line)
            .with_mode(args.black),
    )
    .context("invalid settings for X")?;
    let mut white = Agent::new(
        args.search
            .agent_config(Player::B, args.size, args.line)
            .with_mode(args.white),
    )
    .context("invalid settings for O")?;

    println!(
        "{}x{} board, {} in a row: X = {}, O = {}\n",
        args.size, args.size, args.line, args.black, args.white
    );

    let mut board = Board::new(args.size);
    let mut to_move = Player::A;
    loop {
        let agent = match to_move {
            Player::A => &mut black,
            Player::B => &mut white,
        };
        let Some(mv) = agent.choose_move(&board) else {
            println!("No moves left: draw");
            break;
        };
        board
            .place(mv, to_move)
            .with_context(|| format!("{to_move} chose an illegal move"))?;

        println!("Move {}: {to_move} plays {mv}", board.stone_count());
        println!("{}", board.labelled());

        if winner(&board, args.line) == Some(to_move) {
            println!("{to_move} wins");
            break;
        }
        to_move = to_move.opponent();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selfplay_args(argv: &[&str]) -> SelfplayArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Commands::Selfplay(args)) => args,
            _ => panic!("expected selfplay"),
        }
    }

    #[test]
    fn test_selfplay_rejects_mode() {
        let args = selfplay_args(&["gomoku-search", "selfplay", "--mode", "mcts"]);
        assert_eq!(args.search.mode, Some(SearchMode::Mcts));
        let err = run_selfplay(&args).unwrap_err();
        assert!(err.to_string().contains("--black"), "{err}");
    }

    #[test]
    fn test_mode_defaults_to_minimax() {
        let args = selfplay_args(&["gomoku-search", "selfplay", "--black", "mcts"]);
        assert_eq!(args.black, SearchMode::Mcts);
        let config = args.search.agent_config(Player::A, 9, 5);
        assert_eq!(config.mode, SearchMode::Minimax);
    }
}
