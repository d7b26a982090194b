//! Line-oriented text protocol for playing against the engine.
//!
//! The command loop follows the shape of the Go Text Protocol: every
//! request is one line, optionally prefixed by a numeric id, and every
//! response is `=[id] text` on success or `?[id] message` on failure,
//! followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name` / `version` - engine identification
//! - `list_commands` / `known_command <cmd>`
//! - `boardsize <n>` - resize and clear the board
//! - `linelength <n>` - stones in a row needed to win
//! - `clear_board` - reset the board to empty
//! - `play <x|o> <coord>` - place a stone (e.g. `play x H8`)
//! - `genmove <x|o>` - search, play and print the engine's move
//! - `showboard` - print the current position
//! - `winner` - `x`, `o` or `none`
//! - `quit`
//!
//! ## Example
//!
//! ```no_run
//! use gomoku_search::agent::AgentConfig;
//! use gomoku_search::session::Session;
//!
//! let mut session = Session::new(AgentConfig::default());
//! let stdin = std::io::stdin();
//! session.run(stdin.lock(), std::io::stdout()).unwrap();
//! ```

use std::io::{self, BufRead, Write};

use crate::agent::{Agent, AgentConfig};
use crate::board::{Board, Player, parse_coord, winner};
use crate::constants::MAX_BOARD_SIZE;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "genmove",
    "known_command",
    "linelength",
    "list_commands",
    "name",
    "play",
    "quit",
    "showboard",
    "version",
    "winner",
];

/// Session state: the shared board plus the settings used to build agents.
pub struct Session {
    board: Board,
    /// Template for `genmove`; the player is filled in per request.
    agent: AgentConfig,
}

impl Session {
    pub fn new(agent: AgentConfig) -> Self {
        Self {
            board: Board::new(agent.board_size),
            agent,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric command id from the start of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end == 0 {
            return (None, trimmed);
        }
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute one command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "boardsize" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<usize>() {
                    Ok(size) if (1..=MAX_BOARD_SIZE).contains(&size) => {
                        if self.agent.line_length > size {
                            return (
                                false,
                                format!("board size {size} is shorter than the line length"),
                            );
                        }
                        self.agent.board_size = size;
                        self.board = Board::new(size);
                        (true, String::new())
                    }
                    Ok(size) => (
                        false,
                        format!("unacceptable size {size}, expected 1 to {MAX_BOARD_SIZE}"),
                    ),
                    Err(_) => (false, "invalid size".to_string()),
                }
            }

            "linelength" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= self.board.size() => {
                        self.agent.line_length = n;
                        (true, String::new())
                    }
                    _ => (false, "invalid line length".to_string()),
                }
            }

            "clear_board" => {
                self.board = Board::new(self.agent.board_size);
                (true, String::new())
            }

            "play" => {
                let [color, vertex, ..] = args else {
                    return (false, "missing arguments".to_string());
                };
                let player = match color.parse::<Player>() {
                    Ok(p) => p,
                    Err(_) => return (false, format!("invalid color: {color}")),
                };
                let Some(mv) = parse_coord(vertex) else {
                    return (false, format!("invalid coordinate: {vertex}"));
                };
                match self.board.place(mv, player) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                let Some(color) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let player = match color.parse::<Player>() {
                    Ok(p) => p,
                    Err(_) => return (false, format!("invalid color: {color}")),
                };
                if winner(&self.board, self.agent.line_length).is_some() {
                    return (true, "none".to_string());
                }

                let config = self.agent.clone().with_player(player);
                let mut agent = match Agent::new(config) {
                    Ok(agent) => agent,
                    Err(e) => return (false, e.to_string()),
                };
                let Some(mv) = agent.choose_move(&self.board) else {
                    return (true, "none".to_string());
                };
                match self.board.place(mv, player) {
                    Ok(()) => (true, mv.to_string()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "showboard" => (true, format!("\n{}", self.board.labelled())),

            "winner" => {
                let w = winner(&self.board, self.agent.line_length);
                (true, w.map_or("none".to_string(), |p| p.symbol().to_ascii_lowercase().to_string()))
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::MctsConfig;
    use crate::minimax::MinimaxConfig;

    fn small_session() -> Session {
        let config = AgentConfig::default()
            .with_geometry(7, 4)
            .with_minimax(MinimaxConfig::with_depth(1))
            .with_mcts(MctsConfig::with_iterations(50).seed(1));
        Session::new(config)
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = Session::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = Session::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut session = small_session();
        let (success, response) = session.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "gomoku-search");
    }

    #[test]
    fn test_known_command() {
        let mut session = small_session();

        let (success, response) = session.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = session.execute("known_command", &["komi"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_boardsize() {
        let mut session = small_session();

        let (success, _) = session.execute("boardsize", &["9"]);
        assert!(success);
        assert_eq!(session.board().size(), 9);

        // shorter than the line length
        let (success, _) = session.execute("boardsize", &["3"]);
        assert!(!success);

        let (success, _) = session.execute("boardsize", &["40"]);
        assert!(!success);
    }

    #[test]
    fn test_play_rejects_illegal_moves() {
        let mut session = small_session();

        let (success, _) = session.execute("play", &["x", "D4"]);
        assert!(success);

        let (success, response) = session.execute("play", &["o", "D4"]);
        assert!(!success);
        assert!(response.contains("not empty"), "{response}");

        let (success, _) = session.execute("play", &["o", "Z9"]);
        assert!(!success);

        let (success, _) = session.execute("play", &["green", "A1"]);
        assert!(!success);
    }

    #[test]
    fn test_genmove_plays_on_board() {
        let mut session = small_session();
        session.execute("play", &["x", "D4"]);

        let (success, response) = session.execute("genmove", &["o"]);
        assert!(success);
        let mv = parse_coord(&response).unwrap();
        assert_eq!(session.board().get(mv), Some(Player::B));
        assert_eq!(session.board().stone_count(), 2);
    }

    #[test]
    fn test_winner_and_clear() {
        let mut session = small_session();
        for v in ["A1", "B1", "C1", "D1"] {
            session.execute("play", &["o", v]);
        }
        assert_eq!(session.execute("winner", &[]), (true, "o".to_string()));
        assert_eq!(session.execute("genmove", &["x"]), (true, "none".to_string()));

        let (success, _) = session.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(session.board().stone_count(), 0);
        assert_eq!(session.execute("winner", &[]), (true, "none".to_string()));
    }

    #[test]
    fn test_run_formats_responses() {
        let mut session = small_session();
        let input = "# comment\n1 name\n\nplay x A1\n2 play o A1\nquit\nname\n";
        let mut output = Vec::new();
        session.run(input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let responses: Vec<&str> = text.split("\n\n").filter(|s| !s.is_empty()).collect();
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0], "=1 gomoku-search");
        assert_eq!(responses[1], "= ");
        assert!(responses[2].starts_with("?2 illegal move A1"), "{}", responses[2]);
        assert_eq!(responses[3], "= ");
    }
}
