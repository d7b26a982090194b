//! Square N-in-a-row board, move coordinates, and the rules primitives.
//!
//! Cells hold `Option<Player>`; the numeric encoding used by callers
//! (`0` empty, `+1` player A, `-1` player B) is available through
//! [`Player::value`] and [`Board::from_values`].

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::constants::{LINE_DIRECTIONS, MAX_BOARD_SIZE};
use crate::error::{Error, MoveError, Result};

/// One of the two sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    /// Plays first, `X`, encoded as `+1`.
    A,
    /// Plays second, `O`, encoded as `-1`.
    B,
}

impl Player {
    /// The other side. This is the only place the opponent is derived.
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// Signed cell value: `+1` for A, `-1` for B.
    #[inline]
    pub fn value(self) -> i8 {
        match self {
            Player::A => 1,
            Player::B => -1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            1 => Some(Player::A),
            -1 => Some(Player::B),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::A => 'X',
            Player::B => 'O',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'X' | 'x' => Some(Player::A),
            'O' | 'o' => Some(Player::B),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Player {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "black" | "1" | "+1" => Ok(Player::A),
            "o" | "white" | "-1" => Ok(Player::B),
            other => Err(Error::InvalidConfig(format!("unknown player '{other}'"))),
        }
    }
}

/// A board coordinate. Ordering is row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Step `k` times along `(dr, dc)`, or `None` if that leaves a `size`-board.
    #[inline]
    pub fn offset(self, dr: isize, dc: isize, k: isize, size: usize) -> Option<Move> {
        let r = self.row as isize + dr * k;
        let c = self.col as isize + dc * k;
        if r < 0 || c < 0 || r >= size as isize || c >= size as isize {
            return None;
        }
        Some(Move::new(r as usize, c as usize))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = (b'A' + (self.col % MAX_BOARD_SIZE) as u8) as char;
        write!(f, "{}{}", letter, self.row + 1)
    }
}

/// Parse a coordinate such as `H8` (column letter, 1-based row).
///
/// Returns `None` for anything malformed. Bounds are not checked here.
pub fn parse_coord(s: &str) -> Option<Move> {
    let s = s.trim();
    let mut chars = s.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() {
        return None;
    }
    let row: usize = chars.as_str().parse().ok()?;
    if row == 0 {
        return None;
    }
    Some(Move::new(row - 1, (letter as u8 - b'A') as usize))
}

/// A square grid of stones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Player>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn idx(&self, mv: Move) -> usize {
        mv.row * self.size + mv.col
    }

    #[inline]
    pub fn in_bounds(&self, mv: Move) -> bool {
        mv.row < self.size && mv.col < self.size
    }

    /// Occupant of `mv`; `None` for empty or off-board points.
    #[inline]
    pub fn get(&self, mv: Move) -> Option<Player> {
        if !self.in_bounds(mv) {
            return None;
        }
        self.cells[self.idx(mv)]
    }

    #[inline]
    pub fn is_empty_at(&self, mv: Move) -> bool {
        self.in_bounds(mv) && self.cells[self.idx(mv)].is_none()
    }

    /// Place a stone, rejecting off-board and occupied points.
    pub fn place(&mut self, mv: Move, player: Player) -> Result<()> {
        self.validate_move(mv)?;
        let idx = self.idx(mv);
        self.cells[idx] = Some(player);
        Ok(())
    }

    /// `Ok` if `mv` is an empty point on the board, else the reason it is not.
    pub fn validate_move(&self, mv: Move) -> Result<()> {
        if !self.in_bounds(mv) {
            return Err(Error::InvalidMove {
                mv,
                reason: MoveError::OutOfBounds,
            });
        }
        if self.cells[self.idx(mv)].is_some() {
            return Err(Error::InvalidMove {
                mv,
                reason: MoveError::Occupied,
            });
        }
        Ok(())
    }

    /// Clear a point, returning what was there.
    pub fn remove(&mut self, mv: Move) -> Option<Player> {
        if !self.in_bounds(mv) {
            return None;
        }
        let idx = self.idx(mv);
        self.cells[idx].take()
    }

    /// Place a stone for the lifetime of the returned guard.
    ///
    /// The point is cleared again when the guard drops, whichever way the
    /// caller leaves its scope. Returns `None` if `mv` is not legal.
    pub fn scoped(&mut self, mv: Move, player: Player) -> Option<ScopedStone<'_>> {
        self.place(mv, player).ok()?;
        Some(ScopedStone { board: self, mv })
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// True when no stone has been played.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// The centre point (upper-left of the centre for even sizes).
    pub fn centre(&self) -> Move {
        let c = self.size.saturating_sub(1) / 2;
        Move::new(c, c)
    }

    /// Empty points in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Move> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(move |(i, _)| Move::new(i / size, i % size))
    }

    /// Occupied points and their owners in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Move, Player)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|p| (Move::new(i / size, i % size), p)))
    }

    /// Count consecutive `player` stones from `mv` (exclusive) along `(dr, dc)`.
    #[inline]
    pub fn count_direction(&self, mv: Move, player: Player, dr: isize, dc: isize) -> usize {
        let mut count = 0;
        let mut k = 1;
        while let Some(next) = mv.offset(dr, dc, k, self.size) {
            if self.get(next) != Some(player) {
                break;
            }
            count += 1;
            k += 1;
        }
        count
    }

    /// Length of the `player` run through `mv` along an axis, counting `mv`
    /// itself as a `player` stone.
    #[inline]
    pub fn run_through(&self, mv: Move, player: Player, dr: isize, dc: isize) -> usize {
        1 + self.count_direction(mv, player, dr, dc) + self.count_direction(mv, player, -dr, -dc)
    }

    /// Would a `player` stone on `mv` make a run of at least `line_length`?
    pub fn completes_line(&self, mv: Move, player: Player, line_length: usize) -> bool {
        LINE_DIRECTIONS
            .iter()
            .any(|&(dr, dc)| self.run_through(mv, player, dr, dc) >= line_length)
    }

    /// Build a board from rows of `0 / +1 / -1` values.
    pub fn from_values(rows: &[Vec<i8>]) -> Result<Self> {
        let size = rows.len();
        let mut board = Board::new(size);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(Error::BoardParse {
                    line: r + 1,
                    message: format!("expected {size} cells, got {}", row.len()),
                });
            }
            for (c, &v) in row.iter().enumerate() {
                if v == 0 {
                    continue;
                }
                let player = Player::from_value(v).ok_or_else(|| Error::BoardParse {
                    line: r + 1,
                    message: format!("invalid cell value {v}"),
                })?;
                board.cells[r * size + c] = Some(player);
            }
        }
        Ok(board)
    }

    /// Parse the text format written by `Display`: one row per line,
    /// `.` / `X` / `O` cells, whitespace ignored, `#` comment lines skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows: Vec<(usize, Vec<i8>)> = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut row = Vec::new();
            for ch in line.chars().filter(|c| !c.is_whitespace()) {
                let v = match ch {
                    '.' | '_' | '0' => 0,
                    other => match Player::from_symbol(other) {
                        Some(p) => p.value(),
                        None => {
                            return Err(Error::BoardParse {
                                line: n + 1,
                                message: format!("unexpected character '{other}'"),
                            });
                        }
                    },
                };
                row.push(v);
            }
            rows.push((n + 1, row));
        }

        if rows.is_empty() {
            return Err(Error::BoardParse {
                line: 0,
                message: "no rows".to_string(),
            });
        }
        if rows.len() > MAX_BOARD_SIZE {
            return Err(Error::BoardParse {
                line: rows[MAX_BOARD_SIZE].0,
                message: format!("board larger than {MAX_BOARD_SIZE}x{MAX_BOARD_SIZE}"),
            });
        }
        let size = rows.len();
        if let Some((line, row)) = rows.iter().find(|(_, row)| row.len() != size) {
            return Err(Error::BoardParse {
                line: *line,
                message: format!("board is not square: expected {size} cells, got {}", row.len()),
            });
        }
        let values: Vec<Vec<i8>> = rows.into_iter().map(|(_, row)| row).collect();
        Board::from_values(&values)
    }

    /// Human-facing rendering with column letters and row numbers.
    pub fn labelled(&self) -> String {
        let mut out = String::from("   ");
        for c in 0..self.size {
            out.push((b'A' + c as u8) as char);
            out.push(' ');
        }
        out.push('\n');
        for r in 0..self.size {
            out.push_str(&format!("{:>2} ", r + 1));
            for c in 0..self.size {
                out.push(cell_char(self.get(Move::new(r, c))));
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

fn cell_char(cell: Option<Player>) -> char {
    cell.map_or('.', Player::symbol)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            for c in 0..self.size {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", cell_char(self.get(Move::new(r, c))))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A stone placed by [`Board::scoped`]; removed again on drop.
pub struct ScopedStone<'a> {
    board: &'a mut Board,
    mv: Move,
}

impl Deref for ScopedStone<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl Drop for ScopedStone<'_> {
    fn drop(&mut self) {
        self.board.remove(self.mv);
    }
}

/// True iff `mv` is on the board and empty.
#[inline]
pub fn legal(board: &Board, mv: Move) -> bool {
    board.is_empty_at(mv)
}

/// True iff `player` owns `line_length` consecutive cells in a row, column or diagonal.
pub fn has_won(player: Player, board: &Board, line_length: usize) -> bool {
    if line_length == 0 {
        return false;
    }
    board.stones().any(|(mv, owner)| {
        owner == player
            && LINE_DIRECTIONS.iter().any(|&(dr, dc)| {
                // only start counting at the first stone of a run
                let behind = mv.offset(dr, dc, -1, board.size());
                if behind.and_then(|b| board.get(b)) == Some(player) {
                    return false;
                }
                1 + board.count_direction(mv, player, dr, dc) >= line_length
            })
    })
}

/// The side holding a completed line, if any.
pub fn winner(board: &Board, line_length: usize) -> Option<Player> {
    [Player::A, Player::B]
        .into_iter()
        .find(|&p| has_won(p, board, line_length))
}
