//! Bitboard 2048 engine.
//!
//! A board is 16 four-bit exponents packed into a `u64`. Cell `i = row * 4 + col`
//! lives in bits `4i..4i+4`, so row 0 is the low 16 bits and column 0 is the low
//! nibble of each row. An exponent of 0 is an empty cell; `n` is the tile `2^n`.
//!
//! Moves are table driven: every 16-bit row is collapsed once at startup (see
//! [`init`]) and whole-board moves are four lookups plus, for vertical moves, a
//! pair of transposes.
//!
//! ```
//! use tile_2048::engine::{self as GameEngine, Board, Move};
//!
//! GameEngine::init();
//! // Row 0 holds [2, 2, 4, 0].
//! let b = Board::from_exponents([1, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
//! let (moved, score) = b.execute_move(Move::Left);
//! assert_eq!(moved.tile(0, 0), 2);
//! assert_eq!(moved.tile(0, 1), 2);
//! assert_eq!(score, 4);
//! ```

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

mod ops;
mod tables;

pub use ops::{count_distinct_tiles, count_empty, execute_move, is_game_over, transpose};
pub use tables::{init, Row};

pub(crate) use ops::extract_row;
pub(crate) use tables::row_heuristic;

pub type BoardRaw = u64;
/// Tile exponent (0 = empty).
pub type Tile = u8;
pub type Score = u64;

/// Largest exponent a nibble can hold (the 32768 tile).
pub const MAX_EXPONENT: Tile = 15;
/// Exponent of the 2048 tile.
pub const WINNING_EXPONENT: Tile = 11;
/// Probability that a spawned tile is a 2 rather than a 4.
pub const SPAWN_PROBABILITY_2: f64 = 0.9;
pub const TILE_EXPONENT_LOW: Tile = 1;
pub const TILE_EXPONENT_HIGH: Tile = 2;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Move {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Move {
    /// All directions in search order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    pub fn from_u8(v: u8) -> Option<Move> {
        match v {
            0 => Some(Move::Up),
            1 => Some(Move::Down),
            2 => Some(Move::Left),
            3 => Some(Move::Right),
            _ => None,
        }
    }

    #[inline]
    pub fn is_vertical(self) -> bool { matches!(self, Move::Up | Move::Down) }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

/// A tile placed by [`Board::spawn_random_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub board: Board,
    /// Cell index, row-major.
    pub index: usize,
    pub exponent: Tile,
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Consume this `Board`, returning the raw packed `u64`.
    #[inline]
    pub fn into_raw(self) -> BoardRaw { self.0 }

    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from row-major exponents. Values above 15 are masked to 4 bits.
    pub fn from_exponents(tiles: [Tile; 16]) -> Self {
        let raw = tiles
            .iter()
            .enumerate()
            .fold(0u64, |acc, (idx, &t)| acc | (u64::from(t & 0xf) << (4 * idx)));
        Board(raw)
    }

    /// Row-major exponents.
    pub fn exponents(self) -> [Tile; 16] {
        let mut out = [0; 16];
        for (idx, slot) in out.iter_mut().enumerate() {
            *slot = self.tile_at(idx);
        }
        out
    }

    /// Exponent at a row-major cell index.
    #[inline]
    pub fn tile_at(self, idx: usize) -> Tile {
        debug_assert!(idx < 16);
        ((self.0 >> (4 * idx)) & 0xf) as Tile
    }

    /// Exponent at `(row, col)`.
    #[inline]
    pub fn tile(self, row: usize, col: usize) -> Tile { self.tile_at(row * 4 + col) }

    /// Face values (0, 2, 4, ...) as a 4x4 grid.
    pub fn grid(self) -> [[u32; 4]; 4] {
        let mut grid = [[0; 4]; 4];
        for (r, row) in grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = face_value(self.tile(r, c));
            }
        }
        grid
    }

    /// Slide/merge tiles in `dir` without inserting a new tile.
    #[inline]
    pub fn shift(self, dir: Move) -> Self { execute_move(self, dir).0 }

    /// Slide/merge tiles in `dir`, returning the new board and the points scored.
    ///
    /// The move is legal iff the returned board differs from `self`.
    #[inline]
    pub fn execute_move(self, dir: Move) -> (Self, Score) { execute_move(self, dir) }

    /// Return true if no direction changes the board.
    ///
    /// ```
    /// use tile_2048::engine::Board;
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    #[inline]
    pub fn count_empty(self) -> u32 { count_empty(self) }

    /// Number of distinct non-empty exponents on the board.
    #[inline]
    pub fn count_distinct_tiles(self) -> u32 { count_distinct_tiles(self) }

    /// Largest exponent present (0 on an empty board).
    pub fn max_exponent(self) -> Tile { self.exponents().into_iter().max().unwrap_or(0) }

    /// Highest face value on the board, e.g. 2048.
    #[inline]
    pub fn highest_tile(self) -> u32 { face_value(self.max_exponent()) }

    /// True once a 2048 tile (or larger) is present.
    #[inline]
    pub fn has_winning_tile(self) -> bool { self.max_exponent() >= WINNING_EXPONENT }

    /// Place a 2 (90%) or 4 (10%) on a uniformly chosen empty cell.
    ///
    /// Returns `None` on a full board.
    pub fn spawn_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Option<Spawn> {
        let empty = self.count_empty();
        if empty == 0 {
            return None;
        }
        let nth = rng.gen_range(0..empty) as usize;
        let exponent = if rng.gen_bool(SPAWN_PROBABILITY_2) { TILE_EXPONENT_LOW } else { TILE_EXPONENT_HIGH };
        let index = (0..16).filter(|&idx| self.tile_at(idx) == 0).nth(nth)?;
        Some(Spawn { board: Board(self.0 | (u64::from(exponent) << (4 * index))), index, exponent })
    }

    /// Like [`Board::spawn_random_tile`], returning the board unchanged when it is full.
    ///
    /// ```
    /// use tile_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        self.spawn_random_tile(rng).map_or(self, |spawn| spawn.board)
    }
}

/// Face value of an exponent (0 for an empty cell).
#[inline]
pub fn face_value(exponent: Tile) -> u32 {
    if exponent == 0 { 0 } else { 1 << exponent }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.grid();
        for (r, row) in grid.iter().enumerate() {
            if r > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.into_raw() } }

fn format_val(val: u32) -> String {
    if val == 0 { " ".repeat(7) } else { format!("{:^7}", val) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn exponents_are_row_major_from_low_bits() {
        let b = Board::from_exponents([1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(b.raw(), 0x5000_0000_0000_4321);
        assert_eq!(b.tile(0, 3), 4);
        assert_eq!(b.tile(3, 3), 5);
        assert_eq!(b.exponents()[15], 5);
    }

    #[test]
    fn grid_uses_face_values() {
        let b = Board::from_exponents([1, 0, 0, 0, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0, 15]);
        let grid = b.grid();
        assert_eq!(grid[0], [2, 0, 0, 0]);
        assert_eq!(grid[1][1], 2048);
        assert_eq!(grid[3][3], 32768);
        assert_eq!(b.highest_tile(), 32768);
        assert!(b.has_winning_tile());
    }

    #[test]
    fn spawn_fills_an_empty_cell_with_two_or_four() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Board::EMPTY;
        for filled in 1..=16 {
            let spawn = b.spawn_random_tile(&mut rng).unwrap();
            assert_eq!(b.tile_at(spawn.index), 0);
            assert!(spawn.exponent == 1 || spawn.exponent == 2);
            assert_eq!(spawn.board.tile_at(spawn.index), spawn.exponent);
            b = spawn.board;
            assert_eq!(b.count_empty(), 16 - filled);
        }
        assert!(b.spawn_random_tile(&mut rng).is_none());
        assert_eq!(b.with_random_tile(&mut rng), b);
    }

    #[test]
    fn spawn_ratio_is_roughly_nine_to_one() {
        let mut rng = StdRng::seed_from_u64(99);
        let fours = (0..10_000)
            .filter(|_| Board::EMPTY.spawn_random_tile(&mut rng).unwrap().exponent == TILE_EXPONENT_HIGH)
            .count();
        assert!((800..1200).contains(&fours), "fours = {fours}");
    }

    #[test]
    fn move_round_trips_through_u8() {
        for dir in Move::ALL {
            assert_eq!(Move::from_u8(dir as u8), Some(dir));
        }
        assert_eq!(Move::from_u8(4), None);
    }

    #[test]
    fn display_renders_four_rows() {
        let b = Board::from_exponents([1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 11]);
        let s = b.to_string();
        assert_eq!(s.lines().filter(|l| l.contains('|')).count(), 4);
        assert!(s.contains("2048"));
    }
}
