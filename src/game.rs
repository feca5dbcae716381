//! Stateful 2048 game: board, score and high score, plus the ordered events a
//! renderer needs to animate each change.
//!
//! ```
//! use tile_2048::engine::Move;
//! use tile_2048::game::{Game, GameEvent};
//!
//! let mut game = Game::seeded(42);
//! let events = game.reset();
//! assert_eq!(events[0], GameEvent::Reset);
//! assert_eq!(game.board().count_empty(), 14);
//!
//! for dir in Move::ALL {
//!     if let Some(events) = game.make_move(dir) {
//!         assert!(matches!(events.last(), Some(GameEvent::Spawn { .. })));
//!         break;
//!     }
//! }
//! ```

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::{self as GameEngine, face_value, Board, Move, Score, Tile, MAX_EXPONENT};

/// A board cell, `row` and `col` in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    #[inline]
    pub fn new(row: u8, col: u8) -> Self { Cell { row, col } }

    #[inline]
    pub fn from_index(idx: usize) -> Self { Cell { row: (idx / 4) as u8, col: (idx % 4) as u8 } }
}

/// A change for the rendering layer. Values are face values (2, 4, 8, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The board was cleared or replaced wholesale.
    Reset,
    Spawn { cell: Cell, value: u32 },
    Slide { from: Cell, to: Cell, value: u32 },
    /// Two tiles combined at `cell` into a tile of `value`.
    Merge { cell: Cell, value: u32 },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    GameOver,
}

/// Snapshot of the persisted part of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub score: Score,
}

/// One game of 2048 with its own tile spawner.
pub struct Game<R = StdRng> {
    board: Board,
    score: Score,
    high_score: Score,
    status: Status,
    rng: R,
}

impl Game<StdRng> {
    /// A new game seeded from OS entropy.
    pub fn new() -> Self { Self::with_rng(StdRng::from_entropy()) }

    /// A reproducible game.
    pub fn seeded(seed: u64) -> Self { Self::with_rng(StdRng::seed_from_u64(seed)) }
}

impl Default for Game<StdRng> { fn default() -> Self { Self::new() } }

impl<R: Rng> Game<R> {
    /// A game already dealt its two opening tiles.
    ///
    /// The deal's events are not kept; [`Game::board_events`] redraws the board.
    pub fn with_rng(rng: R) -> Self {
        GameEngine::init();
        let mut game = Game { board: Board::EMPTY, score: 0, high_score: 0, status: Status::Playing, rng };
        game.reset();
        game
    }

    /// Start over: empty board, score 0, two random tiles.
    ///
    /// Returns `[Reset, Spawn, Spawn]`. The high score is kept.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        self.board = Board::EMPTY;
        self.score = 0;
        self.status = Status::Playing;
        let mut events = vec![GameEvent::Reset];
        events.extend(self.spawn_tile());
        events.extend(self.spawn_tile());
        events
    }

    /// Apply `direction`, then spawn a tile.
    ///
    /// Returns `None` without touching any state if the move changes nothing.
    /// Otherwise returns, per line in traversal order, the slides and merges
    /// of that line, followed by exactly one spawn.
    pub fn make_move(&mut self, direction: Move) -> Option<Vec<GameEvent>> {
        let (new_board, move_score) = self.board.execute_move(direction);
        if new_board == self.board {
            return None;
        }
        let mut events = slide_events(self.board, direction);
        self.board = new_board;
        self.score += move_score;
        self.high_score = self.high_score.max(self.score);
        events.extend(self.spawn_tile());
        Some(events)
    }

    /// Emits [`GameEvent::GameOver`] the first time the board is found to have no legal move.
    pub fn check_game_over(&mut self) -> Option<GameEvent> {
        if self.status == Status::GameOver || !self.board.is_game_over() {
            return None;
        }
        self.status = Status::GameOver;
        info!("game over: score {} highest tile {}", self.score, self.board.highest_tile());
        Some(GameEvent::GameOver)
    }

    /// True iff no direction changes the board.
    ///
    /// Pure query; the status change and its event come from [`Game::check_game_over`].
    pub fn is_game_over(&self) -> bool { self.status == Status::GameOver || self.board.is_game_over() }

    /// Replace the board and score. Never lowers the high score.
    pub fn load_state(&mut self, state: GameState) -> Vec<GameEvent> {
        self.board = state.board;
        self.score = state.score;
        self.high_score = self.high_score.max(state.score);
        self.status = Status::Playing;
        vec![GameEvent::Reset]
    }

    /// `Reset` followed by one `Spawn` per tile in cell order: everything a
    /// renderer needs to draw the current board from scratch.
    pub fn board_events(&self) -> Vec<GameEvent> {
        let mut events = vec![GameEvent::Reset];
        for (idx, exponent) in self.board.exponents().into_iter().enumerate() {
            if exponent != 0 {
                events.push(GameEvent::Spawn { cell: Cell::from_index(idx), value: face_value(exponent) });
            }
        }
        events
    }

    #[inline]
    pub fn state(&self) -> GameState { GameState { board: self.board, score: self.score } }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    #[inline]
    pub fn grid(&self) -> [[u32; 4]; 4] { self.board.grid() }

    #[inline]
    pub fn score(&self) -> Score { self.score }

    #[inline]
    pub fn high_score(&self) -> Score { self.high_score }

    /// Raise the high score (e.g. from storage). Lower values are ignored.
    pub fn raise_high_score(&mut self, score: Score) { self.high_score = self.high_score.max(score); }

    #[inline]
    pub fn status(&self) -> Status { self.status }

    /// True once a 2048 tile has been made. Play may continue.
    #[inline]
    pub fn has_won(&self) -> bool { self.board.has_winning_tile() }

    fn spawn_tile(&mut self) -> Option<GameEvent> {
        let spawn = self.board.spawn_random_tile(&mut self.rng)?;
        self.board = spawn.board;
        Some(GameEvent::Spawn { cell: Cell::from_index(spawn.index), value: face_value(spawn.exponent) })
    }
}

/// Cell holding position `idx` of `line` once tiles are packed toward `dir`.
fn line_cell(dir: Move, line: usize, idx: usize) -> Cell {
    let (row, col) = match dir {
        Move::Left => (line, idx),
        Move::Right => (line, 3 - idx),
        Move::Up => (idx, line),
        Move::Down => (3 - idx, line),
    };
    Cell::new(row as u8, col as u8)
}

/// Replays a move tile by tile to describe where each tile goes.
fn slide_events(board: Board, dir: Move) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for line in 0..4 {
        // (exponent, already merged) of tiles settled so far in this line
        let mut settled: Vec<(Tile, bool)> = Vec::with_capacity(4);
        for pos in 0..4 {
            let from = line_cell(dir, line, pos);
            let exponent = board.tile(from.row as usize, from.col as usize);
            if exponent == 0 {
                continue;
            }
            let value = face_value(exponent);
            let mergeable = matches!(
                settled.last(),
                Some(&(last, merged)) if last == exponent && !merged && exponent < MAX_EXPONENT
            );
            if mergeable {
                let dest = settled.len() - 1;
                settled[dest] = (exponent + 1, true);
                let to = line_cell(dir, line, dest);
                events.push(GameEvent::Slide { from, to, value });
                events.push(GameEvent::Merge { cell: to, value: face_value(exponent + 1) });
            } else {
                settled.push((exponent, false));
                let dest = settled.len() - 1;
                if dest != pos {
                    events.push(GameEvent::Slide { from, to: line_cell(dir, line, dest), value });
                }
            }
        }
    }
    events
}
