//! Saved game and high score on disk.
//!
//! The board is written as a decimal string so the full 64 bits survive JSON
//! readers that parse numbers as doubles. The high score lives in its own
//! file and is only ever raised.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{Board, Score};
use crate::game::{Game, GameEvent, GameState};

const STATE_FILE: &str = "game-state.json";
const HIGH_SCORE_FILE: &str = "high-score";

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid board encoding: {0:?}")]
    InvalidBoard(String),
    #[error("invalid high score: {0:?}")]
    InvalidHighScore(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedGame {
    board: String,
    score: Score,
}

/// Encode a board as a decimal string.
pub fn encode_board(board: Board) -> String { board.raw().to_string() }

/// Parse a board from a decimal or `0x`-prefixed hexadecimal string.
pub fn parse_board(s: &str) -> Result<Board, SaveError> {
    let trimmed = s.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map(Board::from_raw).map_err(|_| SaveError::InvalidBoard(s.to_string()))
}

/// Directory-backed store for one saved game plus the high score.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    fn state_path(&self) -> PathBuf { self.dir.join(STATE_FILE) }

    fn high_score_path(&self) -> PathBuf { self.dir.join(HIGH_SCORE_FILE) }

    pub fn save(&self, state: &GameState) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir)?;
        let saved = SavedGame { board: encode_board(state.board), score: state.score };
        fs::write(self.state_path(), serde_json::to_string(&saved)?)?;
        Ok(())
    }

    /// The saved game, `Ok(None)` if there is none.
    pub fn load(&self) -> Result<Option<GameState>, SaveError> {
        let data = match fs::read_to_string(self.state_path()) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let saved: SavedGame = serde_json::from_str(&data)?;
        Ok(Some(GameState { board: parse_board(&saved.board)?, score: saved.score }))
    }

    /// Remove the saved game. Missing files are fine.
    pub fn clear(&self) -> Result<(), SaveError> {
        match fs::remove_file(self.state_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub fn save_high_score(&self, score: Score) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.high_score_path(), score.to_string())?;
        Ok(())
    }

    /// Stored high score, 0 if none was saved.
    pub fn load_high_score(&self) -> Result<Score, SaveError> {
        match fs::read_to_string(self.high_score_path()) {
            Ok(data) => data.trim().parse::<Score>().map_err(|_| SaveError::InvalidHighScore(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Raise `game`'s high score to the stored one. A malformed file is logged and ignored.
    pub fn restore_high_score<R: Rng>(&self, game: &mut Game<R>) {
        match self.load_high_score() {
            Ok(high_score) => game.raise_high_score(high_score),
            Err(e) => warn!("ignoring high score in {}: {e}", self.dir.display()),
        }
    }

    /// Restore the high score and the saved game into `game`, or deal a new one.
    ///
    /// A malformed save is logged, removed and replaced by a fresh game.
    pub fn resume<R: Rng>(&self, game: &mut Game<R>) -> Vec<GameEvent> {
        self.restore_high_score(game);
        match self.load() {
            Ok(Some(state)) => {
                info!("resuming saved game with score {}", state.score);
                game.load_state(state)
            }
            Ok(None) => game.reset(),
            Err(e) => {
                warn!("discarding saved game in {}: {e}", self.dir.display());
                if let Err(e) = self.clear() {
                    warn!("could not remove saved game: {e}");
                }
                game.reset()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn keeps_full_64_bit_boards() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        // well past 2^53
        let state = GameState { board: Board::from_raw(0xfedc_ba98_7654_3211), score: 123_456 };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));

        let raw = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        assert!(raw.contains("\"18364758544493064721\""), "{raw}");
    }

    #[test]
    fn missing_save_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.load_high_score().unwrap(), 0);
        store.clear().unwrap();
    }

    #[test]
    fn parse_board_accepts_decimal_and_hex() {
        assert_eq!(parse_board("4660").unwrap(), Board::from_raw(0x1234));
        assert_eq!(parse_board("0x1234").unwrap(), Board::from_raw(0x1234));
        assert_eq!(parse_board(" 18446744073709551615 ").unwrap(), Board::from_raw(u64::MAX));
        assert!(matches!(parse_board("12.5"), Err(SaveError::InvalidBoard(_))));
        assert!(matches!(parse_board("18446744073709551616"), Err(SaveError::InvalidBoard(_))));
    }

    #[test]
    fn malformed_saves_are_errors() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        let path = dir.path().join(STATE_FILE);
        for bad in [
            "not json",
            r#"{"board": "17"}"#,
            r#"{"board": "17", "score": "lots"}"#,
            r#"{"board": 17, "score": 3}"#,
            r#"{"board": "xyz", "score": 3}"#,
        ] {
            fs::write(&path, bad).unwrap();
            assert!(store.load().is_err(), "{bad}");
        }
    }

    #[test]
    fn resume_restores_saved_game_and_high_score() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        let state = GameState { board: Board::from_raw(0x0021_0000_0000_0012), score: 64 };
        store.save(&state).unwrap();
        store.save_high_score(1000).unwrap();

        let mut game = Game::seeded(5);
        let events = store.resume(&mut game);
        assert_eq!(events, vec![GameEvent::Reset]);
        assert_eq!(game.state(), state);
        assert_eq!(game.high_score(), 1000);
    }

    #[test]
    fn resume_discards_malformed_save() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        fs::write(dir.path().join(STATE_FILE), r#"{"board": "1", "score": "NaN"}"#).unwrap();
        fs::write(dir.path().join(HIGH_SCORE_FILE), "oops").unwrap();

        let mut game = Game::seeded(5);
        let events = store.resume(&mut game);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], GameEvent::Reset);
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().count_empty(), 14);
        assert!(!dir.path().join(STATE_FILE).exists());
    }

    #[test]
    fn malformed_high_score_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        fs::write(dir.path().join(HIGH_SCORE_FILE), "-3").unwrap();
        assert!(matches!(store.load_high_score(), Err(SaveError::InvalidHighScore(_))));

        let mut game = Game::seeded(8);
        game.raise_high_score(77);
        store.restore_high_score(&mut game);
        assert_eq!(game.high_score(), 77);

        store.save_high_score(300).unwrap();
        store.restore_high_score(&mut game);
        assert_eq!(game.high_score(), 300);
    }

    #[test]
    fn high_score_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        store.save_high_score(20_480).unwrap();
        assert_eq!(store.load_high_score().unwrap(), 20_480);
    }
}
