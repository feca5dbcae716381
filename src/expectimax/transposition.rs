use std::collections::HashMap;

use ahash::RandomState as AHasher;
use log::info;

use crate::engine::Board;

/// Best move-node score found for a board at a given remaining depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranspositionEntry {
    pub depth: u64,
    pub score: f64,
}

/// Exact-board memo table for move nodes.
///
/// Keys are whole boards, so entries never go stale. Growth is bounded by
/// flushing the entire table when a new board arrives at capacity.
pub struct TranspositionTable {
    map: HashMap<Board, TranspositionEntry, AHasher>,
    capacity: usize,
}

impl TranspositionTable {
    pub const DEFAULT_CAPACITY: usize = 500_000;

    pub fn new() -> Self { Self::with_capacity(Self::DEFAULT_CAPACITY) }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { map: HashMap::with_hasher(AHasher::new()), capacity: capacity.max(1) }
    }

    #[inline]
    pub fn get(&self, board: Board) -> Option<TranspositionEntry> { self.map.get(&board).copied() }

    /// Cached score for `board` if it was searched at least `depth` deep.
    #[inline]
    pub fn probe(&self, board: Board, depth: u64) -> Option<f64> {
        self.map.get(&board).filter(|entry| entry.depth >= depth).map(|entry| entry.score)
    }

    /// Insert or overwrite the entry for `board`.
    ///
    /// Writing a new board into a full table clears it first.
    pub fn put(&mut self, board: Board, depth: u64, score: f64) {
        if self.map.len() >= self.capacity && !self.map.contains_key(&board) {
            info!("transposition table reached {} entries; flushing", self.map.len());
            self.map.clear();
        }
        self.map.insert(board, TranspositionEntry { depth, score });
    }

    #[inline]
    pub fn len(&self) -> usize { self.map.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    #[inline]
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn clear(&mut self) { self.map.clear(); }
}

impl Default for TranspositionTable { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_only_reuses_deeper_or_equal_work() {
        let mut tt = TranspositionTable::new();
        let b = Board::from_raw(0x1234);
        tt.put(b, 3, 42.0);
        assert_eq!(tt.probe(b, 2), Some(42.0));
        assert_eq!(tt.probe(b, 3), Some(42.0));
        assert_eq!(tt.probe(b, 4), None);
        assert_eq!(tt.get(b), Some(TranspositionEntry { depth: 3, score: 42.0 }));
        assert_eq!(tt.get(Board::from_raw(0x4321)), None);
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let mut tt = TranspositionTable::new();
        let b = Board::from_raw(7);
        tt.put(b, 5, 1.0);
        tt.put(b, 2, 9.0);
        assert_eq!(tt.len(), 1);
        assert_eq!(tt.get(b), Some(TranspositionEntry { depth: 2, score: 9.0 }));
    }

    #[test]
    fn flushes_everything_past_capacity() {
        let mut tt = TranspositionTable::with_capacity(3);
        for raw in 1..=3u64 {
            tt.put(Board::from_raw(raw), 1, raw as f64);
        }
        assert_eq!(tt.len(), 3);
        // rewriting a present key is not growth
        tt.put(Board::from_raw(2), 4, 0.5);
        assert_eq!(tt.len(), 3);

        tt.put(Board::from_raw(4), 1, 4.0);
        assert_eq!(tt.len(), 1);
        assert!(tt.get(Board::from_raw(4)).is_some());
        assert!(tt.get(Board::from_raw(1)).is_none());
    }

    #[test]
    fn default_capacity_keeps_only_the_newest_entry_after_flush() {
        let mut tt = TranspositionTable::new();
        for raw in 0..500_000u64 {
            tt.put(Board::from_raw(raw), 1, 0.0);
        }
        assert_eq!(tt.len(), 500_000);
        let newest = Board::from_raw(u64::MAX);
        tt.put(newest, 2, 1.5);
        assert_eq!(tt.len(), 1);
        assert_eq!(tt.get(newest), Some(TranspositionEntry { depth: 2, score: 1.5 }));
    }
}
