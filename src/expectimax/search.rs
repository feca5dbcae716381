use std::time::Instant;

use log::debug;

use crate::engine::{Board, Move, SPAWN_PROBABILITY_2, TILE_EXPONENT_HIGH, TILE_EXPONENT_LOW};

use super::heuristic::heuristic_value;
use super::transposition::TranspositionTable;
use super::{warm_engine, ExpectimaxConfig, SearchStats};

const SPAWN_PROBABILITY_4: f64 = 1.0 - SPAWN_PROBABILITY_2;

/// Single-threaded iterative-deepening Expectimax.
///
/// Keeps one transposition table across calls; callers must not run two
/// searches on the same instance at once.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    cache: TranspositionTable,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        warm_engine();
        let cache = TranspositionTable::with_capacity(cfg.cache_capacity);
        Self { cfg, cache, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Equivalent to [`Self::best_move`].
    #[inline]
    pub fn get_next_move(&mut self, board: Board) -> Option<Move> { self.best_move(board) }

    /// Pick a direction for `board`, or `None` when no move is legal.
    ///
    /// Depth levels run from 1 up to the target depth; each completed level
    /// replaces the answer. The time budget is checked only after a level
    /// completes, so one level may overrun it.
    ///
    /// ```
    /// use tile_2048::engine::Board;
    /// use tile_2048::expectimax::Expectimax;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// let mut ex = Expectimax::new();
    /// assert!(ex.best_move(b).is_some());
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let target_depth = self.target_depth(board);
        let start = Instant::now();
        let mut state = SearchState::new(&mut self.cache, self.cfg.prob_cutoff);
        let mut best = None;
        let mut depth_reached = 0;

        for depth in 1..=target_depth {
            let mut level_best: Option<(Move, f64)> = None;
            for dir in Move::ALL {
                let new_board = board.shift(dir);
                if new_board == board {
                    continue;
                }
                let score = state.score_chance_node(new_board, depth, 1.0);
                if level_best.map_or(true, |(_, best_score)| score > best_score) {
                    level_best = Some((dir, score));
                }
            }
            match level_best {
                Some((dir, _)) => best = Some(dir),
                // legality doesn't depend on depth
                None => break,
            }
            depth_reached = depth;
            if start.elapsed() > self.cfg.time_budget {
                break;
            }
        }

        let nodes = state.nodes;
        self.stats = SearchStats {
            nodes,
            peak_nodes: self.stats.peak_nodes.max(nodes),
            target_depth,
            depth_reached,
            elapsed: start.elapsed(),
            cache_entries: self.cache.len(),
        };
        debug!(
            "search {:?}: move={:?} depth={}/{} nodes={} cache={} in {:?}",
            board, best, depth_reached, target_depth, nodes, self.stats.cache_entries, self.stats.elapsed
        );
        best
    }

    /// Later boards (more distinct tiles) get deeper searches.
    #[inline]
    pub fn target_depth(&self, board: Board) -> u64 {
        let distinct = u64::from(board.count_distinct_tiles());
        distinct.saturating_sub(2).max(self.cfg.min_depth).min(self.cfg.depth_cap)
    }

    /// Statistics collected from the last call to [`Self::best_move`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    #[inline]
    pub fn cache_len(&self) -> usize { self.cache.len() }

    pub fn clear_cache(&mut self) { self.cache.clear(); }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }

/// Per-search context: the shared table plus the pruning threshold.
struct SearchState<'a> {
    cache: &'a mut TranspositionTable,
    prob_cutoff: f32,
    nodes: u64,
}

impl<'a> SearchState<'a> {
    fn new(cache: &'a mut TranspositionTable, prob_cutoff: f32) -> Self {
        Self { cache, prob_cutoff, nodes: 0 }
    }

    /// Player to move: best direction's expected score. Only these nodes touch the cache.
    fn score_move_node(&mut self, board: Board, depth: u64, cum_prob: f32) -> f64 {
        self.nodes += 1;
        if depth == 0 || cum_prob < self.prob_cutoff {
            return heuristic_value(board);
        }
        if let Some(score) = self.cache.probe(board, depth) {
            return score;
        }
        let mut best_score: Option<f64> = None;
        for dir in Move::ALL {
            let new_board = board.shift(dir);
            if new_board != board {
                let score = self.score_chance_node(new_board, depth, cum_prob);
                best_score = Some(best_score.map_or(score, |best| best.max(score)));
            }
        }
        match best_score {
            // lost position; never cached
            None => 0.0,
            Some(score) => {
                self.cache.put(board, depth, score);
                score
            }
        }
    }

    /// Tile spawn: expectation over every empty cell and both tile values.
    fn score_chance_node(&mut self, board: Board, depth: u64, cum_prob: f32) -> f64 {
        self.nodes += 1;
        let num_empty_tiles = board.count_empty();
        if num_empty_tiles == 0 {
            return 0.0;
        }
        let cell_prob = cum_prob / num_empty_tiles as f32;
        if cell_prob < self.prob_cutoff {
            return heuristic_value(board);
        }

        let mut tiles_searched = 0;
        let mut tmp = board.raw();
        let mut insert_tile: u64 = 1;
        let mut score = 0.0;
        while tiles_searched < num_empty_tiles {
            if (tmp & 0xf) == 0 {
                let board2 = Board::from_raw(board.raw() | insert_tile * u64::from(TILE_EXPONENT_LOW));
                score += self.score_move_node(board2, depth - 1, cell_prob * SPAWN_PROBABILITY_2 as f32)
                    * SPAWN_PROBABILITY_2;
                let board4 = Board::from_raw(board.raw() | insert_tile * u64::from(TILE_EXPONENT_HIGH));
                score += self.score_move_node(board4, depth - 1, cell_prob * SPAWN_PROBABILITY_4 as f32)
                    * SPAWN_PROBABILITY_4;
                tiles_searched += 1;
            }
            tmp >>= 4;
            insert_tile <<= 4;
        }
        score / f64::from(num_empty_tiles)
    }
}
