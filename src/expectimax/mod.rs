//! Expectimax search policy for 2048.
//!
//! [`Expectimax`] alternates move nodes (the player picks the best direction)
//! with chance nodes (a 2 or 4 lands on a uniformly chosen empty cell). The
//! search deepens one level at a time until the target depth is reached or the
//! soft time budget is spent, prunes branches whose cumulative probability is
//! negligible, and memoizes move nodes in a [`TranspositionTable`] that lives as
//! long as the policy.
//!
//! Notes
//! - Row tables are built lazily; the constructors warm them for you.
//! - The search is deterministic for a given depth. Wall-clock time only
//!   decides how many depth levels complete.
//!
//! Quick start
//! ```
//! use tile_2048::engine::Board;
//! use tile_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//!
//! let mut ex = Expectimax::new();
//! let m = ex.best_move(b0);
//! assert!(m.is_some());
//! ```

use std::time::Duration;

use crate::engine;

mod heuristic;
mod search;
mod transposition;

pub use heuristic::heuristic_value;
pub use search::Expectimax;
pub use transposition::{TranspositionEntry, TranspositionTable};

/// Configurable knobs for Expectimax.
///
/// - `prob_cutoff`: stop expanding once a branch's cumulative probability drops below this.
/// - `time_budget`: soft limit checked between completed depth levels.
/// - `min_depth` / `depth_cap`: bounds on the target depth derived from the board.
/// - `cache_capacity`: transposition entries kept before the table is flushed.
#[derive(Debug, Clone)]
pub struct ExpectimaxConfig {
    pub prob_cutoff: f32,
    pub time_budget: Duration,
    pub min_depth: u64,
    pub depth_cap: u64,
    pub cache_capacity: usize,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            prob_cutoff: 1e-4,
            time_budget: Duration::from_millis(100),
            min_depth: 3,
            depth_cap: 12,
            cache_capacity: TranspositionTable::DEFAULT_CAPACITY,
        }
    }
}

/// Stats for the most recent search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Nodes visited by the last search.
    pub nodes: u64,
    /// Largest `nodes` seen since the last reset.
    pub peak_nodes: u64,
    pub target_depth: u64,
    /// Deepest level that completed.
    pub depth_reached: u64,
    pub elapsed: Duration,
    /// Transposition entries held after the search.
    pub cache_entries: usize,
}

fn warm_engine() {
    // Safe to call multiple times.
    engine::init();
}
