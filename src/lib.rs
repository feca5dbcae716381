//! tile-2048: a 2048 bitboard engine + Expectimax autoplayer
//!
//! This crate provides:
//! - A packed `Board` type with table-driven moves (`engine` module)
//! - A stateful `Game` that reports every slide, merge and spawn as an event (`game` module)
//! - An iterative-deepening Expectimax policy with a transposition table (`expectimax` module)
//! - A small on-disk store for the current game and the high score (`save` module)
//!
//! Full loop (simplest possible)
//! ```
//! use tile_2048::expectimax::Expectimax;
//! use tile_2048::game::Game;
//!
//! // 1) Seeded game (deals two tiles) and a policy
//! let mut game = Game::seeded(123);
//! let mut policy = Expectimax::new();
//! let mut moves = 0u32;
//!
//! // 2) Let the policy play a few moves (keep doctests fast)
//! while !game.is_game_over() && moves < 4 {
//!     match policy.best_move(game.board()) {
//!         Some(dir) => {
//!             let events = game.make_move(dir).expect("policy only picks legal moves");
//!             assert!(!events.is_empty());
//!             moves += 1;
//!         }
//!         None => break,
//!     }
//! }
//!
//! // 3) Inspect the result
//! assert!(moves > 0);
//! assert!(game.high_score() >= game.score());
//! ```
//!
pub mod engine;
pub mod expectimax;
pub mod game;
pub mod save;
