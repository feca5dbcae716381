use std::time::Duration;

use tempfile::TempDir;
use tile_2048::engine::Board;
use tile_2048::expectimax::{Expectimax, ExpectimaxConfig};
use tile_2048::game::{Game, GameEvent, Status};
use tile_2048::save::SaveStore;

fn agent() -> Expectimax {
    Expectimax::with_config(ExpectimaxConfig {
        depth_cap: 3,
        time_budget: Duration::from_secs(60),
        ..Default::default()
    })
}

#[test]
fn seeded_autoplay_keeps_game_invariants() {
    let mut game = Game::seeded(2048);
    let mut ex = agent();
    let mut last_score = 0;
    for _ in 0..200 {
        if game.is_game_over() {
            break;
        }
        let dir = ex.best_move(game.board()).expect("a live board has a legal move");
        let empty_before = game.board().count_empty();
        let events = game.make_move(dir).expect("policy picks legal moves");

        assert!(matches!(events.last(), Some(GameEvent::Spawn { .. })));
        let spawns = events.iter().filter(|e| matches!(e, GameEvent::Spawn { .. })).count();
        assert_eq!(spawns, 1);
        let merges = events.iter().filter(|e| matches!(e, GameEvent::Merge { .. })).count() as u32;
        // each merge frees a cell, the spawn fills one
        assert_eq!(game.board().count_empty(), empty_before + merges - 1);

        assert!(game.score() >= last_score);
        assert!(game.high_score() >= game.score());
        last_score = game.score();
    }
    assert!(game.score() > 0);
}

#[test]
fn same_seed_same_game() {
    let play = || {
        let mut game = Game::seeded(99);
        let mut ex = agent();
        for _ in 0..40 {
            let Some(dir) = ex.best_move(game.board()) else { break };
            game.make_move(dir);
        }
        game.state()
    };
    assert_eq!(play(), play());
}

#[test]
fn interrupted_game_resumes_from_disk() {
    let dir = TempDir::new().unwrap();
    let store = SaveStore::new(dir.path());
    let mut game = Game::seeded(3);
    let mut ex = agent();
    for _ in 0..25 {
        let Some(dir) = ex.best_move(game.board()) else { break };
        game.make_move(dir);
        store.save(&game.state()).unwrap();
        store.save_high_score(game.high_score()).unwrap();
    }

    let mut resumed = Game::seeded(4);
    assert_eq!(store.resume(&mut resumed), vec![GameEvent::Reset]);
    assert_eq!(resumed.state(), game.state());
    assert_eq!(resumed.high_score(), game.high_score());
    assert_eq!(resumed.status(), Status::Playing);
}

#[test]
fn locked_board_ends_the_game() {
    // alternating 2/4 checkerboard: nothing moves
    let locked = Board::from_exponents([1, 2, 1, 2, 2, 1, 2, 1, 1, 2, 1, 2, 2, 1, 2, 1]);
    let mut game = Game::seeded(0);
    game.load_state(tile_2048::game::GameState { board: locked, score: 12 });
    assert_eq!(agent().best_move(locked), None);
    assert!(game.is_game_over());
    assert_eq!(game.check_game_over(), Some(GameEvent::GameOver));
    assert_eq!(game.check_game_over(), None);
    assert_eq!(game.status(), Status::GameOver);
}
