use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use tile_2048::engine::Move;
use tile_2048::expectimax::{Expectimax, ExpectimaxConfig};
use tile_2048::game::{Game, GameEvent};
use tile_2048::save::SaveStore;

#[derive(Parser, Debug)]
#[command(name = "tile-2048", about = "Let Expectimax play 2048")]
struct Args {
    /// Seed for tile spawns (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Soft time budget per move, in milliseconds
    #[arg(long, default_value_t = 100)]
    budget_ms: u64,
    /// Deepest search level
    #[arg(long, default_value_t = 12)]
    depth_cap: u64,
    /// Directory holding the saved game and high score
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Ignore any saved game
    #[arg(long, default_value_t = false)]
    fresh: bool,
    /// Print every game event as a JSON line
    #[arg(long, default_value_t = false)]
    events: bool,
    /// Only print the final summary
    #[arg(long, default_value_t = false)]
    quiet: bool,
    /// Show a status spinner instead of the board
    #[arg(long, default_value_t = false)]
    progress: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = ExpectimaxConfig {
        time_budget: Duration::from_millis(args.budget_ms),
        depth_cap: args.depth_cap.max(1),
        ..ExpectimaxConfig::default()
    };
    let mut expectimax = Expectimax::with_config(cfg);
    let mut game = match args.seed {
        Some(seed) => Game::seeded(seed),
        None => Game::new(),
    };

    let store = args.save_dir.as_ref().map(SaveStore::new);
    let opening = match &store {
        Some(store) if !args.fresh => store.resume(&mut game),
        Some(store) => {
            store.restore_high_score(&mut game);
            game.board_events()
        }
        None => game.board_events(),
    };
    let mut stdout = io::stdout().lock();
    if args.events {
        emit_events(&mut stdout, &opening)?;
    }
    let mut saved_high_score = game.high_score();
    info!("starting at score {} (high score {})", game.score(), saved_high_score);

    let pb = if args.progress && !args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let mut move_count: u64 = 0;
    loop {
        if let Some(event) = game.check_game_over() {
            if args.events {
                emit_events(&mut stdout, &[event])?;
            }
            break;
        }
        if args.max_moves.is_some_and(|max| move_count >= max) {
            info!("stopping after {move_count} moves");
            break;
        }
        let Some(dir) = expectimax.best_move(game.board()) else { break };
        let stats = expectimax.last_stats();
        let Some(events) = game.make_move(dir) else {
            // the search only proposes board-changing moves
            debug!("{dir} left {:?} unchanged", game.board());
            break;
        };
        move_count += 1;

        if args.events {
            emit_events(&mut stdout, &events)?;
        }
        if let Some(pb) = &pb {
            let rate = move_count as f64 / start.elapsed().as_secs_f64().max(1e-6);
            pb.set_message(format!(
                "moves: {move_count} | moves/sec: {rate:.1} | score: {} | depth: {}",
                game.score(),
                stats.depth_reached
            ));
        } else if !args.quiet && !args.events {
            print_turn(&mut stdout, move_count, dir, &game)?;
        }

        if let Some(store) = &store {
            store.save(&game.state()).context("saving game")?;
            if game.high_score() > saved_high_score {
                store.save_high_score(game.high_score()).context("saving high score")?;
                saved_high_score = game.high_score();
            }
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if game.is_game_over() {
        if let Some(store) = &store {
            store.clear().context("clearing finished game")?;
        }
    }

    let board = game.board();
    writeln!(stdout, "{board}")?;
    writeln!(stdout, "moves: {move_count}")?;
    writeln!(stdout, "score: {}", game.score())?;
    writeln!(stdout, "high score: {}", game.high_score())?;
    writeln!(stdout, "highest tile: {}", board.highest_tile())?;
    writeln!(stdout, "won: {}", game.has_won())?;
    writeln!(stdout, "peak nodes per move: {}", expectimax.last_stats().peak_nodes)?;
    writeln!(stdout, "elapsed: {:.2?}", start.elapsed())?;
    Ok(())
}

fn emit_events(out: &mut impl Write, events: &[GameEvent]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_turn<R: rand::Rng>(out: &mut impl Write, move_count: u64, dir: Move, game: &Game<R>) -> Result<()> {
    writeln!(out, "move {move_count}: {dir} (score {})", game.score())?;
    writeln!(out, "{}", game.board())?;
    Ok(())
}
