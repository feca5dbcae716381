use std::sync::OnceLock;

use super::{Tile, MAX_EXPONENT};

/// One horizontal quartet of nibbles; nibble 0 (the low bits) is the leftmost cell.
pub type Row = u16;

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit rows

// Heuristic weights. Credit to Nneonneo for the structure.
const LOST_PENALTY: f64 = 200_000.0;
const MONOTONICITY_POWER: f64 = 4.0;
const MONOTONICITY_WEIGHT: f64 = 47.0;
const SUM_POWER: f64 = 3.5;
const SUM_WEIGHT: f64 = 11.0;
const MERGES_WEIGHT: f64 = 700.0;
const EMPTY_WEIGHT: f64 = 270.0;

/// Precomputed per-row results, indexed by every possible [`Row`].
///
/// Right moves reuse the left collapse on the reversed row, so the collapse
/// logic exists once.
pub(crate) struct LineTables {
    pub(crate) move_left: Box<[Row]>,
    pub(crate) move_right: Box<[Row]>,
    pub(crate) score_left: Box<[u32]>,
    pub(crate) score_right: Box<[u32]>,
    pub(crate) heuristic: Box<[f64]>,
}

static TABLES: OnceLock<LineTables> = OnceLock::new();

/// Build the row tables now rather than on first use. Safe to call multiple times.
pub fn init() {
    let _ = tables();
}

#[inline(always)]
pub(crate) fn tables() -> &'static LineTables {
    TABLES.get_or_init(build_tables)
}

/// Static heuristic value of a single row.
#[inline]
pub(crate) fn row_heuristic(row: Row) -> f64 {
    tables().heuristic[row as usize]
}

fn build_tables() -> LineTables {
    // Allocate on the heap to avoid large stack frames
    let mut move_left = vec![0 as Row; LINE_TABLE_SIZE];
    let mut move_right = vec![0 as Row; LINE_TABLE_SIZE];
    let mut score_left = vec![0u32; LINE_TABLE_SIZE];
    let mut score_right = vec![0u32; LINE_TABLE_SIZE];
    let mut heuristic = vec![0f64; LINE_TABLE_SIZE];

    for idx in 0..LINE_TABLE_SIZE {
        let tiles = unpack(idx as Row);
        let (collapsed, score) = collapse_left(tiles);
        move_left[idx] = pack(collapsed);
        score_left[idx] = score;
        heuristic[idx] = calc_heuristic(&tiles);
    }
    for idx in 0..LINE_TABLE_SIZE {
        let rev = reverse_row(idx as Row) as usize;
        move_right[idx] = reverse_row(move_left[rev]);
        score_right[idx] = score_left[rev];
    }

    LineTables {
        move_left: move_left.into_boxed_slice(),
        move_right: move_right.into_boxed_slice(),
        score_left: score_left.into_boxed_slice(),
        score_right: score_right.into_boxed_slice(),
        heuristic: heuristic.into_boxed_slice(),
    }
}

pub(crate) fn reverse_row(row: Row) -> Row {
    (row >> 12) | ((row >> 4) & 0x00f0) | ((row << 4) & 0x0f00) | (row << 12)
}

pub(crate) fn unpack(row: Row) -> [Tile; 4] {
    [
        (row & 0xf) as Tile,
        ((row >> 4) & 0xf) as Tile,
        ((row >> 8) & 0xf) as Tile,
        ((row >> 12) & 0xf) as Tile,
    ]
}

pub(crate) fn pack(tiles: [Tile; 4]) -> Row {
    tiles
        .iter()
        .enumerate()
        .fold(0, |row, (idx, &t)| row | (Row::from(t) << (4 * idx)))
}

/// Slide non-empty tiles toward index 0, merging equal neighbours once each.
///
/// Returns the collapsed tiles and the sum of the merged tiles' face values.
/// Two 32768 tiles stay apart: their sum does not fit in a nibble.
fn collapse_left(tiles: [Tile; 4]) -> ([Tile; 4], u32) {
    let mut out = [0; 4];
    let mut len = 0;
    let mut score = 0;
    // whether out[len - 1] can still absorb a tile this move
    let mut open = false;
    for &tile in tiles.iter().filter(|&&t| t != 0) {
        if open && out[len - 1] == tile && tile < MAX_EXPONENT {
            out[len - 1] += 1;
            score += 1u32 << out[len - 1];
            open = false;
        } else {
            out[len] = tile;
            len += 1;
            open = true;
        }
    }
    (out, score)
}

fn calc_heuristic(line: &[Tile; 4]) -> f64 {
    LOST_PENALTY + calc_empty(line) + calc_merges(line) - calc_monotonicity(line) - calc_sum(line)
}

fn calc_sum(line: &[Tile; 4]) -> f64 {
    line.iter().fold(0., |acc, &t| acc + f64::from(t).powf(SUM_POWER)) * SUM_WEIGHT
}

fn calc_empty(line: &[Tile; 4]) -> f64 {
    line.iter().filter(|&&t| t == 0).count() as f64 * EMPTY_WEIGHT
}

/// Runs of equal tiles, skipping over gaps: a run of `k` equal tiles counts `k`.
fn calc_merges(line: &[Tile; 4]) -> f64 {
    let mut prev = 0;
    let mut counter = 0.;
    let mut merges = 0.;
    for &tile in line.iter().filter(|&&t| t != 0) {
        if prev == tile {
            counter += 1.;
        } else if counter > 0. {
            merges += 1. + counter;
            counter = 0.;
        }
        prev = tile;
    }
    if counter > 0. {
        merges += 1. + counter;
    }
    merges * MERGES_WEIGHT
}

fn calc_monotonicity(line: &[Tile; 4]) -> f64 {
    let mut monotonicity_left = 0.;
    let mut monotonicity_right = 0.;
    for i in 1..4 {
        let tile1 = f64::from(line[i - 1]).powf(MONOTONICITY_POWER);
        let tile2 = f64::from(line[i]).powf(MONOTONICITY_POWER);
        if line[i - 1] > line[i] {
            monotonicity_left += tile1 - tile2;
        } else {
            monotonicity_right += tile2 - tile1;
        }
    }
    monotonicity_left.min(monotonicity_right) * MONOTONICITY_WEIGHT
}
