use super::tables::{tables, Row};
use super::{Board, BoardRaw, Move, Score};

const ROW_MASK: BoardRaw = 0xffff;

/// Swap rows and columns. Its own inverse.
// Credit to Nneonneo
pub fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline(always)]
pub(crate) fn extract_row(board: BoardRaw, row_idx: usize) -> Row {
    ((board >> (16 * row_idx)) & ROW_MASK) as Row
}

/// Slide/merge `board` in `direction`, returning the new board and the points scored.
///
/// Vertical moves run on the transposed board. If the result equals the input the
/// move was illegal; there is no other legality check.
pub fn execute_move(board: Board, direction: Move) -> (Board, Score) {
    let t = tables();
    let (rows, scores) = match direction {
        Move::Left | Move::Up => (&t.move_left, &t.score_left),
        Move::Right | Move::Down => (&t.move_right, &t.score_right),
    };
    let vertical = direction.is_vertical();
    let src = if vertical { transpose(board.raw()) } else { board.raw() };
    let (moved, score) = (0..4).fold((0, 0), |(acc, score), row_idx| {
        let row = extract_row(src, row_idx) as usize;
        (acc | (BoardRaw::from(rows[row]) << (16 * row_idx)), score + Score::from(scores[row]))
    });
    let moved = if vertical { transpose(moved) } else { moved };
    (Board::from_raw(moved), score)
}

/// True if no move in any direction changes the board.
pub fn is_game_over(board: Board) -> bool {
    Move::ALL.iter().all(|&dir| execute_move(board, dir).0 == board)
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u32 {
    16 - count_non_empty(board)
}

fn count_non_empty(board: Board) -> u32 {
    let mut x = board.raw();
    x |= x >> 1;
    x |= x >> 2;
    x &= 0x1111111111111111;
    x.count_ones()
}

/// Number of distinct non-empty exponents present.
// Credit to Nneonneo
pub fn count_distinct_tiles(board: Board) -> u32 {
    let mut bitset = 0u32;
    let mut x = board.raw();
    while x != 0 {
        bitset |= 1 << (x & 0xf);
        x >>= 4;
    }
    bitset >>= 1; // don't count empty tiles
    bitset.count_ones()
}
