use crate::engine::{self as GameEngine, Board};

/// Static evaluation of a board: the row heuristic summed over its 4 rows and 4 columns.
#[inline]
pub fn heuristic_value(board: Board) -> f64 {
    let transpose_board = GameEngine::transpose(board.raw());
    (0..4).fold(0., |score, line_idx| {
        let row_val = GameEngine::extract_row(board.raw(), line_idx);
        let col_val = GameEngine::extract_row(transpose_board, line_idx);
        score + GameEngine::row_heuristic(row_val) + GameEngine::row_heuristic(col_val)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_scores_eight_empty_lines() {
        assert_eq!(heuristic_value(Board::EMPTY), 8.0 * (200_000.0 + 4.0 * 270.0));
    }

    #[test]
    fn symmetric_under_transpose() {
        let b = Board::from_exponents([1, 2, 3, 0, 0, 4, 0, 1, 2, 2, 0, 0, 7, 0, 0, 1]);
        let t = Board::from_raw(GameEngine::transpose(b.raw()));
        assert!((heuristic_value(b) - heuristic_value(t)).abs() < 1e-6);
    }

    #[test]
    fn prefers_open_boards() {
        let sparse = Board::from_exponents([3, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let cluttered = Board::from_exponents([3, 1, 3, 1, 1, 3, 1, 3, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(heuristic_value(sparse) > heuristic_value(cluttered));
    }
}
