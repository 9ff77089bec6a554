//! Win detection logic for tic-tac-toe.

use crate::board::Board;
use crate::types::{Mark, PlayerId};

/// The eight winning lines in scan order: rows, then columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

const X_LINE: u8 = 3 * Mark::X.weight();
const O_LINE: u8 = 3 * Mark::O.weight();

/// Checks if there is a winner on the board.
///
/// Each line is scored by summing cell weights (empty 0, X 1, O 10). Three
/// cells can only reach 3 with three X and 30 with three O, so a mixed line
/// such as X X O (12) never matches. The first completed line in [`LINES`]
/// order decides: `Some(0)` for X, `Some(1)` for O.
pub fn check_winner(board: &Board) -> Option<PlayerId> {
    let fields = board.fields();
    for line in LINES {
        let sum: u8 = line.iter().map(|&i| fields[i].weight()).sum();
        if sum == X_LINE {
            return Some(0);
        }
        if sum == O_LINE {
            return Some(1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CELLS;

    fn board_with(cells: &[(usize, Mark)]) -> Board {
        let mut fields = [Mark::Empty; CELLS];
        for &(i, m) in cells {
            fields[i] = m;
        }
        Board::from_fields(fields)
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(check_winner(&Board::new()), None);
    }

    #[test]
    fn test_winner_top_row() {
        let board = board_with(&[(0, Mark::X), (1, Mark::X), (2, Mark::X)]);
        assert_eq!(check_winner(&board), Some(0));
    }

    #[test]
    fn test_winner_diagonal() {
        let board = board_with(&[(2, Mark::O), (4, Mark::O), (6, Mark::O)]);
        assert_eq!(check_winner(&board), Some(1));
    }

    #[test]
    fn test_mixed_line_scores_twelve() {
        let board = board_with(&[(0, Mark::X), (1, Mark::X), (2, Mark::O)]);
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_first_line_in_scan_order_decides() {
        // A row and a column always share a cell, so two completed lines
        // of different marks are two rows or two columns.
        let rows = board_with(&[
            (0, Mark::O),
            (1, Mark::O),
            (2, Mark::O),
            (6, Mark::X),
            (7, Mark::X),
            (8, Mark::X),
        ]);
        assert_eq!(check_winner(&rows), Some(1));

        let columns = board_with(&[
            (0, Mark::X),
            (1, Mark::O),
            (3, Mark::X),
            (4, Mark::O),
            (6, Mark::X),
            (7, Mark::O),
        ]);
        assert_eq!(check_winner(&columns), Some(0));

        let swapped = board_with(&[
            (0, Mark::O),
            (2, Mark::X),
            (3, Mark::O),
            (5, Mark::X),
            (6, Mark::O),
            (8, Mark::X),
        ]);
        assert_eq!(check_winner(&swapped), Some(1));
    }
}
