//! Board representation and win/draw detection.
//!
//! Pure game logic with no networking concerns: a 9-cell board, two marks,
//! and the 8 fixed winning triples (3 rows, 3 columns, 2 diagonals).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two symbols a player places on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// The 8 fixed winning triples, by cell index.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// A 9-cell board; each cell is empty or holds one of two marks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; BOARD_CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mark at `index`, or `None` for an empty or out-of-range cell.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Returns whether `index` addresses an empty in-range cell.
    pub fn is_free(&self, index: usize) -> bool {
        index < BOARD_CELLS && self.cells[index].is_none()
    }

    /// Places `mark` at `index`.
    ///
    /// Returns `false` without mutating the board when the cell is occupied
    /// or out of range; the caller treats that as a silently ignored move.
    pub fn place(&mut self, index: usize, mark: Mark) -> bool {
        if !self.is_free(index) {
            return false;
        }
        self.cells[index] = Some(mark);
        true
    }

    /// Returns the winning triple fully occupied by `mark`, if any.
    ///
    /// Only the side that just moved can have completed a line, so callers
    /// evaluate this immediately after placement with the mover's mark.
    pub fn winning_line(&self, mark: Mark) -> Option<[usize; 3]> {
        WIN_LINES
            .iter()
            .copied()
            .find(|line| line.iter().all(|&i| self.cells[i] == Some(mark)))
    }

    /// Returns whether `mark` has completed any winning triple.
    pub fn has_won(&self, mark: Mark) -> bool {
        self.winning_line(mark).is_some()
    }

    /// Returns whether all 9 cells are filled.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Clears every cell back to empty.
    pub fn reset(&mut self) {
        self.cells = [None; BOARD_CELLS];
    }

    /// Returns the raw cell array for snapshots.
    pub fn cells(&self) -> [Option<Mark>; BOARD_CELLS] {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_rejects_occupied_and_out_of_range() {
        let mut board = Board::new();
        assert!(board.place(4, Mark::X));
        assert!(!board.place(4, Mark::O));
        assert_eq!(board.cell(4), Some(Mark::X));
        assert!(!board.place(9, Mark::O));
    }

    #[test]
    fn test_column_win_detection() {
        let mut board = Board::new();
        for &i in &[0, 3, 6] {
            assert!(!board.has_won(Mark::X));
            board.place(i, Mark::X);
        }
        assert_eq!(board.winning_line(Mark::X), Some([0, 3, 6]));
        assert!(!board.has_won(Mark::O));
    }

    #[test]
    fn test_diagonal_win_detection() {
        let mut board = Board::new();
        board.place(2, Mark::O);
        board.place(4, Mark::O);
        board.place(6, Mark::O);
        assert_eq!(board.winning_line(Mark::O), Some([2, 4, 6]));
    }

    #[test]
    fn test_full_board_without_winner() {
        let mut board = Board::new();
        // X O X / X O O / O X X -- no line for either side
        let layout = [
            Mark::X,
            Mark::O,
            Mark::X,
            Mark::X,
            Mark::O,
            Mark::O,
            Mark::O,
            Mark::X,
            Mark::X,
        ];
        for (i, mark) in layout.into_iter().enumerate() {
            board.place(i, mark);
        }
        assert!(board.is_full());
        assert!(!board.has_won(Mark::X));
        assert!(!board.has_won(Mark::O));
    }

    #[test]
    fn test_reset_clears_every_cell() {
        let mut board = Board::new();
        board.place(0, Mark::X);
        board.place(8, Mark::O);
        board.reset();
        assert_eq!(board, Board::new());
    }
}
