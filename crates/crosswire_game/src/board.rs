//! The 3x3 board and its turn counter.

use crate::rules;
use crate::types::{Mark, PlayerId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// Errors that can occur when placing a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PlaceError {
    /// Index outside `0..=8`.
    #[display("Cell {} is outside the board", _0)]
    InvalidIndex(usize),

    /// Target cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(usize),

    /// `Mark::Empty` cannot be placed.
    #[display("An empty mark cannot be placed")]
    InvalidMark,
}

impl std::error::Error for PlaceError {}

/// Tic-tac-toe board: nine cells in row-major order plus the number of
/// moves made so far.
///
/// The count of non-empty cells always equals `turn_number`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    turn_number: u32,
    fields: [Mark; CELLS],
}

impl Board {
    /// Creates an empty board at turn 0.
    #[instrument]
    pub fn new() -> Self {
        Self {
            turn_number: 0,
            fields: [Mark::Empty; CELLS],
        }
    }

    /// Places `mark` at `index` and advances the turn counter.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceError::InvalidIndex`] when `index > 8` and
    /// [`PlaceError::CellOccupied`] when the cell already holds a mark.
    /// The board is left untouched on error.
    #[instrument(skip(self), fields(turn = self.turn_number))]
    pub fn place(&mut self, index: usize, mark: Mark) -> Result<(), PlaceError> {
        if mark.is_empty() {
            return Err(PlaceError::InvalidMark);
        }
        let cell = self
            .fields
            .get_mut(index)
            .ok_or(PlaceError::InvalidIndex(index))?;
        if !cell.is_empty() {
            debug!(index, occupant = ?cell, "Cell already taken");
            return Err(PlaceError::CellOccupied(index));
        }
        *cell = mark;
        self.turn_number += 1;
        Ok(())
    }

    /// Returns the seat owning a completed line, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        rules::check_winner(self)
    }

    /// Returns true once every cell holds a mark.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// Returns the mark at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.fields.get(index).copied()
    }

    /// Cells in row-major order.
    pub fn fields(&self) -> &[Mark; CELLS] {
        &self.fields
    }

    /// Number of accepted moves.
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Builds a board from raw cells, deriving the turn counter from the
    /// number of marks so the counting invariant holds.
    pub fn from_fields(fields: [Mark; CELLS]) -> Self {
        let turn_number = fields.iter().filter(|m| !m.is_empty()).count() as u32;
        Self {
            turn_number,
            fields,
        }
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, cells) in self.fields.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            let line: Vec<&str> = cells.iter().map(|m| m.token()).collect();
            write!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}
