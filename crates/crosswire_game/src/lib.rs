//! Crosswire game library - tic-tac-toe rules and wire protocol.
//!
//! Shared by the server, which owns the authoritative board, and the
//! client, which only renders snapshots and submits moves.
//!
//! # Example
//!
//! ```
//! use crosswire_game::{Board, Mark};
//!
//! let mut board = Board::new();
//! for cell in [0, 3, 6] {
//!     board.place(cell, Mark::O).unwrap();
//! }
//! assert_eq!(board.winner(), Some(1));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
pub mod protocol;
pub mod rules;
mod types;

pub use board::{Board, CELLS, PlaceError};
pub use types::{Mark, PlayerId, SEATS};
