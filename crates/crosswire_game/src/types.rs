//! Core domain types shared by the board and the protocol.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Seat number of a player inside a session, assigned by join order (0 or 1).
pub type PlayerId = u8;

/// Number of seats in a session.
pub const SEATS: usize = 2;

/// Contents of a single board cell.
///
/// On the wire each cell travels as a fixed three-character token
/// (`"   "`, `" X "`, `" O "`), which is also how clients render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mark {
    /// Unclaimed cell.
    #[default]
    #[serde(rename = "   ")]
    Empty,
    /// Mark of player 0.
    #[serde(rename = " X ")]
    X,
    /// Mark of player 1.
    #[serde(rename = " O ")]
    O,
}

impl Mark {
    /// Returns the mark owned by the given seat.
    ///
    /// Seat 0 plays `X`, every other seat plays `O`.
    #[instrument]
    pub fn for_player(player_id: PlayerId) -> Self {
        if player_id == 0 { Mark::X } else { Mark::O }
    }

    /// Numeric weight used by the line-sum win check.
    pub const fn weight(self) -> u8 {
        match self {
            Mark::Empty => 0,
            Mark::X => 1,
            Mark::O => 10,
        }
    }

    /// Three-character token used on the wire and in board rendering.
    pub fn token(self) -> &'static str {
        match self {
            Mark::Empty => "   ",
            Mark::X => " X ",
            Mark::O => " O ",
        }
    }

    /// Returns true for an unclaimed cell.
    pub fn is_empty(self) -> bool {
        self == Mark::Empty
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
