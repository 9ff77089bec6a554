//! Typed commands and their payloads.

use crate::board::CELLS;
use crate::types::{Mark, PlayerId};
use serde::{Deserialize, Serialize};

/// Every command name understood by either side of the connection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandName {
    /// Client asks to be seated in a session.
    AddNewPlayer,
    /// Client submits a move.
    UserMadeMove,
    /// Server assigns the client its seat and session.
    PlayerAdded,
    /// Both seats are filled.
    GameBegins,
    /// Board snapshot.
    DisplayBoard,
    /// The receiving player must move.
    AskForPlay,
    /// The opponent is moving.
    WaitForMove,
    /// The submitted move was rejected.
    WrongMove,
    /// The match is over; the connection will close.
    GameEnds,
}

impl CommandName {
    /// Returns true for names a client may send to the server.
    pub fn is_server_bound(self) -> bool {
        matches!(self, CommandName::AddNewPlayer | CommandName::UserMadeMove)
    }
}

/// Payload of `USER_MADE_MOVE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMove {
    /// Seat of the moving player.
    pub id: PlayerId,
    /// Cell index as a decimal string, row-major `0..=8`.
    #[serde(rename = "move")]
    pub cell: String,
    /// Session the player was seated in.
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

impl UserMove {
    /// Builds a move payload for the given cell.
    pub fn new(id: PlayerId, cell: usize, session_id: impl Into<String>) -> Self {
        Self {
            id,
            cell: cell.to_string(),
            session_id: session_id.into(),
        }
    }

    /// Parses the requested cell, or `None` when the string is not a
    /// non-negative decimal integer.
    pub fn cell_index(&self) -> Option<usize> {
        self.cell.trim().parse().ok()
    }
}

/// Payload of `PLAYER_ADDED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAdded {
    /// Seat assigned to the player.
    #[serde(rename = "playerId")]
    pub player_id: PlayerId,
    /// Session the player was seated in.
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Payload of `DISPLAY_BOARD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBoard {
    /// Cells in row-major order.
    #[serde(rename = "boardFields")]
    pub board_fields: [Mark; CELLS],
}

/// Free-text payload of `WRONG_MOVE` and `GAME_ENDS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// Human-readable message.
    pub info: String,
}

impl Info {
    /// Wraps a message.
    pub fn new(info: impl Into<String>) -> Self {
        Self { info: info.into() }
    }
}

/// Commands a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    /// `ADD_NEW_PLAYER`
    AddNewPlayer,
    /// `USER_MADE_MOVE`
    UserMove(UserMove),
}

impl ServerCommand {
    /// Wire name of this command.
    pub fn name(&self) -> CommandName {
        match self {
            ServerCommand::AddNewPlayer => CommandName::AddNewPlayer,
            ServerCommand::UserMove(_) => CommandName::UserMadeMove,
        }
    }
}

/// Commands the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `PLAYER_ADDED`
    PlayerAdded(PlayerAdded),
    /// `GAME_BEGINS`
    GameBegins,
    /// `DISPLAY_BOARD`
    DisplayBoard(DisplayBoard),
    /// `ASK_FOR_PLAY`
    AskForPlay,
    /// `WAIT_FOR_MOVE`
    WaitForMove,
    /// `WRONG_MOVE`
    WrongMove(Info),
    /// `GAME_ENDS`
    GameEnds(Info),
}

impl ClientCommand {
    /// Wire name of this command.
    pub fn name(&self) -> CommandName {
        match self {
            ClientCommand::PlayerAdded(_) => CommandName::PlayerAdded,
            ClientCommand::GameBegins => CommandName::GameBegins,
            ClientCommand::DisplayBoard(_) => CommandName::DisplayBoard,
            ClientCommand::AskForPlay => CommandName::AskForPlay,
            ClientCommand::WaitForMove => CommandName::WaitForMove,
            ClientCommand::WrongMove(_) => CommandName::WrongMove,
            ClientCommand::GameEnds(_) => CommandName::GameEnds,
        }
    }

    /// `PLAYER_ADDED` for the given seat.
    pub fn player_added(player_id: PlayerId, session_id: impl Into<String>) -> Self {
        ClientCommand::PlayerAdded(PlayerAdded {
            player_id,
            session_id: session_id.into(),
        })
    }

    /// `DISPLAY_BOARD` carrying a copy of the cells.
    pub fn display_board(fields: &[Mark; CELLS]) -> Self {
        ClientCommand::DisplayBoard(DisplayBoard {
            board_fields: *fields,
        })
    }

    /// `WRONG_MOVE` with an explanation.
    pub fn wrong_move(info: impl Into<String>) -> Self {
        ClientCommand::WrongMove(Info::new(info))
    }

    /// `GAME_ENDS` with the final message.
    pub fn game_ends(info: impl Into<String>) -> Self {
        ClientCommand::GameEnds(Info::new(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_command_names_on_the_wire() {
        assert_eq!(CommandName::AddNewPlayer.to_string(), "ADD_NEW_PLAYER");
        assert_eq!(CommandName::UserMadeMove.to_string(), "USER_MADE_MOVE");
        assert_eq!(CommandName::AskForPlay.to_string(), "ASK_FOR_PLAY");
        assert_eq!(CommandName::from_str("GAME_ENDS"), Ok(CommandName::GameEnds));
    }

    #[test]
    fn test_only_two_server_bound_names() {
        let bound: Vec<_> = CommandName::iter().filter(|n| n.is_server_bound()).collect();
        assert_eq!(bound, vec![CommandName::AddNewPlayer, CommandName::UserMadeMove]);
    }

    #[test]
    fn test_cell_index_parsing() {
        let mv = |cell: &str| UserMove {
            id: 0,
            cell: cell.to_string(),
            session_id: "s".to_string(),
        };
        assert_eq!(mv("4").cell_index(), Some(4));
        assert_eq!(mv(" 8 ").cell_index(), Some(8));
        assert_eq!(mv("12").cell_index(), Some(12));
        assert_eq!(mv("-1").cell_index(), None);
        assert_eq!(mv("four").cell_index(), None);
    }
}
