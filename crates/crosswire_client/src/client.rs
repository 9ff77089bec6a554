//! Client-side view of a match, independent of the socket.

use crosswire_game::protocol::{ClientCommand, ServerCommand, UserMove};
use crosswire_game::{Board, CELLS, PlayerId};
use tracing::{debug, info, instrument};

/// Why a line typed by the user could not become a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum InputError {
    /// No `PLAYER_ADDED` seen yet.
    #[display("Not seated yet")]
    NotSeated,
    /// The server has not asked for a move.
    #[display("Wait for your turn")]
    NotYourTurn,
    /// Input was not a keypad digit 1-9.
    #[display("Pick a square 1-9, got '{}'", _0)]
    InvalidSquare(String),
}

impl std::error::Error for InputError {}

/// What the terminal loop should do after a server command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a line for the user.
    Show(String),
    /// Ask the user for a square.
    Prompt,
    /// The match is over; print and quit.
    Exit(String),
}

/// Seat assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Seat {
    player_id: PlayerId,
    session_id: String,
}

/// Tracks seat and turn from the server's point of view.
#[derive(Debug, Default)]
pub struct GameClient {
    seat: Option<Seat>,
    awaiting_move: bool,
}

impl GameClient {
    /// Creates a client that has not joined yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The command that requests a seat.
    pub fn join(&self) -> ServerCommand {
        ServerCommand::AddNewPlayer
    }

    /// Seat number, once assigned.
    pub fn player_id(&self) -> Option<PlayerId> {
        self.seat.as_ref().map(|seat| seat.player_id)
    }

    /// Folds a server command into local state.
    #[instrument(skip(self), fields(command = %command.name()))]
    pub fn handle(&mut self, command: ClientCommand) -> Vec<Action> {
        debug!("Handling server command");
        match command {
            ClientCommand::PlayerAdded(added) => {
                info!(player_id = added.player_id, session_id = %added.session_id, "Seated");
                let text = format!(
                    "Joined session {} as player {}. Waiting for an opponent...",
                    added.session_id, added.player_id
                );
                self.seat = Some(Seat {
                    player_id: added.player_id,
                    session_id: added.session_id,
                });
                vec![Action::Show(text)]
            }
            ClientCommand::GameBegins => vec![Action::Show("Game begins!".to_string())],
            ClientCommand::DisplayBoard(display) => {
                let board = Board::from_fields(display.board_fields);
                vec![Action::Show(board.to_string())]
            }
            ClientCommand::AskForPlay => {
                self.awaiting_move = true;
                vec![Action::Prompt]
            }
            ClientCommand::WaitForMove => {
                self.awaiting_move = false;
                vec![Action::Show("Waiting for the opponent's move...".to_string())]
            }
            ClientCommand::WrongMove(info) => {
                vec![Action::Show(info.info)]
            }
            ClientCommand::GameEnds(info) => {
                self.awaiting_move = false;
                vec![Action::Exit(info.info)]
            }
        }
    }

    /// Turns a keypad digit (1 top-left, 9 bottom-right) into a move.
    #[instrument(skip(self))]
    pub fn submit(&mut self, line: &str) -> Result<ServerCommand, InputError> {
        let seat = self.seat.as_ref().ok_or(InputError::NotSeated)?;
        if !self.awaiting_move {
            return Err(InputError::NotYourTurn);
        }
        let square = line.trim();
        let cell = match square.parse::<usize>() {
            Ok(n) if (1..=CELLS).contains(&n) => n - 1,
            _ => return Err(InputError::InvalidSquare(square.to_string())),
        };
        self.awaiting_move = false;
        debug!(cell, "Submitting move");
        Ok(ServerCommand::UserMove(UserMove::new(
            seat.player_id,
            cell,
            seat.session_id.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswire_game::Mark;

    fn seated() -> GameClient {
        let mut client = GameClient::new();
        client.handle(ClientCommand::player_added(1, "abc"));
        client
    }

    #[test]
    fn test_player_added_assigns_seat() {
        let client = seated();
        assert_eq!(client.player_id(), Some(1));
        assert!(!client.awaiting_move);
    }

    #[test]
    fn test_submit_before_seat() {
        let mut client = GameClient::new();
        assert_eq!(client.submit("5"), Err(InputError::NotSeated));
    }

    #[test]
    fn test_submit_out_of_turn() {
        let mut client = seated();
        assert_eq!(client.submit("5"), Err(InputError::NotYourTurn));
    }

    #[test]
    fn test_submit_maps_keypad_to_cell() {
        let mut client = seated();
        assert_eq!(client.handle(ClientCommand::AskForPlay), vec![Action::Prompt]);
        let command = client.submit(" 5\n").unwrap();
        assert_eq!(command, ServerCommand::UserMove(UserMove::new(1, 4, "abc")));
        assert_eq!(client.submit("6"), Err(InputError::NotYourTurn));
    }

    #[test]
    fn test_submit_rejects_bad_squares() {
        let mut client = seated();
        client.handle(ClientCommand::AskForPlay);
        for bad in ["0", "10", "x", ""] {
            assert_eq!(
                client.submit(bad),
                Err(InputError::InvalidSquare(bad.to_string()))
            );
        }
        assert!(client.awaiting_move);
    }

    #[test]
    fn test_wrong_move_keeps_prompting_on_next_ask() {
        let mut client = seated();
        client.handle(ClientCommand::AskForPlay);
        client.submit("1").unwrap();
        let actions =
            client.handle(ClientCommand::wrong_move("Wrong move 0. It is blocked already."));
        assert_eq!(
            actions,
            vec![Action::Show("Wrong move 0. It is blocked already.".to_string())]
        );
        client.handle(ClientCommand::AskForPlay);
        assert!(client.submit("2").is_ok());
    }

    #[test]
    fn test_display_board_renders_rows() {
        let mut client = seated();
        let mut fields = [Mark::Empty; CELLS];
        fields[4] = Mark::O;
        let actions = client.handle(ClientCommand::display_board(&fields));
        let expected = Board::from_fields(fields).to_string();
        assert_eq!(actions, vec![Action::Show(expected)]);
    }

    #[test]
    fn test_game_ends_exits() {
        let mut client = seated();
        client.handle(ClientCommand::AskForPlay);
        let actions = client.handle(ClientCommand::game_ends("You won!"));
        assert_eq!(actions, vec![Action::Exit("You won!".to_string())]);
        assert_eq!(client.submit("1"), Err(InputError::NotYourTurn));
    }
}
