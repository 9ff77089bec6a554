//! JSON envelope encoding and decoding.

use super::command::{
    ClientCommand, CommandName, DisplayBoard, Info, PlayerAdded, ServerCommand, UserMove,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;
use tracing::{instrument, trace};

/// Errors raised while translating between frames and commands.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ProtocolError {
    /// The frame is not a valid envelope, or its params do not fit the
    /// named command.
    #[display("Malformed command: {}", _0)]
    Malformed(String),

    /// The envelope names a command this side does not handle.
    #[display("Unknown command: {}", _0)]
    UnknownCommand(String),

    /// A command could not be serialized.
    #[display("Failed to encode command: {}", _0)]
    Encode(String),
}

impl std::error::Error for ProtocolError {}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Params", default)]
    params: Option<Value>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, P: Serialize> {
    #[serde(rename = "Name")]
    name: &'static str,
    #[serde(rename = "Params")]
    params: Option<&'a P>,
}

fn write_envelope<S, P>(
    serializer: S,
    name: CommandName,
    params: Option<&P>,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    P: Serialize,
{
    EnvelopeRef {
        name: name.into(),
        params,
    }
    .serialize(serializer)
}

impl Serialize for ServerCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ServerCommand::AddNewPlayer => write_envelope::<_, ()>(serializer, self.name(), None),
            ServerCommand::UserMove(mv) => write_envelope(serializer, self.name(), Some(mv)),
        }
    }
}

impl Serialize for ClientCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = self.name();
        match self {
            ClientCommand::PlayerAdded(p) => write_envelope(serializer, name, Some(p)),
            ClientCommand::DisplayBoard(b) => write_envelope(serializer, name, Some(b)),
            ClientCommand::WrongMove(i) | ClientCommand::GameEnds(i) => {
                write_envelope(serializer, name, Some(i))
            }
            ClientCommand::GameBegins | ClientCommand::AskForPlay | ClientCommand::WaitForMove => {
                write_envelope::<_, ()>(serializer, name, None)
            }
        }
    }
}

/// Serializes a command into a text frame.
pub fn encode<T: Serialize>(command: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(command).map_err(|e| ProtocolError::Encode(e.to_string()))
}

fn open_envelope(frame: &str) -> Result<(CommandName, Option<Value>), ProtocolError> {
    let envelope: Envelope =
        serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let name = CommandName::from_str(&envelope.name)
        .map_err(|_| ProtocolError::UnknownCommand(envelope.name.clone()))?;
    Ok((name, envelope.params))
}

fn params<P: DeserializeOwned>(
    name: CommandName,
    params: Option<Value>,
) -> Result<P, ProtocolError> {
    let value = params.ok_or_else(|| ProtocolError::Malformed(format!("{name} requires Params")))?;
    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(format!("{name}: {e}")))
}

/// Decodes a frame received by the server.
///
/// Client-bound names are reported as [`ProtocolError::UnknownCommand`]:
/// the server has no handler for them.
#[instrument(level = "trace", skip(frame), fields(len = frame.len()))]
pub fn decode_server_command(frame: &str) -> Result<ServerCommand, ProtocolError> {
    let (name, raw) = open_envelope(frame)?;
    trace!(%name, "Decoded envelope");
    match name {
        CommandName::AddNewPlayer => Ok(ServerCommand::AddNewPlayer),
        CommandName::UserMadeMove => Ok(ServerCommand::UserMove(params::<UserMove>(name, raw)?)),
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

/// Decodes a frame received by a client.
#[instrument(level = "trace", skip(frame), fields(len = frame.len()))]
pub fn decode_client_command(frame: &str) -> Result<ClientCommand, ProtocolError> {
    let (name, raw) = open_envelope(frame)?;
    trace!(%name, "Decoded envelope");
    let command = match name {
        CommandName::PlayerAdded => ClientCommand::PlayerAdded(params::<PlayerAdded>(name, raw)?),
        CommandName::GameBegins => ClientCommand::GameBegins,
        CommandName::DisplayBoard => {
            ClientCommand::DisplayBoard(params::<DisplayBoard>(name, raw)?)
        }
        CommandName::AskForPlay => ClientCommand::AskForPlay,
        CommandName::WaitForMove => ClientCommand::WaitForMove,
        CommandName::WrongMove => ClientCommand::WrongMove(params::<Info>(name, raw)?),
        CommandName::GameEnds => ClientCommand::GameEnds(params::<Info>(name, raw)?),
        other => return Err(ProtocolError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mark;
    use serde_json::json;

    #[test]
    fn test_decode_add_new_player_with_null_params() {
        let cmd = decode_server_command(r#"{"Name":"ADD_NEW_PLAYER","Params":null}"#).unwrap();
        assert_eq!(cmd, ServerCommand::AddNewPlayer);
    }

    #[test]
    fn test_decode_add_new_player_without_params() {
        let cmd = decode_server_command(r#"{"Name":"ADD_NEW_PLAYER"}"#).unwrap();
        assert_eq!(cmd, ServerCommand::AddNewPlayer);
    }

    #[test]
    fn test_decode_user_move() {
        let frame = r#"{"Name":"USER_MADE_MOVE","Params":{"id":1,"move":"4","sessionId":"abc"}}"#;
        match decode_server_command(frame).unwrap() {
            ServerCommand::UserMove(mv) => {
                assert_eq!(mv.id, 1);
                assert_eq!(mv.cell_index(), Some(4));
                assert_eq!(mv.session_id, "abc");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_user_move_without_params_is_malformed() {
        let err = decode_server_command(r#"{"Name":"USER_MADE_MOVE","Params":null}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_user_move_with_wrong_shape_is_malformed() {
        let frame =
            r#"{"Name":"USER_MADE_MOVE","Params":{"id":"one","move":"4","sessionId":"abc"}}"#;
        assert!(matches!(decode_server_command(frame), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(decode_server_command("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            decode_server_command(r#"{"Params":{}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_name_is_reported_separately() {
        let err = decode_server_command(r#"{"Name":"DANCE","Params":null}"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownCommand("DANCE".to_string()));
    }

    #[test]
    fn test_client_bound_name_is_unknown_to_server() {
        let err = decode_server_command(r#"{"Name":"GAME_BEGINS","Params":null}"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownCommand("GAME_BEGINS".to_string()));
    }

    #[test]
    fn test_encode_unit_command_has_null_params() {
        let frame = encode(&ClientCommand::AskForPlay).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"Name": "ASK_FOR_PLAY", "Params": null}));
    }

    #[test]
    fn test_encode_display_board_uses_tokens() {
        let mut fields = [Mark::Empty; 9];
        fields[4] = Mark::O;
        let frame = encode(&ClientCommand::display_board(&fields)).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["Name"], "DISPLAY_BOARD");
        assert_eq!(value["Params"]["boardFields"][4], " O ");
        assert_eq!(value["Params"]["boardFields"][0], "   ");
    }

    #[test]
    fn test_encode_player_added_keys() {
        let frame = encode(&ClientCommand::player_added(1, "abc")).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"Name": "PLAYER_ADDED", "Params": {"playerId": 1, "sessionId": "abc"}})
        );
    }

    #[test]
    fn test_client_decodes_what_server_encodes() {
        let sent = ClientCommand::game_ends("You won!");
        let frame = encode(&sent).unwrap();
        assert_eq!(decode_client_command(&frame).unwrap(), sent);
    }
}
