//! Wire protocol between the server and its clients.
//!
//! Every frame is a JSON envelope `{"Name": <string>, "Params": <object|null>}`.
//! Inbound frames are decoded once, at the transport boundary, into the
//! tagged unions [`ServerCommand`] and [`ClientCommand`]; nothing past that
//! boundary handles loose JSON.

mod codec;
mod command;

pub use codec::{ProtocolError, decode_client_command, decode_server_command, encode};
pub use command::{
    ClientCommand, CommandName, DisplayBoard, Info, PlayerAdded, ServerCommand, UserMove,
};
