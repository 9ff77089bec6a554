//! Seated players and their outbound channels.

use crosswire_game::protocol::ClientCommand;
use crosswire_game::{Mark, PlayerId};
use derive_getters::Getters;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Identifier of one websocket connection, unique for the server's lifetime.
pub type ConnectionId = u64;

/// Websocket close code for an orderly shutdown (game over).
pub const CLOSE_NORMAL: u16 = 1000;

/// Websocket close code for a connection that broke protocol rules.
pub const CLOSE_POLICY: u16 = 1008;

/// Instructions for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Deliver a command frame.
    Command(ClientCommand),
    /// Send a close frame and stop writing.
    Close {
        /// Websocket close code.
        code: u16,
        /// Human-readable reason.
        reason: String,
    },
}

/// Sending half of a connection's outbound queue.
///
/// Sends never block and never fail from the caller's point of view: if
/// the writer is gone the frame is dropped and a warning is logged.
#[derive(Debug, Clone)]
pub struct PlayerChannel {
    connection_id: ConnectionId,
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl PlayerChannel {
    /// Creates a channel and the receiver its writer task drains.
    pub fn pair(connection_id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { connection_id, tx }, rx)
    }

    /// Connection this channel writes to.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Queues a command for delivery.
    #[instrument(
        skip(self, command),
        fields(connection_id = self.connection_id, command = %command.name())
    )]
    pub fn send(&self, command: ClientCommand) {
        if self.tx.send(Outgoing::Command(command)).is_err() {
            warn!("Delivery failed, connection writer is gone");
        }
    }

    /// Asks the writer to close the connection.
    #[instrument(skip(self, reason), fields(connection_id = self.connection_id))]
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(code, %reason, "Closing connection");
        if self.tx.send(Outgoing::Close { code, reason }).is_err() {
            debug!("Connection already closed");
        }
    }
}

/// A player seated in a session.
#[derive(Debug, Clone, Getters)]
pub struct Player {
    /// Seat, assigned by join order.
    id: PlayerId,
    /// Mark derived from the seat.
    mark: Mark,
    /// Outbound channel to the player's connection.
    channel: PlayerChannel,
}

impl Player {
    /// Seats a player; the mark follows from the seat.
    pub fn new(id: PlayerId, channel: PlayerChannel) -> Self {
        Self {
            id,
            mark: Mark::for_player(id),
            channel,
        }
    }

    /// Queues a command for this player.
    pub fn send(&self, command: ClientCommand) {
        self.channel.send(command);
    }

    /// Closes this player's connection.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        self.channel.close(code, reason);
    }

    /// Connection the player is attached to.
    pub fn connection_id(&self) -> ConnectionId {
        self.channel.connection_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_follows_seat() {
        let (channel, _rx) = PlayerChannel::pair(7);
        assert_eq!(*Player::new(0, channel.clone()).mark(), Mark::X);
        assert_eq!(*Player::new(1, channel).mark(), Mark::O);
    }

    #[test]
    fn test_send_reaches_receiver() {
        let (channel, mut rx) = PlayerChannel::pair(1);
        let player = Player::new(0, channel);
        player.send(ClientCommand::GameBegins);
        player.close(CLOSE_NORMAL, "bye");
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Command(ClientCommand::GameBegins));
        assert_eq!(
            rx.try_recv().unwrap(),
            Outgoing::Close {
                code: CLOSE_NORMAL,
                reason: "bye".to_string()
            }
        );
    }

    #[test]
    fn test_send_after_receiver_dropped_is_harmless() {
        let (channel, rx) = PlayerChannel::pair(2);
        drop(rx);
        channel.send(ClientCommand::AskForPlay);
        channel.close(CLOSE_NORMAL, "gone");
    }
}
