//! Websocket transport: turns frames into commands for the registry and
//! drains each connection's outbound queue onto its socket.

use crate::config::ServerConfig;
use crate::player::{CLOSE_POLICY, ConnectionId, Outgoing, PlayerChannel};
use crate::registry::{JoinTicket, SessionRegistry};
use crate::session::{MoveOutcome, SessionError, SessionSummary};
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use crosswire_game::protocol::{
    ProtocolError, ServerCommand, UserMove, decode_server_command, encode,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: SessionRegistry,
    next_connection: Arc<AtomicU64>,
}

impl AppState {
    /// Wraps a registry.
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            registry,
            next_connection: Arc::new(AtomicU64::new(1)),
        }
    }

    fn connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }
}

/// Builds the HTTP router: the websocket endpoint at the configured path
/// and a JSON listing of sessions at `/sessions`.
pub fn router(config: &ServerConfig, registry: SessionRegistry) -> Router {
    Router::new()
        .route(config.path(), get(game_socket))
        .route("/sessions", get(list_sessions))
        .with_state(AppState::new(registry))
}

/// Serves the router on an already bound listener until the process exits.
#[instrument(skip_all, fields(path = %config.path()))]
pub async fn serve(listener: TcpListener, config: &ServerConfig) -> std::io::Result<()> {
    let registry = SessionRegistry::new(config.rules());
    let app = router(config, registry);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Server ready");
    }
    axum::serve(listener, app).await
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.registry.list().await)
}

async fn game_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let connection_id = state.connection_id();
    debug!(connection_id, "Upgrading connection");
    ws.on_upgrade(move |socket| handle_socket(socket, state.registry, connection_id))
}

#[instrument(skip(socket, registry))]
async fn handle_socket(socket: WebSocket, registry: SessionRegistry, connection_id: ConnectionId) {
    info!("Connection opened");
    let (sink, mut stream) = socket.split();
    let (channel, outbound) = PlayerChannel::pair(connection_id);
    tokio::spawn(write_loop(sink, outbound, connection_id));

    let mut connection = Connection::new(channel, registry);
    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Read failed");
                break;
            }
        };
        let flow = match message {
            Message::Text(text) => connection.handle_frame(text.as_str()).await,
            Message::Binary(_) => {
                connection.reject(ProtocolError::Malformed("binary frame".into()))
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => Flow::Continue,
        };
        if flow == Flow::Close {
            break;
        }
    }

    connection.finish().await;
    info!("Connection closed");
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<Outgoing>,
    connection_id: ConnectionId,
) {
    while let Some(out) = outbound.recv().await {
        match out {
            Outgoing::Command(command) => {
                let text = match encode(&command) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(connection_id, error = %e, "Dropping unencodable command");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!(connection_id, error = %e, "Delivery failed");
                    break;
                }
            }
            Outgoing::Close { code, reason } => {
                let frame = CloseFrame {
                    code,
                    reason: reason.into(),
                };
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    debug!(connection_id, error = %e, "Close frame not delivered");
                }
                break;
            }
        }
    }
    debug!(connection_id, "Writer finished");
}

/// Whether a connection's read loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next frame.
    Continue,
    /// Stop reading; a close has been queued.
    Close,
}

/// Per-connection protocol state, independent of the socket.
#[derive(Debug)]
pub struct Connection {
    channel: PlayerChannel,
    registry: SessionRegistry,
    seat: Option<JoinTicket>,
}

impl Connection {
    /// Creates a connection that has not joined a session yet.
    pub fn new(channel: PlayerChannel, registry: SessionRegistry) -> Self {
        Self {
            channel,
            registry,
            seat: None,
        }
    }

    /// Where this connection is seated, if anywhere.
    pub fn seat(&self) -> Option<&JoinTicket> {
        self.seat.as_ref()
    }

    /// Handles one text frame.
    #[instrument(skip(self, frame), fields(connection_id = self.channel.connection_id()))]
    pub async fn handle_frame(&mut self, frame: &str) -> Flow {
        match decode_server_command(frame) {
            Ok(command) => {
                debug!(command = %command.name(), "Received command");
                self.dispatch(command).await
            }
            Err(ProtocolError::UnknownCommand(name)) => {
                warn!(%name, "Unknown command");
                Flow::Continue
            }
            Err(e) => self.reject(e),
        }
    }

    async fn dispatch(&mut self, command: ServerCommand) -> Flow {
        match command {
            ServerCommand::AddNewPlayer => {
                if let Some(seat) = &self.seat {
                    warn!(
                        session_id = %seat.session_id,
                        "Connection already seated, ignoring join"
                    );
                    return Flow::Continue;
                }
                match self.registry.accept_connection(self.channel.clone()).await {
                    Ok(ticket) => {
                        info!(
                            session_id = %ticket.session_id,
                            player_id = ticket.player_id,
                            "Seated"
                        );
                        self.seat = Some(ticket);
                        Flow::Continue
                    }
                    Err(e) => self.reject(e),
                }
            }
            ServerCommand::UserMove(mv) => self.user_move(mv).await,
        }
    }

    async fn user_move(&mut self, mv: UserMove) -> Flow {
        let Some(seat) = &self.seat else {
            return self.reject(SessionError::NotSeated);
        };
        if seat.session_id != mv.session_id {
            return self.reject(SessionError::UnknownSession(mv.session_id));
        }
        if seat.player_id != mv.id {
            return self.reject(SessionError::UnknownPlayer(mv.id));
        }

        let routed = self
            .registry
            .route_move(&mv.session_id, mv.id, mv.cell_index())
            .await;
        match routed {
            Ok(MoveOutcome::Ended(result)) => {
                debug!(?result, "Match over for this connection");
                self.seat = None;
                Flow::Continue
            }
            Ok(outcome) => {
                debug!(?outcome, "Move handled");
                Flow::Continue
            }
            Err(e) => self.reject(e),
        }
    }

    /// Closes the connection with `error` as the reason.
    pub fn reject(&self, error: impl std::error::Error) -> Flow {
        warn!(connection_id = self.channel.connection_id(), error = %error, "Closing connection");
        self.channel.close(CLOSE_POLICY, error.to_string());
        Flow::Close
    }

    /// Releases the seat held by this connection, if any.
    pub async fn finish(self) {
        if let Some(seat) = self.seat {
            self.registry
                .disconnect(&seat.session_id, self.channel.connection_id())
                .await;
        }
    }
}
