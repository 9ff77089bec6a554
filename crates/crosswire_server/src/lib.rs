//! Crosswire server library - authoritative tic-tac-toe over websockets.
//!
//! # Architecture
//!
//! - **Player**: seat, mark and a non-blocking outbound channel
//! - **Session**: one board and two seats; validates moves, alternates
//!   turns and ends matches
//! - **Registry**: pairs incoming connections into sessions and routes moves
//! - **Transport**: axum websocket endpoint translating frames to commands
//!
//! # Example
//!
//! ```no_run
//! use crosswire_server::{ServerConfig, serve};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! serve(listener, &config).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod player;
mod registry;
mod session;
mod transport;

// Crate-level exports - Configuration
pub use config::{ConfigError, MatchRules, Overrides, ServerConfig, TurnOrder};

// Crate-level exports - Players
pub use player::{CLOSE_NORMAL, CLOSE_POLICY, ConnectionId, Outgoing, Player, PlayerChannel};

// Crate-level exports - Sessions
pub use registry::{JoinTicket, SessionRegistry, SharedSession};
pub use session::{
    DRAW_TEXT, FORFEIT_TEXT, GameResult, GameSession, LOSE_TEXT, MoveOutcome, Rejection,
    SessionError, SessionId, SessionPhase, SessionSummary, WIN_TEXT,
};

// Crate-level exports - Transport
pub use transport::{AppState, Connection, Flow, router, serve};
