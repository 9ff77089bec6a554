//! Command-line interface for the crosswire server.

use clap::Parser;
use crosswire_server::{Overrides, TurnOrder};

/// Crosswire - websocket tic-tac-toe server
#[derive(Parser, Debug)]
#[command(name = "crosswire_server")]
#[command(
    about = "Pairs connecting players and referees their tic-tac-toe matches",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "CROSSWIRE_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// HTTP path of the websocket endpoint
    #[arg(long)]
    pub path: Option<String>,

    /// Which player opens each match
    #[arg(long, value_enum)]
    pub turn_order: Option<TurnOrder>,

    /// Accept moves from the player who is not on turn
    #[arg(long)]
    pub allow_out_of_turn: bool,
}

impl Cli {
    /// Config overrides given on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            path: self.path.clone(),
            turn_order: self.turn_order,
            enforce_turns: self.allow_out_of_turn.then_some(false),
        }
    }
}
