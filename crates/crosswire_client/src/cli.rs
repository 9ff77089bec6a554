//! Command-line interface for the terminal client.

use clap::Parser;

/// Play tic-tac-toe against another terminal over a crosswire server.
#[derive(Parser, Debug)]
#[command(name = "crosswire")]
#[command(about = "Terminal tic-tac-toe client", long_about = None)]
pub struct Cli {
    /// Server address
    #[arg(long, env = "CROSSWIRE_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Websocket path on the server
    #[arg(long, default_value = "/game")]
    pub path: String,
}

impl Cli {
    /// Websocket URL to dial.
    pub fn url(&self) -> String {
        format!("ws://{}{}", self.addr, self.path)
    }
}
