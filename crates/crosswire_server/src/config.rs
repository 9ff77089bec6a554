//! Server configuration.

use crosswire_game::PlayerId;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Which seat moves at a given turn number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrder {
    /// Even turn numbers belong to player 1, so player 1 opens the match.
    /// Matches the behavior existing clients were written against.
    #[default]
    Legacy,
    /// Even turn numbers belong to player 0, so player 0 opens the match.
    PlayerZeroFirst,
}

impl TurnOrder {
    /// Returns the seat that moves when `turn_number` moves have been made.
    pub fn mover(self, turn_number: u32) -> PlayerId {
        let even = turn_number % 2 == 0;
        match (self, even) {
            (TurnOrder::Legacy, true) | (TurnOrder::PlayerZeroFirst, false) => 1,
            (TurnOrder::Legacy, false) | (TurnOrder::PlayerZeroFirst, true) => 0,
        }
    }
}

/// Rules every session in a server plays by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    /// Opening-move rule.
    pub turn_order: TurnOrder,
    /// Reject moves from the player who is not on turn.
    pub enforce_turns: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            turn_order: TurnOrder::default(),
            enforce_turns: true,
        }
    }
}

/// Command-line overrides layered on top of a [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Interface to bind.
    pub host: Option<String>,
    /// TCP port.
    pub port: Option<u16>,
    /// Websocket path.
    pub path: Option<String>,
    /// Opening-move rule.
    pub turn_order: Option<TurnOrder>,
    /// Turn enforcement.
    pub enforce_turns: Option<bool>,
}

/// Runtime settings for the server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    port: u16,

    /// HTTP path of the websocket endpoint.
    #[serde(default = "default_path")]
    path: String,

    /// Opening-move rule for new matches.
    #[serde(default)]
    turn_order: TurnOrder,

    /// Reject moves from the player who is not on turn.
    #[serde(default = "default_enforce_turns")]
    enforce_turns: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/game".to_string()
}

fn default_enforce_turns() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            turn_order: TurnOrder::default(),
            enforce_turns: default_enforce_turns(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(port = config.port, path = %config.path, "Config loaded successfully");
        Ok(config)
    }

    /// Returns a copy with the given overrides applied.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = overrides.path {
            self.path = path;
        }
        if let Some(turn_order) = overrides.turn_order {
            self.turn_order = turn_order;
        }
        if let Some(enforce_turns) = overrides.enforce_turns {
            self.enforce_turns = enforce_turns;
        }
        self.validate()?;
        Ok(self)
    }

    /// Rules for sessions created by this server.
    pub fn rules(&self) -> MatchRules {
        MatchRules {
            turn_order: self.turn_order,
            enforce_turns: self.enforce_turns,
        }
    }

    /// `host:port` string suitable for binding a listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.path.starts_with('/') {
            return Err(ConfigError::new(format!(
                "Websocket path must start with '/': {}",
                self.path
            )));
        }
        if self.path == "/sessions" {
            return Err(ConfigError::new("Websocket path collides with /sessions"));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
