//! Game sessions: one board, up to two seated players, and the turn loop
//! that decides who is prompted next.

use crate::config::MatchRules;
use crate::player::{CLOSE_NORMAL, ConnectionId, Player, PlayerChannel};
use crosswire_game::protocol::ClientCommand;
use crosswire_game::{Board, PlaceError, PlayerId, SEATS};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Message for the player who completed a line.
pub const WIN_TEXT: &str = "You won!";
/// Message for the other player.
pub const LOSE_TEXT: &str = "You lose!";
/// Message for both players when the board fills without a line.
pub const DRAW_TEXT: &str = "It's a draw!";
/// Message for the player left behind when the opponent disconnects.
pub const FORFEIT_TEXT: &str = "Your opponent left. You won!";

/// Errors surfaced to the transport. Each one ends the offending
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// Both seats are taken.
    #[display("Session {} is full", _0)]
    SessionFull(SessionId),

    /// No player with this seat in the session.
    #[display("Unknown player {}", _0)]
    UnknownPlayer(PlayerId),

    /// No session with this id.
    #[display("Unknown session {}", _0)]
    UnknownSession(SessionId),

    /// The connection sent a move before joining.
    #[display("Connection has not joined a session")]
    NotSeated,
}

impl std::error::Error for SessionError {}

/// Lifecycle phase, derived from the number of seated players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Fewer than two players; waiting for joins.
    Open,
    /// Both seats filled; a move is awaited.
    Active,
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// A player completed a line.
    Won(PlayerId),
    /// The board filled without a line.
    Draw,
    /// The opponent disconnected mid-match.
    Forfeit {
        /// Player left in the session.
        winner: PlayerId,
    },
}

/// Why a move was refused. The mover is told with `WRONG_MOVE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The match has not started.
    NotStarted,
    /// The other player is to move.
    NotYourTurn,
    /// Cell outside the board, or not a number.
    InvalidIndex,
    /// Cell already marked.
    CellOccupied(usize),
}

/// Result of [`GameSession::apply_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Mark placed; the next player has been prompted.
    Placed {
        /// Seat prompted next.
        next: PlayerId,
    },
    /// Mark placed and the match is over; the session has been reset.
    Ended(GameResult),
    /// Board unchanged.
    Rejected(Rejection),
}

enum TurnState {
    Prompted(PlayerId),
    Ended(GameResult),
}

/// Serializable view of a session for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// Current phase.
    pub phase: SessionPhase,
    /// Seats currently taken.
    pub players: Vec<PlayerId>,
    /// Moves made on the current board.
    pub turn_number: u32,
    /// Matches completed in this session.
    pub matches_played: u32,
}

/// One match instance: the authoritative board plus the seated players.
///
/// All methods are synchronous. Sends are pushes onto unbounded channels,
/// so a caller holding the session lock never waits on the network.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    players: BTreeMap<PlayerId, Player>,
    board: Board,
    rules: MatchRules,
    matches_played: u32,
}

impl GameSession {
    /// Creates an empty session.
    #[instrument(skip(id), fields(session_id = %id))]
    pub fn new(id: SessionId, rules: MatchRules) -> Self {
        info!("Creating new game session");
        Self {
            id,
            players: BTreeMap::new(),
            board: Board::new(),
            rules,
            matches_played: 0,
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of seated players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Seated player by seat.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        if self.players.len() < SEATS {
            SessionPhase::Open
        } else {
            SessionPhase::Active
        }
    }

    /// Seat whose turn it is on the current board.
    pub fn next_mover(&self) -> PlayerId {
        self.rules.turn_order.mover(self.board.turn_number())
    }

    /// Diagnostic snapshot.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            phase: self.phase(),
            players: self.players.keys().copied().collect(),
            turn_number: self.board.turn_number(),
            matches_played: self.matches_played,
        }
    }

    /// Seats a new player in the lowest free seat and sends it
    /// `PLAYER_ADDED`. Starts the match once both seats are filled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionFull`] if both seats are taken.
    #[instrument(
        skip(self, channel),
        fields(session_id = %self.id, connection_id = channel.connection_id())
    )]
    pub fn join(&mut self, channel: PlayerChannel) -> Result<PlayerId, SessionError> {
        let seat = (0..SEATS as PlayerId)
            .find(|seat| !self.players.contains_key(seat))
            .ok_or_else(|| {
                warn!("Session already has 2 players");
                SessionError::SessionFull(self.id.clone())
            })?;

        let player = Player::new(seat, channel);
        info!(player_id = seat, mark = ?player.mark(), "Player joined");
        player.send(ClientCommand::player_added(seat, self.id.clone()));
        self.players.insert(seat, player);

        self.maybe_begin();
        Ok(seat)
    }

    fn maybe_begin(&mut self) {
        if self.players.len() < SEATS {
            debug!(players = self.players.len(), "Waiting for opponent");
            return;
        }
        info!(session_id = %self.id, "Game begins");
        for player in self.players.values() {
            player.send(ClientCommand::GameBegins);
        }
        self.advance_turn();
    }

    /// Ends the match if the board is terminal, otherwise prompts the
    /// player to move and tells the other one to wait.
    fn advance_turn(&mut self) -> TurnState {
        if let Some(winner) = self.board.winner() {
            self.end_game(winner);
            return TurnState::Ended(GameResult::Won(winner));
        }
        if self.board.is_full() {
            self.end_in_draw();
            return TurnState::Ended(GameResult::Draw);
        }

        let mover = self.next_mover();
        debug!(
            session_id = %self.id,
            player_id = mover,
            turn = self.board.turn_number(),
            "Asking for play"
        );
        for player in self.players.values() {
            if *player.id() == mover {
                player.send(ClientCommand::display_board(self.board.fields()));
                player.send(ClientCommand::AskForPlay);
            } else {
                player.send(ClientCommand::WaitForMove);
            }
        }
        TurnState::Prompted(mover)
    }

    /// Applies a move from `player_id` to `cell`.
    ///
    /// `cell` is `None` when the client sent something that is not a cell
    /// number. Rejected moves leave the board untouched: the mover gets
    /// `WRONG_MOVE` and is prompted again (or told to keep waiting, if it
    /// was not their turn).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownPlayer`] if no player holds that seat.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn apply_move(
        &mut self,
        player_id: PlayerId,
        cell: Option<usize>,
    ) -> Result<MoveOutcome, SessionError> {
        let Some(player) = self.players.get(&player_id) else {
            warn!("Player could not be found");
            return Err(SessionError::UnknownPlayer(player_id));
        };
        let mark = *player.mark();

        if self.phase() == SessionPhase::Open {
            player.send(ClientCommand::wrong_move("Waiting for an opponent to join."));
            return Ok(MoveOutcome::Rejected(Rejection::NotStarted));
        }

        if self.rules.enforce_turns && self.next_mover() != player_id {
            warn!(expected = self.next_mover(), "Player tried to move out of turn");
            player.send(ClientCommand::wrong_move("It is not your turn."));
            player.send(ClientCommand::WaitForMove);
            return Ok(MoveOutcome::Rejected(Rejection::NotYourTurn));
        }

        let Some(index) = cell else {
            info!("Move is not a cell number");
            player.send(ClientCommand::wrong_move("Wrong move. Pick a cell from 0 to 8."));
            self.advance_turn();
            return Ok(MoveOutcome::Rejected(Rejection::InvalidIndex));
        };

        let rejection = match self.board.place(index, mark) {
            Ok(()) => {
                info!(cell = index, turn = self.board.turn_number(), "Move placed");
                return Ok(match self.advance_turn() {
                    TurnState::Prompted(next) => MoveOutcome::Placed { next },
                    TurnState::Ended(result) => MoveOutcome::Ended(result),
                });
            }
            Err(PlaceError::CellOccupied(index)) => {
                info!(cell = index, "Move cannot be placed, cell is taken");
                player.send(ClientCommand::wrong_move(format!(
                    "Wrong move {index}. It is blocked already."
                )));
                Rejection::CellOccupied(index)
            }
            Err(PlaceError::InvalidIndex(index)) => {
                info!(cell = index, "Move is off the board");
                player.send(ClientCommand::wrong_move(format!(
                    "Wrong move {index}. Pick a cell from 0 to 8."
                )));
                Rejection::InvalidIndex
            }
            Err(e @ PlaceError::InvalidMark) => {
                error!(error = %e, "Seated player holds no mark");
                player.send(ClientCommand::wrong_move("Wrong move."));
                Rejection::InvalidIndex
            }
        };

        self.advance_turn();
        Ok(MoveOutcome::Rejected(rejection))
    }

    fn end_game(&mut self, winner: PlayerId) {
        info!(session_id = %self.id, winner, "Game won");
        for player in self.players.values() {
            let text = if *player.id() == winner { WIN_TEXT } else { LOSE_TEXT };
            player.send(ClientCommand::game_ends(text));
        }
        self.reset();
    }

    fn end_in_draw(&mut self) {
        info!(session_id = %self.id, "Game drawn");
        for player in self.players.values() {
            player.send(ClientCommand::game_ends(DRAW_TEXT));
        }
        self.reset();
    }

    /// Closes every connection, unseats all players and clears the board.
    fn reset(&mut self) {
        for player in self.players.values() {
            player.close(CLOSE_NORMAL, "game over");
        }
        self.players.clear();
        self.board = Board::new();
        self.matches_played += 1;
        debug!(session_id = %self.id, "Session reset");
    }

    /// Unseats whoever is attached to `connection_id`.
    ///
    /// Leaving an active match forfeits it: the remaining player wins and
    /// the session resets. Returns the seat that was freed, or `None` if
    /// the connection held no seat here (for example, because the match
    /// already ended).
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn leave(&mut self, connection_id: ConnectionId) -> Option<PlayerId> {
        let seat = self
            .players
            .values()
            .find(|p| p.connection_id() == connection_id)
            .map(|p| *p.id())?;

        let was_active = self.phase() == SessionPhase::Active;
        self.players.remove(&seat);
        info!(player_id = seat, was_active, "Player left");

        if was_active {
            if let Some(remaining) = self.players.values().next() {
                info!(winner = *remaining.id(), "Game forfeited");
                remaining.send(ClientCommand::game_ends(FORFEIT_TEXT));
            }
            self.reset();
        }
        Some(seat)
    }
}
