//! Registry of live sessions.

use crate::config::MatchRules;
use crate::player::{ConnectionId, PlayerChannel};
use crate::session::{GameSession, MoveOutcome, SessionError, SessionId, SessionSummary};
use crosswire_game::PlayerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// A session shared between the connections seated in it.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Where a connection was seated.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct JoinTicket {
    /// Session joined.
    pub session_id: SessionId,
    /// Seat assigned.
    pub player_id: PlayerId,
}

#[derive(Debug)]
struct RegistryInner {
    sessions: Mutex<HashMap<SessionId, SharedSession>>,
    rules: MatchRules,
}

/// Maps session ids to sessions and seats new connections.
///
/// Cloning is cheap; every clone refers to the same sessions. Locks are
/// always taken registry first, session second.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    /// Creates an empty registry whose sessions play by `rules`.
    #[instrument]
    pub fn new(rules: MatchRules) -> Self {
        info!("Creating session registry");
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(HashMap::new()),
                rules,
            }),
        }
    }

    /// Seats a connection: in a session waiting for its second player if
    /// there is one, otherwise in a new session with a fresh id.
    #[instrument(skip(self, channel), fields(connection_id = channel.connection_id()))]
    pub async fn accept_connection(
        &self,
        channel: PlayerChannel,
    ) -> Result<JoinTicket, SessionError> {
        let mut sessions = self.inner.sessions.lock().await;

        for (id, shared) in sessions.iter() {
            let mut session = shared.lock().await;
            if session.player_count() == 1 {
                debug!(session_id = %id, "Found open session");
                let player_id = session.join(channel)?;
                return Ok(JoinTicket::new(id.clone(), player_id));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let mut session = GameSession::new(id.clone(), self.inner.rules);
        let player_id = session.join(channel)?;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        info!(session_id = %id, total = sessions.len(), "Created new session");
        Ok(JoinTicket::new(id, player_id))
    }

    async fn get(&self, session_id: &str) -> Option<SharedSession> {
        self.inner.sessions.lock().await.get(session_id).cloned()
    }

    /// Forwards a move to its session.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownSession`] if no such session exists, or
    /// whatever the session reports for the player.
    #[instrument(skip(self))]
    pub async fn route_move(
        &self,
        session_id: &str,
        player_id: PlayerId,
        cell: Option<usize>,
    ) -> Result<MoveOutcome, SessionError> {
        let shared = self
            .get(session_id)
            .await
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;

        let outcome = shared.lock().await.apply_move(player_id, cell)?;
        if let MoveOutcome::Ended(result) = outcome {
            debug!(?result, "Match finished");
            self.evict_if_empty(session_id).await;
        }
        Ok(outcome)
    }

    /// Unseats the player attached to `connection_id`, forfeiting an
    /// active match. Unknown sessions are ignored.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, session_id: &str, connection_id: ConnectionId) {
        let Some(shared) = self.get(session_id).await else {
            debug!("Session already gone");
            return;
        };
        let freed = shared.lock().await.leave(connection_id);
        if freed.is_some() {
            self.evict_if_empty(session_id).await;
        }
    }

    /// Drops a session that no longer seats anyone. Its id is not reused.
    async fn evict_if_empty(&self, session_id: &str) {
        let mut sessions = self.inner.sessions.lock().await;
        let empty = match sessions.get(session_id) {
            Some(shared) => shared.lock().await.player_count() == 0,
            None => false,
        };
        if empty {
            sessions.remove(session_id);
            info!(session_id, remaining = sessions.len(), "Evicted empty session");
        }
    }

    /// Number of registered sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.lock().await.len()
    }

    /// Snapshot of one session.
    pub async fn summary(&self, session_id: &str) -> Option<SessionSummary> {
        let shared = self.get(session_id).await?;
        let summary = shared.lock().await.summary();
        Some(summary)
    }

    /// Snapshots of every session, ordered by id.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.inner.sessions.lock().await;
        let mut out = Vec::with_capacity(sessions.len());
        for shared in sessions.values() {
            out.push(shared.lock().await.summary());
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = out.len(), "Listed sessions");
        out
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(MatchRules::default())
    }
}
