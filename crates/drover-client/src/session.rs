//! Per-actor session state for a workflow run.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthClient, Credentials};
use crate::transport::TransportError;

/// The two actors a workflow run authenticates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Admin,
    Rider,
}

impl Actor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Rider => "rider",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport failure during authentication: {0}")]
    Transport(#[from] TransportError),
    #[error("{} authentication did not yield a session cookie", .actor.as_str())]
    MissingCookie { actor: Actor },
    #[error("{} authentication did not yield a workspace id", .actor.as_str())]
    MissingWorkspaceId { actor: Actor },
    #[error("session for {} is missing required field '{field}'", .actor.as_str())]
    Incomplete { actor: Actor, field: &'static str },
}

/// A workspace-scoped authenticated session. Construction enforces the
/// invariant that cookie and workspace id are non-empty; an `Actor` value is
/// total by construction.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub cookie: String,
    pub workspace_id: String,
    pub login_response: Value,
    pub workspace_response: Value,
}

impl Session {
    pub fn new(
        actor: Actor,
        cookie: String,
        workspace_id: String,
        login_response: Value,
        workspace_response: Value,
    ) -> Result<Self, SessionError> {
        if cookie.is_empty() {
            return Err(SessionError::Incomplete {
                actor,
                field: "cookie",
            });
        }
        if workspace_id.is_empty() {
            return Err(SessionError::Incomplete {
                actor,
                field: "workspace_id",
            });
        }
        Ok(Self {
            actor,
            cookie,
            workspace_id,
            login_response,
            workspace_response,
        })
    }
}

/// Owns at most one live session per actor. Sessions are created eagerly on
/// request and torn down best-effort: a failed logout is logged, never fatal.
pub struct SessionManager {
    auth: AuthClient,
    active: HashMap<Actor, Session>,
}

impl SessionManager {
    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth,
            active: HashMap::new(),
        }
    }

    /// Runs the full login + workspace-login exchange for `actor` and stores
    /// the resulting session, replacing any previous one.
    pub fn create_session(
        &mut self,
        actor: Actor,
        credentials: &Credentials,
    ) -> Result<&Session, SessionError> {
        tracing::info!(actor = actor.as_str(), "creating session");
        let handshake = self.auth.login(actor, credentials)?;
        let workspace =
            self.auth
                .workspace_login(actor, &handshake.workspace_id, &handshake.cookie)?;

        let session = Session::new(
            actor,
            workspace.cookie,
            handshake.workspace_id,
            handshake.response,
            workspace.response,
        )?;
        tracing::info!(actor = actor.as_str(), "session created");
        self.active.insert(actor, session);
        Ok(&self.active[&actor])
    }

    pub fn session(&self, actor: Actor) -> Option<&Session> {
        self.active.get(&actor)
    }

    /// Best-effort logout. Returns whether a session existed and was torn
    /// down cleanly.
    pub fn logout_session(&mut self, actor: Actor) -> bool {
        let Some(session) = self.active.remove(&actor) else {
            tracing::warn!(actor = actor.as_str(), "no active session to log out");
            return false;
        };
        match self.auth.logout(actor, &session.cookie) {
            Ok(_) => {
                tracing::info!(actor = actor.as_str(), "logout completed");
                true
            }
            Err(error) => {
                tracing::warn!(actor = actor.as_str(), %error, "logout failed");
                false
            }
        }
    }

    /// Tears down every remaining session, admin last.
    pub fn logout_all(&mut self) {
        for actor in [Actor::Rider, Actor::Admin] {
            if self.active.contains_key(&actor) {
                self.logout_session(actor);
            }
        }
    }
}
