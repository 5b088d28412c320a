//! The two-step authentication exchange: credential login, then workspace
//! login to scope the session cookie to an operational workspace.

use std::sync::Arc;

use serde_json::{json, Value};

use drover_core::get_path_string;

use crate::routes::RouteTable;
use crate::session::{Actor, SessionError};
use crate::transport::{ApiCall, ApiTransport};

const WORKSPACE_ID_PATH: &str = "user.workspace.0.urmId";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Result of the first login call: the pre-workspace cookie plus the
/// workspace the account belongs to.
#[derive(Debug, Clone)]
pub struct AuthHandshake {
    pub cookie: String,
    pub workspace_id: String,
    pub response: Value,
    pub status_code: u16,
}

/// Result of the workspace login call: the workspace-scoped cookie that every
/// subsequent call for this actor must carry.
#[derive(Debug, Clone)]
pub struct WorkspaceHandshake {
    pub cookie: String,
    pub response: Value,
    pub status_code: u16,
}

pub struct AuthClient {
    transport: Arc<dyn ApiTransport>,
    routes: RouteTable,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn ApiTransport>, routes: RouteTable) -> Self {
        Self { transport, routes }
    }

    pub fn login(
        &self,
        actor: Actor,
        credentials: &Credentials,
    ) -> Result<AuthHandshake, SessionError> {
        let endpoint = match actor {
            Actor::Admin => &self.routes.login,
            Actor::Rider => &self.routes.rider_login,
        };
        let outcome = self.transport.execute(ApiCall::post(
            endpoint,
            json!({
                "username": credentials.username,
                "password": credentials.password,
            }),
        ))?;

        let cookie = outcome
            .cookie_header()
            .ok_or(SessionError::MissingCookie { actor })?;
        let workspace_id = get_path_string(&outcome.body, WORKSPACE_ID_PATH)
            .ok_or(SessionError::MissingWorkspaceId { actor })?;

        tracing::info!(
            actor = actor.as_str(),
            username = credentials.username,
            "login successful"
        );
        Ok(AuthHandshake {
            cookie,
            workspace_id,
            response: outcome.body,
            status_code: outcome.status_code,
        })
    }

    pub fn workspace_login(
        &self,
        actor: Actor,
        workspace_id: &str,
        cookie: &str,
    ) -> Result<WorkspaceHandshake, SessionError> {
        let base = match actor {
            Actor::Admin => &self.routes.workspace_login,
            Actor::Rider => &self.routes.rider_workspace_login,
        };
        let endpoint = format!("{base}/{workspace_id}");
        let outcome = self
            .transport
            .execute(ApiCall::patch(endpoint).with_cookie(cookie))?;

        let cookie = outcome
            .cookie_header()
            .ok_or(SessionError::MissingCookie { actor })?;

        tracing::info!(actor = actor.as_str(), workspace_id, "workspace login successful");
        Ok(WorkspaceHandshake {
            cookie,
            response: outcome.body,
            status_code: outcome.status_code,
        })
    }

    pub fn logout(&self, actor: Actor, cookie: &str) -> Result<u16, SessionError> {
        let endpoint = match actor {
            Actor::Admin => &self.routes.logout,
            Actor::Rider => &self.routes.rider_logout,
        };
        let outcome = self
            .transport
            .execute(ApiCall::new(reqwest::Method::POST, endpoint).with_cookie(cookie))?;
        tracing::info!(actor = actor.as_str(), "logout completed");
        Ok(outcome.status_code)
    }
}
