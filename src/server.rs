//! ChatServer command router
//!
//! Shared service object handed to every connection task. Holds the session
//! and group registries and turns one decoded request into a state change
//! plus an optional reply line.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::error::AppError;
use crate::group::GroupRegistry;
use crate::protocol::Request;
use crate::session::SessionRegistry;
use crate::types::Endpoint;
use crate::user::Outbound;

/// Reply sent when no group exists
pub const NO_GROUP: &str = "no group";

/// The chat service
///
/// Cheap to clone: every clone shares the same registries.
#[derive(Clone)]
pub struct ChatServer {
    sessions: Arc<SessionRegistry>,
    groups: Arc<GroupRegistry>,
    delivery_timeout: Duration,
    release_on_disconnect: bool,
}

impl ChatServer {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(config.auth.verify_password_on_relogin)),
            groups: Arc::new(GroupRegistry::new()),
            delivery_timeout: config.limits.delivery_timeout(),
            release_on_disconnect: config.server.release_on_disconnect,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Decode and process one input line
    ///
    /// Returns the reply line for the client, if any. Errors never escape:
    /// they become `error: ...` or conflict replies.
    pub async fn handle_line(
        &self,
        endpoint: &Endpoint,
        outbound: &Outbound,
        line: &str,
    ) -> Option<String> {
        debug!("{} -> {:?}", endpoint, line);

        let result = match Request::parse(line) {
            Ok(request) => self.dispatch(endpoint, outbound, request).await,
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Request from {} failed: {}", endpoint, e);
                Some(e.reply())
            }
        }
    }

    /// Process one decoded request
    pub async fn dispatch(
        &self,
        endpoint: &Endpoint,
        outbound: &Outbound,
        request: Request,
    ) -> Result<Option<String>, AppError> {
        match request {
            Request::Login {
                username,
                password,
                role,
            } => {
                self.sessions.login_or_register(
                    &username,
                    &password,
                    role,
                    endpoint,
                    outbound.clone(),
                )?;
                Ok(Some("login success".to_string()))
            }
            Request::CreateGroup { group } => {
                let requester = self.sessions.resolve_user(endpoint);
                self.groups.create(&group, requester.as_ref())?;
                Ok(Some("create group success".to_string()))
            }
            Request::GroupList => Ok(Some(self.group_list())),
            Request::JoinGroup { group } => {
                let username = self.require_login(endpoint)?;
                self.groups.join(&group, &username).await?;
                Ok(Some("join group success".to_string()))
            }
            Request::LeaveGroup { group } => {
                let username = self.require_login(endpoint)?;
                self.groups.leave(&group, &username).await?;
                Ok(Some("leave group success".to_string()))
            }
            Request::Message { group, body } => {
                Broadcaster::new(&self.sessions, &self.groups, self.delivery_timeout)
                    .send_group_message(endpoint, &group, &body)
                    .await?;
                Ok(None)
            }
            Request::Unknown { command } => {
                warn!("Unknown command from {}: {}", endpoint, command);
                Ok(None)
            }
        }
    }

    /// Clean up after a closed connection
    pub fn disconnect(&self, endpoint: &Endpoint) {
        if !self.release_on_disconnect {
            return;
        }
        if let Some(username) = self.sessions.logout(endpoint) {
            info!("Released session of '{}' after disconnect", username);
        }
        debug!(
            "Users online: {}, known: {}, groups: {}",
            self.sessions.online_count(),
            self.sessions.user_count(),
            self.groups.len()
        );
    }

    fn group_list(&self) -> String {
        let names = self.groups.list();
        if names.is_empty() {
            return NO_GROUP.to_string();
        }
        names.join("\t")
    }

    fn require_login(&self, endpoint: &Endpoint) -> Result<String, AppError> {
        self.sessions
            .resolve_user(endpoint)
            .map(|user| user.username)
            .ok_or(AppError::NotLoggedIn)
    }
}
