//! User record and outbound handle
//!
//! A `User` is created on first login and lives for the whole process.
//! While logged in it carries an [`Outbound`] handle to the connection's
//! writer task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::error::SendError;
use crate::types::{Endpoint, LoginState, Role};

/// Server → client line channel
///
/// Cloneable sender side of a connection's outbound queue. The connection's
/// writer task drains the queue to the socket.
#[derive(Debug, Clone)]
pub struct Outbound {
    sender: mpsc::Sender<String>,
}

impl Outbound {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }

    /// Queue a line, waiting as long as the queue is full
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, line: String) -> Result<(), SendError> {
        self.sender
            .send(line)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Queue a line, giving up after `timeout`
    pub async fn deliver(&self, line: String, timeout: Duration) -> Result<(), SendError> {
        self.sender
            .send_timeout(line, timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => SendError::Timeout,
                SendTimeoutError::Closed(_) => SendError::ChannelClosed,
            })
    }

    /// Whether both handles feed the same connection
    pub fn same_channel(&self, other: &Outbound) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// Registered user
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    /// Compared in plain text
    pub password: String,
    pub role: Role,
    pub state: LoginState,
    /// Endpoint of the current session (None while logged out)
    pub endpoint: Option<Endpoint>,
    /// Outbound handle of the current session (None while logged out)
    pub outbound: Option<Outbound>,
}

impl User {
    /// Create a logged-out user record
    pub fn new(username: String, password: String, role: Role) -> Self {
        Self {
            username,
            password,
            role,
            state: LoginState::LoggedOut,
            endpoint: None,
            outbound: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == LoginState::LoggedIn
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Bind a session to this user
    pub fn log_in(&mut self, endpoint: Endpoint, outbound: Outbound) {
        self.state = LoginState::LoggedIn;
        self.endpoint = Some(endpoint);
        self.outbound = Some(outbound);
    }

    /// Drop the current session
    pub fn log_out(&mut self) {
        self.state = LoginState::LoggedOut;
        self.endpoint = None;
        self.outbound = None;
    }

    /// Outbound handle, if a session is live
    pub fn live_outbound(&self) -> Option<&Outbound> {
        if !self.is_logged_in() {
            return None;
        }
        self.outbound.as_ref()
    }
}
