//! Session registry
//!
//! Owns every `User` record and the endpoint → username binding.
//!
//! Lock order: a `users` entry may be held while touching `endpoints`, never
//! the other way round. No map guard is ever held across an `.await`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::AppError;
use crate::types::{Endpoint, Role};
use crate::user::{Outbound, User};

pub struct SessionRegistry {
    /// All known users: username -> User
    users: DashMap<String, User>,
    /// Logged-in connections: endpoint -> username
    endpoints: DashMap<Endpoint, String>,
    /// Reject repeat logins with a different password
    verify_password: bool,
}

impl SessionRegistry {
    pub fn new(verify_password: bool) -> Self {
        Self {
            users: DashMap::new(),
            endpoints: DashMap::new(),
            verify_password,
        }
    }

    /// Log a user in, registering it on first use
    ///
    /// Password and role only matter for a username seen for the first time;
    /// later logins keep the registered ones.
    pub fn login_or_register(
        &self,
        username: &str,
        password: &str,
        role: Role,
        endpoint: &Endpoint,
        outbound: Outbound,
    ) -> Result<(), AppError> {
        {
            let mut user = match self.users.entry(username.to_string()) {
                Entry::Occupied(entry) => entry.into_ref(),
                Entry::Vacant(entry) => {
                    info!("Registering user '{}' with role {:?}", username, role);
                    entry.insert(User::new(username.to_string(), password.to_string(), role))
                }
            };

            if user.is_logged_in() {
                debug!("User '{}' already logged in", username);
                return Err(AppError::AlreadyLoggedIn);
            }
            if self.verify_password && user.password != password {
                return Err(AppError::PasswordMismatch);
            }

            user.log_in(endpoint.clone(), outbound);
        }

        let previous = self.endpoints.insert(endpoint.clone(), username.to_string());

        // The same connection was bound to someone else; release that user
        if let Some(previous) = previous.filter(|p| p != username) {
            self.release_user(&previous, endpoint);
        }

        info!("User '{}' logged in from {}", username, endpoint);
        Ok(())
    }

    /// Look up the user logged in from `endpoint`
    pub fn resolve_user(&self, endpoint: &Endpoint) -> Option<User> {
        let username = self.endpoints.get(endpoint)?.value().clone();
        self.users.get(&username).map(|user| user.value().clone())
    }

    /// Outbound handle of a logged-in user
    pub fn outbound_of(&self, username: &str) -> Option<Outbound> {
        self.users
            .get(username)
            .and_then(|user| user.live_outbound().cloned())
    }

    /// Drop the binding of a closed connection
    ///
    /// Returns the username that was logged out, if any.
    pub fn logout(&self, endpoint: &Endpoint) -> Option<String> {
        let (_, username) = self.endpoints.remove(endpoint)?;
        if self.release_user(&username, endpoint) {
            info!("User '{}' logged out ({})", username, endpoint);
            Some(username)
        } else {
            None
        }
    }

    /// Log out `username` if its session belongs to `endpoint`
    fn release_user(&self, username: &str, endpoint: &Endpoint) -> bool {
        let Some(mut user) = self.users.get_mut(username) else {
            return false;
        };
        if user.endpoint.as_ref() != Some(endpoint) {
            return false;
        }
        user.log_out();
        true
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn online_count(&self) -> usize {
        self.endpoints.len()
    }
}
