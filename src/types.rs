//! Basic type definitions for the chat server
//!
//! - `Endpoint`: remote address of a connection, the key of the login binding
//! - `Role`: numeric role id carried by `f login`
//! - `LoginState`: whether a user currently holds a session

use std::net::SocketAddr;

/// Remote endpoint of a connection (newtype pattern)
///
/// Identifies which connection a command came from. Only valid while the
/// connection is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(pub String);

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl From<&str> for Endpoint {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User role
///
/// Ids other than 1 and 2 are kept verbatim and treated as non-admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
    Other(u8),
}

impl Role {
    pub const ADMIN_ID: u8 = 1;
    pub const MEMBER_ID: u8 = 2;

    pub fn from_id(id: u8) -> Self {
        match id {
            Self::ADMIN_ID => Role::Admin,
            Self::MEMBER_ID => Role::Member,
            other => Role::Other(other),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    LoggedOut,
    LoggedIn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_id() {
        assert_eq!(Role::from_id(1), Role::Admin);
        assert_eq!(Role::from_id(2), Role::Member);
        assert_eq!(Role::from_id(7), Role::Other(7));
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Member.is_admin());
        assert!(!Role::Other(0).is_admin());
    }

    #[test]
    fn test_endpoint_from_socket_addr() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(Endpoint::from(addr), Endpoint::from("127.0.0.1:4000"));
    }
}
