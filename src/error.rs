//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use std::io::ErrorKind;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

use crate::protocol::ProtocolError;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and business errors.
/// The Display text of a business error is exactly the line sent back to
/// the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (fatal unless it is an overlong line)
    #[error("codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// Malformed input line
    #[error("error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connection has no logged-in user
    #[error("user not login")]
    NotLoggedIn,

    /// Admin role required
    #[error("user not admin")]
    NotAdmin,

    /// Username already holds a session
    #[error("user already login")]
    AlreadyLoggedIn,

    /// Password differs from the registered one
    #[error("password incorrect")]
    PasswordMismatch,

    /// Group name already taken
    #[error("group already exist")]
    GroupExists,

    /// No group with the given name
    #[error("group not exist")]
    GroupNotFound,

    /// Requester is not in the group
    #[error("user not in this group")]
    NotMember,
}

impl AppError {
    /// Whether this error ends the connection
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Io(_) => true,
            AppError::Codec(LinesCodecError::Io(e)) => e.kind() != ErrorKind::InvalidData,
            _ => false,
        }
    }

    /// Reply line for the client
    pub fn reply(&self) -> String {
        match self {
            AppError::Codec(LinesCodecError::MaxLineLengthExceeded) => {
                "error: line too long".to_string()
            }
            // LinesCodec reports a non UTF-8 line as InvalidData
            AppError::Codec(LinesCodecError::Io(e)) if e.kind() == ErrorKind::InvalidData => {
                "error: invalid utf-8".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Message send errors
///
/// Occurs when delivering a line to one connection's outbound queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("channel closed")]
    ChannelClosed,

    /// The queue stayed full for the whole delivery timeout
    #[error("delivery timed out")]
    Timeout,
}
