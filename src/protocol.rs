//! Line protocol definitions
//!
//! Each input line is split on single spaces. The first token selects the
//! line kind:
//!
//! ```text
//! f login <username> <password> <roleId>
//! f create_group <group>
//! f group_list
//! f join_group <group>
//! f leave_group <group>
//! m <group> <message...>
//! ```
//!
//! Decoding happens in two steps: [`Frame::decode`] checks the prefix and
//! token count, then [`Request::from_frame`] checks each command's arity
//! before any parameter is touched.

use thiserror::Error;

use crate::types::Role;

/// Malformed input errors
///
/// Reported to the offending client as `error: <description>`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{0} is command format invalid")]
    InvalidFormat(String),

    #[error("{0} is not command")]
    NotCommand(String),

    #[error("{command} requires {expected} params, got {got}")]
    MissingParams {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid role id: {0}")]
    InvalidRole(String),
}

/// Line kind selected by the first token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `f`: a command with a subcommand name
    Command,
    /// `m`: a group message
    Message,
}

impl Prefix {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "f" => Some(Prefix::Command),
            "m" => Some(Prefix::Message),
            _ => None,
        }
    }
}

/// A line split into its prefix and remaining tokens
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub prefix: Prefix,
    pub params: Vec<&'a str>,
}

impl<'a> Frame<'a> {
    pub fn decode(line: &'a str) -> Result<Self, ProtocolError> {
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() <= 1 {
            return Err(ProtocolError::InvalidFormat(line.to_string()));
        }
        let Some(prefix) = Prefix::parse(tokens[0]) else {
            return Err(ProtocolError::NotCommand(line.to_string()));
        };

        Ok(Self {
            prefix,
            params: tokens[1..].to_vec(),
        })
    }
}

/// Decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login {
        username: String,
        password: String,
        role: Role,
    },
    CreateGroup {
        group: String,
    },
    GroupList,
    JoinGroup {
        group: String,
    },
    LeaveGroup {
        group: String,
    },
    /// Group message; `body` is the rest of the line after the group name
    Message {
        group: String,
        body: String,
    },
    /// Subcommand nobody handles; logged and otherwise ignored
    Unknown {
        command: String,
    },
}

/// Known `f` subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subcommand {
    Login,
    CreateGroup,
    GroupList,
    JoinGroup,
    LeaveGroup,
}

impl Subcommand {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "login" => Some(Subcommand::Login),
            "create_group" => Some(Subcommand::CreateGroup),
            "group_list" => Some(Subcommand::GroupList),
            "join_group" => Some(Subcommand::JoinGroup),
            "leave_group" => Some(Subcommand::LeaveGroup),
            _ => None,
        }
    }

    /// Minimum parameter count
    fn arity(self) -> usize {
        match self {
            Subcommand::Login => 3,
            Subcommand::CreateGroup | Subcommand::JoinGroup | Subcommand::LeaveGroup => 1,
            Subcommand::GroupList => 0,
        }
    }
}

const MESSAGE_ARITY: usize = 2;

fn check_arity(command: &str, expected: usize, params: &[&str]) -> Result<(), ProtocolError> {
    if params.len() < expected {
        return Err(ProtocolError::MissingParams {
            command: command.to_string(),
            expected,
            got: params.len(),
        });
    }
    Ok(())
}

impl Request {
    /// Decode a full input line
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        Self::from_frame(Frame::decode(line)?)
    }

    pub fn from_frame(frame: Frame<'_>) -> Result<Self, ProtocolError> {
        match frame.prefix {
            Prefix::Message => {
                check_arity("m", MESSAGE_ARITY, &frame.params)?;
                Ok(Request::Message {
                    group: frame.params[0].to_string(),
                    body: frame.params[1..].join(" "),
                })
            }
            Prefix::Command => {
                let name = frame.params[0];
                let params = &frame.params[1..];
                let Some(command) = Subcommand::parse(name) else {
                    return Ok(Request::Unknown {
                        command: name.to_string(),
                    });
                };
                check_arity(name, command.arity(), params)?;
                Self::command(command, params)
            }
        }
    }

    fn command(command: Subcommand, params: &[&str]) -> Result<Self, ProtocolError> {
        let request = match command {
            Subcommand::Login => {
                let role_id = params[2]
                    .parse::<u8>()
                    .map_err(|_| ProtocolError::InvalidRole(params[2].to_string()))?;
                Request::Login {
                    username: params[0].to_string(),
                    password: params[1].to_string(),
                    role: Role::from_id(role_id),
                }
            }
            Subcommand::CreateGroup => Request::CreateGroup {
                group: params[0].to_string(),
            },
            Subcommand::GroupList => Request::GroupList,
            Subcommand::JoinGroup => Request::JoinGroup {
                group: params[0].to_string(),
            },
            Subcommand::LeaveGroup => Request::LeaveGroup {
                group: params[0].to_string(),
            },
        };
        Ok(request)
    }
}

/// Format a group message for delivery
pub fn format_group_message(from: &str, group: &str, body: &str) -> String {
    format!("from: {}, to: {}, message: {}", from, group, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login() {
        let request = Request::parse("f login alice secret 1").unwrap();
        assert_eq!(
            request,
            Request::Login {
                username: "alice".to_string(),
                password: "secret".to_string(),
                role: Role::Admin,
            }
        );
    }

    #[test]
    fn test_login_with_unusual_role_is_kept() {
        match Request::parse("f login bob pw 9").unwrap() {
            Request::Login { role, .. } => assert_eq!(role, Role::Other(9)),
            other => panic!("Wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_login_with_non_numeric_role() {
        let err = Request::parse("f login bob pw admin").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidRole("admin".to_string()));
    }

    #[test]
    fn test_message_body_keeps_spaces() {
        let request = Request::parse("m news hello  big world").unwrap();
        assert_eq!(
            request,
            Request::Message {
                group: "news".to_string(),
                body: "hello  big world".to_string(),
            }
        );
    }

    #[test]
    fn test_single_token_is_invalid_format() {
        let err = Request::parse("hello").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidFormat("hello".to_string()));
        assert_eq!(err.to_string(), "hello is command format invalid");
    }

    #[test]
    fn test_unknown_prefix() {
        let err = Request::parse("x login a b 1").unwrap_err();
        assert_eq!(err, ProtocolError::NotCommand("x login a b 1".to_string()));
    }

    #[test]
    fn test_missing_params_are_rejected() {
        let cases = [
            ("f login alice", "login", 3, 1),
            ("f login alice secret", "login", 3, 2),
            ("f create_group", "create_group", 1, 0),
            ("f join_group", "join_group", 1, 0),
            ("f leave_group", "leave_group", 1, 0),
            ("m news", "m", 2, 1),
        ];
        for (line, command, expected, got) in cases {
            let err = Request::parse(line).unwrap_err();
            assert_eq!(
                err,
                ProtocolError::MissingParams {
                    command: command.to_string(),
                    expected,
                    got,
                },
                "line: {}",
                line
            );
        }
    }

    #[test]
    fn test_group_list_takes_no_params() {
        assert_eq!(Request::parse("f group_list").unwrap(), Request::GroupList);
    }

    #[test]
    fn test_unknown_subcommand() {
        assert_eq!(
            Request::parse("f dance now").unwrap(),
            Request::Unknown {
                command: "dance".to_string()
            }
        );
    }

    #[test]
    fn test_format_group_message() {
        assert_eq!(
            format_group_message("alice", "news", "hello world"),
            "from: alice, to: news, message: hello world"
        );
    }
}
