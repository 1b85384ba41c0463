//! Line-based Group Chat Server Library
//!
//! A small TCP chat server: clients log in, admins create named groups,
//! users join groups and broadcast text lines to the other members.
//!
//! # Protocol
//! Newline-delimited text, one command per line:
//! - `f login <username> <password> <roleId>` (1 = admin, 2 = member)
//! - `f create_group <group>` (admin only)
//! - `f group_list`
//! - `f join_group <group>`
//! - `f leave_group <group>`
//! - `m <group> <message...>`
//!
//! # Architecture
//! Shared state behind two registries owned by [`ChatServer`]:
//! - [`SessionRegistry`]: users, login state, endpoint bindings
//! - [`GroupRegistry`]: groups, each with its own `RwLock`ed member set
//!
//! Each connection runs a `handler` task plus a write task; any task may push
//! lines into another connection's outbound queue during a broadcast.
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use group_chat_server::{handle_connection, ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let listener = TcpListener::bind(&config.server.listen).await.unwrap();
//!     let server = ChatServer::new(&config);
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let server = server.clone();
//!         tokio::spawn(handle_connection(stream, server, config.limits.clone()));
//!     }
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod group;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod session;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use broadcast::{Broadcaster, DeliveryReport};
pub use config::{Config, ConfigError};
pub use error::{AppError, SendError};
pub use group::{Group, GroupRegistry};
pub use handler::handle_connection;
pub use protocol::{ProtocolError, Request};
pub use server::ChatServer;
pub use session::SessionRegistry;
pub use types::{Endpoint, LoginState, Role};
pub use user::{Outbound, User};
