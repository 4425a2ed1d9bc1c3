//! Multi-client TCP Chat Relay Library
//!
//! A line-oriented chat relay built on tokio: every connection gets a
//! username via a one-line handshake, every chat line is relayed to all
//! other participants, and newcomers get the full history replayed.
//!
//! # Features
//! - Username handshake with uniqueness and capacity enforcement
//! - Broadcast fan-out with per-recipient bounded queues (drop-on-full)
//! - History replay for new joiners
//! - In-band commands: `/name <newname>`, `/exit`
//! - Alternate UDP mode that only logs incoming datagrams
//!
//! # Architecture
//! Two tasks per session:
//! - the lifecycle controller ([`handle_connection`]) reads inbound lines
//! - a writer task drains the session's outbound queue to the socket
//!
//! Shared state is just the [`Registry`] and the [`HistoryLog`], each
//! behind its own lock, held only for short critical sections and never
//! across I/O. Broadcast snapshots the registry, then enqueues without
//! blocking: a stalled client loses messages instead of stalling others.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Arc::new(ChatServer::new(ServerConfig::default()));
//!     let listener = TcpListener::bind("127.0.0.1:8989").await.unwrap();
//!     server.run(listener).await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;

// Re-export main types for convenience
pub use config::{ServerConfig, Transport};
pub use error::{ChatError, SendError};
pub use handler::handle_connection;
pub use history::HistoryLog;
pub use message::{ChatMessage, Command};
pub use registry::Registry;
pub use server::ChatServer;
pub use session::Session;
