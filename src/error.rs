//! Error types for the chat relay
//!
//! Defines the session-level error taxonomy and the outbound queue
//! delivery errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Session-level errors
///
/// Handshake-time errors (`NameTaken`, `CapacityExceeded`, `InvalidName`)
/// are surfaced to the client as a human-readable line before closing.
/// Rename-time `NameTaken`/`CommandSyntax` are recoverable: the client
/// gets an inline correction and the session stays open.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Username already registered by another live session
    #[error("username already taken")]
    NameTaken,

    /// Registry is at its configured maximum
    #[error("server capacity reached")]
    CapacityExceeded,

    /// Username empty after trimming
    #[error("invalid username")]
    InvalidName,

    /// Peer disconnected or the session's registration vanished
    #[error("connection closed")]
    ConnectionClosed,

    /// Malformed in-band command
    #[error("malformed command: {0}")]
    CommandSyntax(String),

    /// IO error on the connection (fatal for the session)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound delivery errors
///
/// Returned by a session's non-blocking enqueue. Both are contained by
/// the broadcast engine (drop + diagnostic log), never surfaced to the
/// sender.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The recipient's queue is full (slow or stalled reader)
    #[error("outbound queue full")]
    QueueFull,

    /// The recipient's writer task has already stopped
    #[error("outbound queue closed")]
    QueueClosed,
}
