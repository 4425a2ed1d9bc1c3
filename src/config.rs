//! Server configuration
//!
//! Capacity, per-session queue size, and transport mode. Supplied by
//! the startup layer; the core never reads the environment itself.

use std::str::FromStr;

/// Default maximum number of concurrent sessions
pub const DEFAULT_MAX_SESSIONS: usize = 10;

/// Default capacity of each session's outbound queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Transport mode selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Line-oriented stream sessions with the full handshake
    Tcp,
    /// Fire-and-forget datagram logging, no sessions
    Udp,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Transport::Tcp),
            "udp" => Ok(Transport::Udp),
            other => Err(format!("unknown transport '{other}', expected tcp or udp")),
        }
    }
}

/// Configuration consumed by the chat core
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum concurrent sessions; further connections are rejected
    pub max_sessions: usize,
    /// Bound on each session's outbound queue; a full queue drops messages
    pub queue_capacity: usize,
    /// Stream or datagram mode
    pub transport: Transport,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            transport: Transport::Tcp,
        }
    }
}
