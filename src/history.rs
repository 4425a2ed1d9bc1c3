//! Chat history log
//!
//! Append-only, ordered record of chat messages, replayed to new
//! joiners. Insertion order is the causal send order and is the single
//! source of truth for "what was said when", independent of how fast
//! any recipient's queue drained.

use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::message::ChatMessage;

/// Append-only record of chat messages since server start
///
/// Only chat lines are logged; join/leave/rename notices are not, so a
/// newcomer's replay never contains notices predating its own join.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Mutex<Vec<ChatMessage>>,
}

impl HistoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; serialized with concurrent appends and replays
    pub fn append(&self, message: ChatMessage) {
        self.entries.lock().push(message);
    }

    /// Consistent snapshot of the formatted log lines
    ///
    /// Taken under the same lock as append, so a concurrent append is
    /// either fully present or fully absent.
    pub fn formatted(&self) -> Vec<String> {
        self.entries.lock().iter().map(|m| m.format()).collect()
    }

    /// Replay the whole log to a sink, one newline-terminated line per
    /// message. The snapshot is taken under the lock; the writes happen
    /// outside it, so replay never blocks appends during network I/O.
    pub async fn replay_to<W>(&self, sink: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let lines = self.formatted();
        for line in &lines {
            sink.write_all(line.as_bytes()).await?;
            sink.write_all(b"\n").await?;
        }
        Ok(())
    }

    /// Number of logged messages
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let history = HistoryLog::new();
        history.append(ChatMessage::new("alice", "first"));
        history.append(ChatMessage::new("bob", "second"));

        let lines = history.formatted();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("][alice]: first"));
        assert!(lines[1].ends_with("][bob]: second"));
    }

    #[tokio::test]
    async fn test_replay_writes_all_lines() {
        let history = HistoryLog::new();
        history.append(ChatMessage::new("alice", "first"));
        history.append(ChatMessage::new("bob", "second"));

        let mut sink: Vec<u8> = Vec::new();
        history.replay_to(&mut sink).await.unwrap();

        let text = String::from_utf8(sink).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("][alice]: first"));
        assert!(lines[1].ends_with("][bob]: second"));
    }

    #[tokio::test]
    async fn test_replay_empty_log() {
        let history = HistoryLog::new();
        let mut sink: Vec<u8> = Vec::new();
        history.replay_to(&mut sink).await.unwrap();
        assert!(sink.is_empty());
        assert!(history.is_empty());
    }
}
