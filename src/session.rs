//! Session struct definition
//!
//! Represents one connected, named participant and its outbound
//! delivery queue.

use std::time::Instant;

use tokio::sync::mpsc;

use crate::error::SendError;

/// A connected chat participant
///
/// Holds the producer half of the session's bounded outbound queue of
/// formatted lines. The lifecycle controller owns the consumer half and
/// drains it to the connection in a dedicated writer task; the registry
/// and broadcast engine only ever hold this producer handle.
#[derive(Debug)]
pub struct Session {
    /// Producer half of the outbound delivery queue
    outbound: mpsc::Sender<String>,
    /// When the session registered
    pub connected_at: Instant,
}

impl Session {
    /// Create a session and the consumer half of its outbound queue
    pub fn new(queue_capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        (
            Self {
                outbound: tx,
                connected_at: Instant::now(),
            },
            rx,
        )
    }

    /// Enqueue a formatted line for delivery without blocking.
    ///
    /// Fails with `QueueFull` when the reader cannot keep up and with
    /// `QueueClosed` once the writer task has stopped. Callers decide
    /// whether to drop or report; the enqueue itself never waits.
    pub fn try_enqueue(&self, line: String) -> Result<(), SendError> {
        self.outbound.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::QueueClosed,
        })
    }

    /// Whether the consumer half has been dropped
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_rejects_when_full() {
        let (session, _rx) = Session::new(1);
        assert!(session.try_enqueue("one".to_string()).is_ok());
        assert_eq!(
            session.try_enqueue("two".to_string()),
            Err(SendError::QueueFull)
        );
    }

    #[test]
    fn test_enqueue_rejects_when_closed() {
        let (session, rx) = Session::new(4);
        drop(rx);
        assert_eq!(
            session.try_enqueue("x".to_string()),
            Err(SendError::QueueClosed)
        );
        assert!(session.is_closed());
    }

    #[test]
    fn test_connected_at_recorded() {
        let before = Instant::now();
        let (session, _rx) = Session::new(4);
        assert!(session.connected_at >= before);
        assert!(session.connected_at <= Instant::now());
    }

    #[tokio::test]
    async fn test_queue_preserves_order() {
        let (session, mut rx) = Session::new(4);
        session.try_enqueue("one".to_string()).unwrap();
        session.try_enqueue("two".to_string()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "one");
        assert_eq!(rx.recv().await.unwrap(), "two");
    }
}
