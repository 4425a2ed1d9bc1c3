//! ChatServer: broadcast engine, accept loops, and shutdown
//!
//! Owns the registry and history log so multiple independent server
//! instances can coexist (no process-wide state). The broadcast engine
//! fans a formatted line out to every registered session's queue
//! without ever blocking on a slow recipient.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::history::HistoryLog;
use crate::message;
use crate::registry::Registry;

/// One chat relay instance
///
/// The registry and history log are the only shared mutable state, each
/// behind its own lock. Shutdown is a watch flag every accept and read
/// loop selects on.
#[derive(Debug)]
pub struct ChatServer {
    registry: Registry,
    history: HistoryLog,
    shutdown_tx: watch::Sender<bool>,
}

impl ChatServer {
    /// Create a server from the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            registry: Registry::new(config.max_sessions, config.queue_capacity),
            history: HistoryLog::new(),
            shutdown_tx,
        }
    }

    /// The session registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The chat history log
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Fan a formatted line out to every registered session except
    /// `exclude`.
    ///
    /// Takes a registry snapshot, then enqueues without blocking. A full
    /// queue drops the line for that recipient with a diagnostic log; a
    /// stalled client can lose messages but can never stall the others,
    /// and the caller's broadcast never fails.
    pub fn broadcast(&self, line: &str, exclude: Option<&str>) {
        for (name, session) in self.registry.snapshot_excluding(exclude) {
            if let Err(err) = session.try_enqueue(line.to_string()) {
                warn!("dropping message for '{}': {}", name, err);
            }
        }
    }

    /// Request a server-wide shutdown.
    ///
    /// Wakes every loop waiting on [`wait_shutdown`](Self::wait_shutdown);
    /// each session then winds down through its normal closing path,
    /// which closes its connection. Safe to call concurrently with
    /// ongoing broadcasts, and more than once.
    pub fn shutdown(&self) {
        info!("shutdown requested");
        // send_replace updates the flag even when nobody subscribes yet
        self.shutdown_tx.send_replace(true);
    }

    /// Resolve once shutdown has been requested
    pub async fn wait_shutdown(&self) {
        let mut rx = self.shutdown_tx.subscribe();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }

    /// Accept loop for stream mode.
    ///
    /// Hands each accepted connection to a lifecycle controller task.
    /// Connections arriving while the registry is full are told so and
    /// closed without a handshake; registration re-checks the limit to
    /// close the race between two handshakes in flight.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        info!("chat relay accepting connections");
        loop {
            tokio::select! {
                _ = self.wait_shutdown() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => accept_stream(&self, stream, addr),
                    Err(e) => error!("failed to accept connection: {}", e),
                },
            }
        }
        info!("accept loop stopped");
    }

    /// Datagram mode: no sessions, no registry, no replay.
    ///
    /// Each received datagram is logged with its peer address and
    /// otherwise discarded.
    pub async fn run_udp(self: Arc<Self>, socket: UdpSocket) {
        info!("chat relay logging datagrams");
        let mut buf = [0u8; 1024];
        loop {
            tokio::select! {
                _ = self.wait_shutdown() => break,
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, addr)) => {
                        let text = String::from_utf8_lossy(&buf[..len]);
                        info!("[{}]: {}", addr, text.trim_end());
                    }
                    Err(e) => error!("failed to receive datagram: {}", e),
                },
            }
        }
        info!("datagram loop stopped");
    }
}

/// Hand one accepted stream to a lifecycle controller task, or reject
/// it outright when the registry is already full.
fn accept_stream(server: &Arc<ChatServer>, stream: TcpStream, addr: SocketAddr) {
    debug!("new connection from {}", addr);
    if server.registry.is_full() {
        tokio::spawn(async move {
            let mut stream = stream;
            let reject = format!("{}\n", message::SERVER_FULL);
            let _ = stream.write_all(reject.as_bytes()).await;
        });
        return;
    }
    let server = Arc::clone(server);
    tokio::spawn(async move {
        if let Err(e) = handle_connection(stream, server).await {
            debug!("connection from {} ended: {}", addr, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_broadcast_excludes_sender() {
        let server = ChatServer::new(ServerConfig::default());
        let (_a, mut a_rx) = server.registry().register("a").unwrap();
        let (_b, mut b_rx) = server.registry().register("b").unwrap();

        server.broadcast("hello", Some("a"));

        assert_eq!(b_rx.try_recv().unwrap(), "hello");
        assert!(a_rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_reaches_everyone_without_exclusion() {
        let server = ChatServer::new(ServerConfig::default());
        let (_a, mut a_rx) = server.registry().register("a").unwrap();
        let (_b, mut b_rx) = server.registry().register("b").unwrap();

        server.broadcast("notice", None);

        assert_eq!(a_rx.try_recv().unwrap(), "notice");
        assert_eq!(b_rx.try_recv().unwrap(), "notice");
    }

    #[test]
    fn test_broadcast_drops_for_slow_reader() {
        let config = ServerConfig {
            queue_capacity: 1,
            ..Default::default()
        };
        let server = ChatServer::new(config);
        let (_b, mut b_rx) = server.registry().register("b").unwrap();

        server.broadcast("first", None);
        // queue full now; the second line is dropped for b, not blocked on
        server.broadcast("second", None);

        assert_eq!(b_rx.try_recv().unwrap(), "first");
        assert!(b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_wakes_waiters() {
        let server = Arc::new(ChatServer::new(ServerConfig::default()));
        let waiter = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.wait_shutdown().await })
        };
        server.shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_shutdown_after_the_fact() {
        let server = ChatServer::new(ServerConfig::default());
        server.shutdown();
        // already shut down: must resolve immediately
        tokio::time::timeout(Duration::from_millis(100), server.wait_shutdown())
            .await
            .expect("should not wait");
    }
}
