//! Session lifecycle controller
//!
//! Drives one connection end to end: name handshake, join announce,
//! history replay, the read loop with in-band commands, and teardown.
//! Each session runs as two tasks: this read loop and a writer task
//! draining the outbound queue to the socket.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::message::{self, ChatMessage, Command};
use crate::server::ChatServer;

/// Handle one accepted connection for its whole lifetime.
///
/// Performs the name handshake, registers the session, replays history,
/// then relays inbound lines until the peer disconnects, sends `/exit`,
/// or the server shuts down. Always deregisters and announces the
/// departure on the way out.
pub async fn handle_connection(
    stream: TcpStream,
    server: Arc<ChatServer>,
) -> Result<(), ChatError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half).lines();

    let banner = format!("{}\n{}\n", message::GREETING, message::NAME_PROMPT);
    write_half.write_all(banner.as_bytes()).await?;

    // Handshake: one line, trimmed, non-empty, unique. Shutdown must
    // also reach connections still parked here waiting for a name.
    let line = tokio::select! {
        _ = server.wait_shutdown() => return Err(ChatError::ConnectionClosed),
        read = reader.next_line() => match read? {
            Some(line) => line,
            None => return Err(ChatError::ConnectionClosed),
        },
    };
    let name = line.trim();
    if name.is_empty() {
        write_line(&mut write_half, message::INVALID_NAME).await?;
        return Err(ChatError::InvalidName);
    }

    let (session, outbound_rx) = match server.registry().register(name) {
        Ok(pair) => pair,
        Err(err @ ChatError::NameTaken) => {
            write_line(&mut write_half, message::NAME_TAKEN).await?;
            return Err(err);
        }
        Err(err @ ChatError::CapacityExceeded) => {
            write_line(&mut write_half, message::SERVER_FULL).await?;
            return Err(err);
        }
        Err(err) => return Err(err),
    };
    let mut username = name.to_string();

    info!("{} joined from {}", username, peer_addr);
    server.broadcast(&message::join_notice(&username), Some(&username));

    // Replay before the writer task starts, so history precedes any
    // already-queued broadcast on the wire.
    server.history().replay_to(&mut write_half).await?;
    let writer = tokio::spawn(drain_outbound(outbound_rx, write_half));

    // ACTIVE: relay lines until exit, disconnect, or shutdown
    loop {
        let line = tokio::select! {
            _ = server.wait_shutdown() => break,
            read = reader.next_line() => match read {
                Ok(Some(line)) => line,
                // EOF or read error, either way the session is done
                Ok(None) | Err(_) => break,
            },
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match message::parse_line(line) {
            Ok(Command::Exit) => break,
            Ok(Command::Rename(new_name)) => {
                match server.registry().rename(&username, new_name) {
                    Ok(()) => {
                        let notice = message::rename_notice(&username, new_name);
                        info!("{} renamed to {}", username, new_name);
                        username = new_name.to_string();
                        // rename notices go to everyone, the renamer included
                        server.broadcast(&notice, None);
                    }
                    Err(ChatError::NameTaken) => {
                        if let Err(err) =
                            session.try_enqueue(message::NAME_TAKEN_INLINE.to_string())
                        {
                            warn!("dropping inline reply for '{}': {}", username, err);
                        }
                    }
                    // our registration is gone; nothing left to do here
                    Err(_) => break,
                }
            }
            Ok(Command::Message(content)) => {
                let chat = ChatMessage::new(&username, content);
                let formatted = chat.format();
                server.history().append(chat);
                server.broadcast(&formatted, Some(&username));
            }
            Err(_) => {
                if let Err(err) = session.try_enqueue(message::INVALID_NAME_INLINE.to_string()) {
                    warn!("dropping inline reply for '{}': {}", username, err);
                }
            }
        }
    }

    // CLOSING: deregister first so the leave notice cannot reach us
    server.registry().unregister(&username);
    server.broadcast(&message::leave_notice(&username), Some(&username));
    info!(
        "{} left after {:.0?}",
        username,
        session.connected_at.elapsed()
    );

    // Drop the last queue producer so the writer drains and stops.
    drop(session);
    let _ = writer.await;

    Ok(())
}

async fn write_line(write_half: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
    write_half.write_all(format!("{line}\n").as_bytes()).await
}

/// Writer task: drain the outbound queue to the connection.
///
/// A write error ends the task; the read side then observes the closed
/// connection and winds the session down.
async fn drain_outbound(mut rx: mpsc::Receiver<String>, mut write_half: OwnedWriteHalf) {
    while let Some(line) = rx.recv().await {
        if write_half
            .write_all(format!("{line}\n").as_bytes())
            .await
            .is_err()
        {
            debug!("outbound write failed, stopping delivery");
            break;
        }
    }
}
