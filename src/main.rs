//! Multi-client TCP Chat Relay - Entry Point
//!
//! Initializes logging, binds the chosen transport, and runs the relay.

use std::env;
use std::sync::Arc;

use tokio::net::{TcpListener, UdpSocket};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{ChatServer, ServerConfig, Transport};

/// Default bind address
const DEFAULT_ADDR: &str = "127.0.0.1:8989";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Bind address and transport from the command line
    let addr = env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let transport: Transport = env::args().nth(2).as_deref().unwrap_or("tcp").parse()?;

    let config = ServerConfig {
        transport,
        ..ServerConfig::default()
    };
    let server = Arc::new(ChatServer::new(config));

    match transport {
        Transport::Tcp => {
            let listener = TcpListener::bind(&addr).await?;
            info!("chat relay listening on {}", addr);
            server.run(listener).await;
        }
        Transport::Udp => {
            let socket = UdpSocket::bind(&addr).await?;
            info!("chat relay receiving datagrams on {}", addr);
            server.run_udp(socket).await;
        }
    }

    Ok(())
}
