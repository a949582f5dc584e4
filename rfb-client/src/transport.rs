//! TCP transport for VNC connections.
//!
//! # Examples
//!
//! ```no_run
//! use rfb_client::transport::connect_tcp;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = connect_tcp("localhost", 5900, Duration::from_secs(10)).await?;
//! // Hand the stream to rfb_client::drive_handshake
//! # Ok(())
//! # }
//! ```

use crate::errors::RfbClientError;
use std::time::Duration;
use tokio::net::TcpStream;

/// Connect to a VNC server via plain TCP.
///
/// TCP_NODELAY is enabled for low-latency communication.
///
/// # Arguments
///
/// * `host` - Server hostname or IP address
/// * `port` - Server port (typically 5900-5999)
/// * `timeout` - Upper bound on name resolution plus connection setup
///
/// # Errors
///
/// Returns [`RfbClientError::Timeout`] if the connection is not established
/// within `timeout`, and [`RfbClientError::ConnectionFailed`] if:
/// - DNS resolution fails
/// - Connection is refused
/// - Network is unreachable
/// - TCP_NODELAY cannot be set
pub async fn connect_tcp(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<TcpStream, RfbClientError> {
    let addr = format!("{}:{}", host, port);
    tracing::debug!("Connecting to {} (timeout {:?})", addr, timeout);

    let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| RfbClientError::Timeout(timeout))?
        .map_err(|e| {
            RfbClientError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
        })?;

    // Handshake messages are tiny; don't let Nagle hold them back
    stream.set_nodelay(true).map_err(|e| {
        RfbClientError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
    })?;

    // Log local and remote addresses for correlation with server logs
    if let (Ok(local), Ok(peer)) = (stream.local_addr(), stream.peer_addr()) {
        tracing::info!("Connected via TCP: local={} -> remote={}", local, peer);
    } else {
        tracing::info!("Connected to {} via plain TCP", addr);
    }
    Ok(stream)
}
