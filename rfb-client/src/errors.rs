//! Error types for the RFB client.

use rfb_protocol::HandshakeError;
use std::io;
use thiserror::Error;

/// Errors that can occur while connecting to a VNC server.
#[derive(Debug, Error)]
pub enum RfbClientError {
    /// Transport-level error (TCP, socket operations).
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Connection failed (TCP connection establishment failed).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// RFB handshake failed (protocol violation or transport failure).
    #[error("Handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// Authentication failed (wrong password, etc.).
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Connection or handshake timeout.
    #[error("Connection timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server closed the connection before the handshake completed.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl RfbClientError {
    /// Wrap a handshake failure, keeping authentication failures distinct.
    #[must_use]
    pub fn from_handshake(err: HandshakeError) -> Self {
        if err.is_auth_failure() {
            Self::AuthFailed(err.to_string())
        } else {
            Self::Handshake(err)
        }
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// Retryable errors are transient network conditions. Authentication
    /// failures, protocol violations and configuration errors are fatal.
    /// Retrying is the caller's decision; this crate never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Timeout(_)
                | Self::ConnectionFailed(_)
                | Self::ConnectionClosed
                | Self::Handshake(HandshakeError::Io(_))
        )
    }

    /// Returns true if this is a fatal error that should not be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }
}
