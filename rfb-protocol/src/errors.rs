//! Error types for the RFB handshake.

use std::io;
use thiserror::Error;

/// Errors that end an RFB handshake.
///
/// Every variant is fatal: by the time `step()` returns one, the transport
/// has been closed and the handshake object should be discarded. Not having
/// enough bytes yet is never an error.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Transport-level failure while reading or writing.
    #[error("Transport error: {0}")]
    Io(#[from] io::Error),

    /// The ProtocolVersion message was not `"RFB xxx.yyy\n"`.
    #[error("Malformed protocol version: {0:?}")]
    MalformedVersion(String),

    /// The server speaks a protocol version this client does not support.
    #[error("Unsupported RFB version {major}.{minor} (need 3.7 or later with major 3)")]
    UnsupportedVersion {
        /// Major version announced by the server.
        major: u16,
        /// Minor version announced by the server.
        minor: u16,
    },

    /// The server sent bytes before it was allowed to.
    #[error("Unexpected data from server: {0} bytes beyond the current message")]
    UnexpectedData(usize),

    /// The server offered an empty security type list.
    #[error("Server offered no security types")]
    NoSecurityTypes,

    /// VNC Authentication was not among the offered security types.
    #[error("No supported security type offered (got {0:?}, need VNC Authentication=2)")]
    NoSupportedSecurityType(Vec<u8>),

    /// SecurityResult was not OK.
    #[error("Authentication failed (security result {0})")]
    AuthenticationFailed(u32),

    /// ServerInit declared a desktop name longer than 255 bytes.
    #[error("Desktop name length {0} exceeds 255")]
    DesktopNameTooLong(u32),

    /// `start()` was called on a handshake that had already started.
    #[error("Handshake already started")]
    AlreadyStarted,

    /// Session data was requested before the handshake finished.
    #[error("Handshake has not reached the running state")]
    NotRunning,

    /// The handshake already failed and closed its transport.
    #[error("Handshake transport is closed")]
    Closed,
}

impl HandshakeError {
    /// Returns true if the server rejected our credentials.
    ///
    /// The handshake treats this like any other failure; the distinction is
    /// for reporting.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}
