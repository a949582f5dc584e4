//! RFB (Remote Framebuffer) client handshake.
//!
//! This crate implements the client side of the RFB handshake as a sans-I/O
//! state machine: protocol version negotiation, VNC Authentication
//! (DES challenge/response) and session initialization. It never blocks and
//! never owns a socket; the connection owner moves bytes in and out of a
//! [`ByteStream`] and calls [`VncHandshake::step()`] whenever new data may be
//! available.
//!
//! # Modules
//!
//! - [`handshake`] - The handshake state machine
//! - [`auth`] - VNC Authentication challenge encryption
//! - [`io`] - Non-blocking byte-stream transport (`ByteStream`, `BufferedStream`)
//! - [`messages`] - ProtocolVersion, PixelFormat, ClientInit and ServerInit
//! - [`protocol_trace`] - Opt-in wire tracing
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::{BufferedStream, Step, VncHandshake};
//!
//! # fn example() -> Result<(), rfb_protocol::HandshakeError> {
//! let mut handshake = VncHandshake::new(BufferedStream::new(), b"secret".to_vec());
//! handshake.start()?;
//!
//! // Called each time the socket becomes readable
//! handshake.stream_mut().feed(b"RFB 003.008\n");
//! assert_eq!(handshake.advance()?, Step::Waiting);
//! let reply = handshake.stream_mut().take_outbound();
//! assert_eq!(&reply[..], b"RFB 003.008\n");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod auth;
pub mod errors;
pub mod handshake;
pub mod io;
pub mod messages;
pub mod protocol_trace;

mod proptest_framing;

// Re-export commonly used types
pub use errors::HandshakeError;
pub use handshake::{HandshakeState, Session, Step, VncHandshake};
pub use io::{BufferedStream, ByteStream};
pub use messages::{ClientInit, PixelFormat, ProtocolVersion, ServerInit};
