//! Non-blocking byte-stream transport for the RFB handshake.
//!
//! The handshake never touches a socket directly. It talks to a [`ByteStream`]:
//! something that can report how many bytes are buffered, hand out or peek at
//! exactly that many, queue outgoing bytes, and be closed. Whoever owns the real
//! connection (see the `rfb-client` crate) moves bytes between the socket and
//! the stream.
//!
//! [`BufferedStream`] is the in-memory implementation used by the client and
//! by the tests.
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::io::{BufferedStream, ByteStream};
//!
//! # fn example() -> std::io::Result<()> {
//! let mut stream = BufferedStream::new();
//!
//! // Bytes received from the network
//! stream.feed(b"RFB 003.008\n");
//! assert_eq!(stream.available(), 12);
//! assert_eq!(stream.peek(4)?, b"RFB ");
//!
//! let version = stream.read(12)?;
//! assert_eq!(&version[..], b"RFB 003.008\n");
//!
//! // Bytes the handshake wants sent back
//! stream.write(&version)?;
//! assert_eq!(&stream.take_outbound()[..], b"RFB 003.008\n");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use bytes::{Bytes, BytesMut};
use std::io;

/// A duplex, non-blocking byte stream.
///
/// All reads are all-or-nothing: asking for more bytes than [`available()`]
/// reports is an error, never a short read. Implementations must not block.
///
/// [`available()`]: ByteStream::available
pub trait ByteStream {
    /// Number of bytes that can be read or peeked right now.
    fn available(&self) -> usize;

    /// Look at the next `n` bytes without consuming them.
    fn peek(&self, n: usize) -> io::Result<&[u8]>;

    /// Consume exactly `n` bytes.
    fn read(&mut self, n: usize) -> io::Result<Bytes>;

    /// Queue bytes for the peer.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Close the stream. Calling this more than once has no further effect.
    fn close(&mut self);

    /// Whether [`close()`](ByteStream::close) has been called.
    fn is_closed(&self) -> bool;
}

impl<T: ByteStream + ?Sized> ByteStream for &mut T {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn peek(&self, n: usize) -> io::Result<&[u8]> {
        (**self).peek(n)
    }

    fn read(&mut self, n: usize) -> io::Result<Bytes> {
        (**self).read(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// In-memory [`ByteStream`] with separate inbound and outbound buffers.
///
/// # Buffer Management
///
/// Received bytes are appended with [`feed()`](Self::feed) and consumed by
/// the handshake through [`ByteStream::read`]. Bytes written by the handshake
/// accumulate until the owner drains them with
/// [`take_outbound()`](Self::take_outbound) and sends them.
///
/// Once closed, the stream rejects reads and writes and drops anything fed to
/// it.
#[derive(Debug, Default)]
pub struct BufferedStream {
    inbound: BytesMut,
    outbound: BytesMut,
    closed: bool,
}

impl BufferedStream {
    /// Create an empty stream with the default buffer capacity (4KB each way).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Create an empty stream with the given initial capacity per direction.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inbound: BytesMut::with_capacity(capacity),
            outbound: BytesMut::with_capacity(capacity),
            closed: false,
        }
    }

    /// Append bytes received from the peer.
    pub fn feed(&mut self, data: &[u8]) {
        if self.closed {
            return;
        }
        self.inbound.extend_from_slice(data);
    }

    /// Drain everything queued for the peer.
    pub fn take_outbound(&mut self) -> Bytes {
        self.outbound.split().freeze()
    }

    /// Number of bytes waiting in the outbound buffer.
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// Consume the stream, returning any unread inbound bytes.
    pub fn into_inbound(self) -> Bytes {
        self.inbound.freeze()
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "stream is closed",
            ));
        }
        Ok(())
    }

    fn check_available(&self, n: usize) -> io::Result<()> {
        self.check_open()?;
        if self.inbound.len() < n {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, got {}", n, self.inbound.len()),
            ));
        }
        Ok(())
    }
}

impl ByteStream for BufferedStream {
    fn available(&self) -> usize {
        if self.closed {
            0
        } else {
            self.inbound.len()
        }
    }

    fn peek(&self, n: usize) -> io::Result<&[u8]> {
        self.check_available(n)?;
        Ok(&self.inbound[..n])
    }

    fn read(&mut self, n: usize) -> io::Result<Bytes> {
        self.check_available(n)?;
        Ok(self.inbound.split_to(n).freeze())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.check_open()?;
        self.outbound.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
