//! High-level connection management and handshake.
//!
//! Owns the socket for the duration of the handshake: bytes read from the
//! server are fed into a [`BufferedStream`], the [`VncHandshake`] machine is
//! stepped, and whatever it queued is written back. Once the machine reaches
//! `Running` the socket is handed back together with the captured session.

use crate::{config::Config, errors::RfbClientError, transport};
use bytes::{Bytes, BytesMut};
use rfb_protocol::{BufferedStream, ByteStream, HandshakeError, ServerInit, Session, Step, VncHandshake};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of each socket read during the handshake.
const READ_CHUNK: usize = 4096;

/// An RFB connection that has completed the handshake.
#[derive(Debug)]
pub struct Connection<IO> {
    /// The underlying transport, positioned after ServerInit.
    pub io: IO,
    /// Data captured from ServerInit.
    pub session: Session,
    /// Decoded ServerInit (framebuffer size, pixel format, name).
    pub server_init: ServerInit,
    /// Bytes received after ServerInit in the same read. They belong to
    /// whatever protocol phase follows the handshake.
    pub pending: Bytes,
}

impl<IO> Connection<IO> {
    /// Returns the framebuffer width and height.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (
            self.server_init.framebuffer_width,
            self.server_init.framebuffer_height,
        )
    }

    /// Returns the desktop name announced by the server.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.server_init.name
    }
}

/// Run the client handshake over an already connected transport.
///
/// Steps the handshake machine until it waits for input, writes and flushes
/// whatever it produced, then reads more from `io`. Returns once the machine
/// is `Running`.
///
/// # Errors
///
/// - [`RfbClientError::ConnectionClosed`] if the server closes the
///   connection before the handshake completes
/// - [`RfbClientError::AuthFailed`] if the server rejects the password
/// - [`RfbClientError::Handshake`] for any other protocol violation
/// - [`RfbClientError::Transport`] for socket errors
pub async fn drive_handshake<IO>(
    mut io: IO,
    password: impl Into<Vec<u8>>,
) -> Result<Connection<IO>, RfbClientError>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let mut handshake = VncHandshake::new(BufferedStream::new(), password);
    handshake.start()?;

    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        let step = handshake
            .advance()
            .map_err(RfbClientError::from_handshake)?;

        let outbound = handshake.stream_mut().take_outbound();
        if !outbound.is_empty() {
            io.write_all(&outbound).await?;
            io.flush().await?;
        }

        if step == Step::Done {
            break;
        }

        buf.clear();
        buf.reserve(READ_CHUNK);
        let n = io.read_buf(&mut buf).await?;
        if n == 0 {
            tracing::error!(
                "Server closed the connection during {}",
                handshake.state()
            );
            handshake.stream_mut().close();
            return Err(RfbClientError::ConnectionClosed);
        }
        handshake.stream_mut().feed(&buf[..n]);
    }

    let (stream, session) = handshake.into_session()?;
    let server_init = session.server_init().map_err(HandshakeError::from)?;
    let pending = stream.into_inbound();
    if !pending.is_empty() {
        tracing::debug!("{} bytes received past ServerInit", pending.len());
    }

    Ok(Connection {
        io,
        session,
        server_init,
        pending,
    })
}

/// Connect to the configured server and perform the handshake.
///
/// The whole operation, TCP connect included, is bounded by
/// [`Config::timeout()`]. On expiry the socket is dropped.
///
/// # Errors
///
/// Returns [`RfbClientError::Timeout`] on expiry, plus any error from
/// [`Config::validate()`], [`Config::password_bytes()`],
/// [`transport::connect_tcp()`] or [`drive_handshake()`].
pub async fn establish(
    config: &Config,
) -> Result<Connection<tokio::net::TcpStream>, RfbClientError> {
    config.validate()?;
    let password = config.password_bytes()?;
    let timeout = config.timeout();
    let host = &config.connection.host;
    let port = config.connection.port;

    let connect = async {
        let stream = transport::connect_tcp(host, port, timeout).await?;
        drive_handshake(stream, password).await
    };

    let connection = tokio::time::timeout(timeout, connect)
        .await
        .map_err(|_| {
            tracing::error!("Handshake with {}:{} timed out after {:?}", host, port, timeout);
            RfbClientError::Timeout(timeout)
        })??;

    let (width, height) = connection.size();
    tracing::info!(
        "Connected to \"{}\" ({}x{}) at {}:{}",
        connection.name(),
        width,
        height,
        host,
        port
    );
    Ok(connection)
}
