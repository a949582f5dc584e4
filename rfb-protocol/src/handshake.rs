//! Incremental RFB client handshake.
//!
//! This module implements the client side of the RFB (Remote Framebuffer)
//! handshake as a state machine driven by whatever bytes happen to be
//! buffered on a non-blocking [`ByteStream`]:
//!
//! 1. **Protocol Version** - Validate the server's version and echo it back
//! 2. **Security Types** - Pick VNC Authentication from the offered list
//! 3. **Security Challenge** - Answer the DES challenge with the password
//! 4. **Security Result** - Check the result, then send ClientInit (shared)
//! 5. **Session Init** - Capture ServerInit (pixel format and raw message)
//!
//! # Driving the Handshake
//!
//! The owner of the connection feeds received bytes into the stream and calls
//! [`VncHandshake::step()`] until it stops reporting progress. A step either
//! consumes one complete message and advances exactly one state, or leaves
//! everything untouched and reports [`Step::Waiting`]. Messages are never
//! partially consumed, so calling `step()` again after more bytes arrive is
//! always correct.
//!
//! # Supported Protocol Versions
//!
//! Major version 3 with minor version 7 or later. The client echoes the
//! server's exact version string instead of announcing its own.
//!
//! # Security Types
//!
//! Only VNC Authentication (type 2) is offered. A server that does not list it
//! fails the handshake.
//!
//! # Error Handling
//!
//! Any protocol violation, authentication failure or transport error closes
//! the stream and is returned from `step()`. There is no recovery: the caller
//! discards the handshake and the connection.
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::handshake::{HandshakeState, Step, VncHandshake};
//! use rfb_protocol::io::BufferedStream;
//!
//! # fn example() -> Result<(), rfb_protocol::HandshakeError> {
//! let mut handshake = VncHandshake::new(BufferedStream::new(), b"secret".to_vec());
//! handshake.start()?;
//!
//! // Not enough data yet
//! handshake.stream_mut().feed(b"RFB 003");
//! assert_eq!(handshake.step()?, Step::Waiting);
//!
//! handshake.stream_mut().feed(b".008\n");
//! assert_eq!(handshake.step()?, Step::Progressed);
//! assert_eq!(handshake.state(), HandshakeState::SecurityTypeNegotiation);
//! assert_eq!(&handshake.stream_mut().take_outbound()[..], b"RFB 003.008\n");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::auth;
use crate::errors::HandshakeError;
use crate::io::ByteStream;
use crate::messages::types::{
    CHALLENGE_LEN, MAX_DESKTOP_NAME_LEN, PROTOCOL_VERSION_LEN, SECURITY_RESULT_LEN,
    SECURITY_RESULT_OK, SECURITY_TYPE_VNC_AUTH, SERVER_INIT_HEADER_LEN,
};
use crate::messages::{ClientInit, PixelFormat, ProtocolVersion, ServerInit};
use crate::protocol_trace;
use bytes::Bytes;
use std::fmt;

/// Handshake state. States only ever move forward, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandshakeState {
    /// Created but not started.
    Disconnected,

    /// Waiting for the server's ProtocolVersion.
    ProtocolVersion,

    /// Waiting for the security type list.
    SecurityTypeNegotiation,

    /// Waiting for the VNC Authentication challenge.
    SecurityChallenge,

    /// Waiting for the SecurityResult.
    SecurityResult,

    /// Waiting for ServerInit.
    SessionInit,

    /// Handshake complete; the session belongs to the next layer.
    Running,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ProtocolVersion => write!(f, "ProtocolVersion"),
            Self::SecurityTypeNegotiation => write!(f, "SecurityTypeNegotiation"),
            Self::SecurityChallenge => write!(f, "SecurityChallenge"),
            Self::SecurityResult => write!(f, "SecurityResult"),
            Self::SessionInit => write!(f, "SessionInit"),
            Self::Running => write!(f, "Running"),
        }
    }
}

/// Outcome of a successful [`VncHandshake::step()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One message was handled and the state advanced. Call again.
    Progressed,

    /// Not enough bytes buffered. Nothing changed.
    Waiting,

    /// The handshake is in `Running`; there is nothing left to do.
    Done,
}

/// Data captured from ServerInit, handed to the post-handshake consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Pixel format announced by the server.
    pub pixel_format: PixelFormat,

    /// The complete ServerInit message, desktop name included.
    pub server_init: Bytes,
}

impl Session {
    /// Decode the captured ServerInit message.
    pub fn server_init(&self) -> std::io::Result<ServerInit> {
        ServerInit::parse(&self.server_init)
    }
}

/// RFB client handshake state machine.
///
/// # Type Parameters
///
/// * `S` - The transport. Either owned, or an exclusive borrow (`&mut S`).
pub struct VncHandshake<S> {
    stream: S,
    state: HandshakeState,
    password: Vec<u8>,
    session: Option<Session>,
    failed: bool,
}

impl<S: ByteStream> VncHandshake<S> {
    /// Create a handshake over `stream` that authenticates with `password`.
    ///
    /// The handshake starts in [`HandshakeState::Disconnected`].
    pub fn new(stream: S, password: impl Into<Vec<u8>>) -> Self {
        Self {
            stream,
            state: HandshakeState::Disconnected,
            password: password.into(),
            session: None,
            failed: false,
        }
    }

    /// Begin the handshake (`Disconnected` -> `ProtocolVersion`).
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::AlreadyStarted`] if called more than once.
    /// The state is left unchanged.
    pub fn start(&mut self) -> Result<(), HandshakeError> {
        if self.state != HandshakeState::Disconnected {
            return Err(HandshakeError::AlreadyStarted);
        }
        self.transition(HandshakeState::ProtocolVersion);
        Ok(())
    }

    /// Handle the next message if it is completely buffered.
    ///
    /// Returns [`Step::Waiting`] in `Disconnected` and [`Step::Done`] in
    /// `Running`; neither is an error.
    ///
    /// # Errors
    ///
    /// Any error is fatal. The stream has been closed and later calls return
    /// [`HandshakeError::Closed`].
    pub fn step(&mut self) -> Result<Step, HandshakeError> {
        let state = self.state;
        let next = match state {
            HandshakeState::Disconnected => return Ok(Step::Waiting),
            HandshakeState::Running => return Ok(Step::Done),
            _ if self.failed || self.stream.is_closed() => return Err(HandshakeError::Closed),
            HandshakeState::ProtocolVersion => self.read_protocol_version(),
            HandshakeState::SecurityTypeNegotiation => self.read_security_types(),
            HandshakeState::SecurityChallenge => self.read_security_challenge(),
            HandshakeState::SecurityResult => self.read_security_result(),
            HandshakeState::SessionInit => self.read_server_init(),
        };

        match next {
            Ok(Some(state)) => {
                self.transition(state);
                Ok(Step::Progressed)
            }
            Ok(None) => Ok(Step::Waiting),
            Err(err) => {
                tracing::error!("RFB handshake failed in {}: {}", self.state, err);
                self.fail();
                Err(err)
            }
        }
    }

    /// Call [`step()`](Self::step) until it stops making progress.
    ///
    /// Returns [`Step::Waiting`] or [`Step::Done`].
    pub fn advance(&mut self) -> Result<Step, HandshakeError> {
        loop {
            match self.step()? {
                Step::Progressed => continue,
                other => return Ok(other),
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the handshake has completed.
    pub fn is_running(&self) -> bool {
        self.state == HandshakeState::Running
    }

    /// The transport.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// The transport, for feeding received bytes and draining replies.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Pixel format from ServerInit. `None` until `Running`.
    pub fn pixel_format(&self) -> Option<&PixelFormat> {
        self.session.as_ref().map(|s| &s.pixel_format)
    }

    /// Raw ServerInit bytes. `None` until `Running`.
    pub fn server_init_blob(&self) -> Option<&Bytes> {
        self.session.as_ref().map(|s| &s.server_init)
    }

    /// Hand the transport and captured session data to the next layer.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::NotRunning`] before the handshake completes.
    pub fn into_session(self) -> Result<(S, Session), HandshakeError> {
        let Self {
            stream,
            state,
            session,
            ..
        } = self;
        match session {
            Some(session) if state == HandshakeState::Running => Ok((stream, session)),
            _ => Err(HandshakeError::NotRunning),
        }
    }

    fn transition(&mut self, next: HandshakeState) {
        debug_assert!(next > self.state, "handshake state must advance");
        tracing::debug!("RFB handshake: {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self) {
        self.failed = true;
        self.password.clear();
        self.stream.close();
    }

    fn read_protocol_version(&mut self) -> Result<Option<HandshakeState>, HandshakeError> {
        let available = self.stream.available();
        if available < PROTOCOL_VERSION_LEN {
            return Ok(None);
        }
        // The server must wait for our reply before sending anything else.
        if available > PROTOCOL_VERSION_LEN {
            return Err(HandshakeError::UnexpectedData(available - PROTOCOL_VERSION_LEN));
        }

        let message = self.stream.read(PROTOCOL_VERSION_LEN)?;
        let version = ProtocolVersion::parse(&message).ok_or_else(|| {
            HandshakeError::MalformedVersion(String::from_utf8_lossy(&message).into_owned())
        })?;
        protocol_trace::in_msg("ProtocolVersion", &format!("version={}", version));

        if !version.is_supported() {
            return Err(HandshakeError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        self.stream.write(&message)?;
        protocol_trace::out_msg("ProtocolVersion", &format!("version={}", version));

        Ok(Some(HandshakeState::SecurityTypeNegotiation))
    }

    fn read_security_types(&mut self) -> Result<Option<HandshakeState>, HandshakeError> {
        let available = self.stream.available();
        if available < 1 {
            return Ok(None);
        }

        let count = usize::from(self.stream.peek(1)?[0]);
        if count == 0 {
            return Err(HandshakeError::NoSecurityTypes);
        }
        if available < 1 + count {
            return Ok(None);
        }

        let message = self.stream.read(1 + count)?;
        let types = &message[1..];
        protocol_trace::in_msg("SecurityTypes", &format!("types={:?}", types));

        if !types.contains(&SECURITY_TYPE_VNC_AUTH) {
            return Err(HandshakeError::NoSupportedSecurityType(types.to_vec()));
        }

        self.stream.write(&[SECURITY_TYPE_VNC_AUTH])?;
        protocol_trace::out_msg("SecurityType", &format!("type={}", SECURITY_TYPE_VNC_AUTH));

        Ok(Some(HandshakeState::SecurityChallenge))
    }

    fn read_security_challenge(&mut self) -> Result<Option<HandshakeState>, HandshakeError> {
        if self.stream.available() < CHALLENGE_LEN {
            return Ok(None);
        }

        let message = self.stream.read(CHALLENGE_LEN)?;
        let mut challenge = [0u8; CHALLENGE_LEN];
        challenge.copy_from_slice(&message);
        protocol_trace::in_msg("VncAuthChallenge", &format!("len={}", CHALLENGE_LEN));

        // The password is only needed once.
        let password = std::mem::take(&mut self.password);
        let response = auth::encrypt_challenge(&challenge, &password);
        drop(password);

        self.stream.write(&response)?;
        protocol_trace::out_msg("VncAuthResponse", &format!("len={}", CHALLENGE_LEN));

        Ok(Some(HandshakeState::SecurityResult))
    }

    fn read_security_result(&mut self) -> Result<Option<HandshakeState>, HandshakeError> {
        if self.stream.available() < SECURITY_RESULT_LEN {
            return Ok(None);
        }

        let message = self.stream.read(SECURITY_RESULT_LEN)?;
        let result = u32::from_be_bytes([message[0], message[1], message[2], message[3]]);
        protocol_trace::in_msg("SecurityResult", &format!("result={}", result));

        if result != SECURITY_RESULT_OK {
            return Err(HandshakeError::AuthenticationFailed(result));
        }
        tracing::info!("RFB authentication successful");

        let client_init = ClientInit::SHARED;
        self.stream.write(&client_init.to_bytes())?;
        protocol_trace::out_msg("ClientInit", &format!("shared={}", client_init.shared));

        Ok(Some(HandshakeState::SessionInit))
    }

    fn read_server_init(&mut self) -> Result<Option<HandshakeState>, HandshakeError> {
        let available = self.stream.available();
        if available < SERVER_INIT_HEADER_LEN {
            return Ok(None);
        }

        let name_length = ServerInit::name_length(self.stream.peek(SERVER_INIT_HEADER_LEN)?);
        if name_length > MAX_DESKTOP_NAME_LEN {
            return Err(HandshakeError::DesktopNameTooLong(name_length));
        }

        let total = SERVER_INIT_HEADER_LEN + name_length as usize;
        if available < total {
            return Ok(None);
        }

        let message = self.stream.read(total)?;
        let pixel_format = PixelFormat::from_bytes(&ServerInit::pixel_format_bytes(&message));
        protocol_trace::in_msg(
            "ServerInit",
            &format!(
                "size={}x{} name_len={}",
                u16::from_be_bytes([message[0], message[1]]),
                u16::from_be_bytes([message[2], message[3]]),
                name_length
            ),
        );
        protocol_trace::hexdump("ServerInit", &message, 64);

        self.session = Some(Session {
            pixel_format,
            server_init: message,
        });
        tracing::info!("RFB session established");

        Ok(Some(HandshakeState::Running))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferedStream;
    use crate::messages::types::PIXEL_FORMAT_LEN;
    use pretty_assertions::assert_eq;

    const PIXEL_FORMAT: [u8; PIXEL_FORMAT_LEN] =
        [32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0];

    fn started(password: &[u8]) -> VncHandshake<BufferedStream> {
        let mut handshake = VncHandshake::new(BufferedStream::new(), password.to_vec());
        handshake.start().unwrap();
        handshake
    }

    fn feed(handshake: &mut VncHandshake<BufferedStream>, data: &[u8]) {
        handshake.stream_mut().feed(data);
    }

    fn outbound(handshake: &mut VncHandshake<BufferedStream>) -> Vec<u8> {
        handshake.stream_mut().take_outbound().to_vec()
    }

    fn server_init(width: u16, height: u16, name: &[u8]) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(&width.to_be_bytes());
        msg.extend_from_slice(&height.to_be_bytes());
        msg.extend_from_slice(&PIXEL_FORMAT);
        msg.extend_from_slice(&(name.len() as u32).to_be_bytes());
        msg.extend_from_slice(name);
        msg
    }

    fn server_init_header(width: u16, height: u16, name_length: u32) -> Vec<u8> {
        let mut msg = server_init(width, height, b"");
        msg[20..24].copy_from_slice(&name_length.to_be_bytes());
        msg
    }

    /// Handshake advanced to the given state with a well-behaved server.
    fn at_state(target: HandshakeState) -> VncHandshake<BufferedStream> {
        let mut handshake = started(b"pass");
        let script: [(HandshakeState, &[u8]); 4] = [
            (HandshakeState::ProtocolVersion, b"RFB 003.008\n"),
            (HandshakeState::SecurityTypeNegotiation, &[1, 2]),
            (HandshakeState::SecurityChallenge, &[0u8; 16]),
            (HandshakeState::SecurityResult, &[0, 0, 0, 0]),
        ];
        for (state, bytes) in script {
            if handshake.state() == target {
                break;
            }
            assert_eq!(handshake.state(), state);
            feed(&mut handshake, bytes);
            assert_eq!(handshake.step().unwrap(), Step::Progressed);
        }
        assert_eq!(handshake.state(), target);
        outbound(&mut handshake);
        handshake
    }

    #[test]
    fn test_initial_state() {
        let mut handshake = VncHandshake::new(BufferedStream::new(), b"pass".to_vec());
        assert_eq!(handshake.state(), HandshakeState::Disconnected);
        assert!(!handshake.is_running());

        // Bytes are ignored until start()
        feed(&mut handshake, b"RFB 003.008\n");
        assert_eq!(handshake.step().unwrap(), Step::Waiting);
        assert_eq!(handshake.state(), HandshakeState::Disconnected);
        assert_eq!(handshake.stream().available(), 12);
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut handshake = started(b"pass");
        assert_eq!(handshake.state(), HandshakeState::ProtocolVersion);

        assert!(matches!(handshake.start(), Err(HandshakeError::AlreadyStarted)));
        assert_eq!(handshake.state(), HandshakeState::ProtocolVersion);
    }

    #[test]
    fn test_version_echoed_verbatim() {
        for version in [&b"RFB 003.008\n"[..], b"RFB 003.007\n", b"RFB 003.889\n"] {
            let mut handshake = started(b"pass");
            feed(&mut handshake, version);

            assert_eq!(handshake.step().unwrap(), Step::Progressed);
            assert_eq!(handshake.state(), HandshakeState::SecurityTypeNegotiation);
            assert_eq!(outbound(&mut handshake), version.to_vec());
        }
    }

    #[test]
    fn test_unsupported_versions_rejected() {
        for version in [&b"RFB 003.003\n"[..], b"RFB 003.006\n", b"RFB 004.000\n", b"RFB 002.008\n"] {
            let mut handshake = started(b"pass");
            feed(&mut handshake, version);

            let err = handshake.step().unwrap_err();
            assert!(matches!(err, HandshakeError::UnsupportedVersion { .. }), "{:?}", err);
            assert!(handshake.stream().is_closed());
            assert_eq!(handshake.stream_mut().pending_outbound(), 0);
        }
    }

    #[test]
    fn test_malformed_version_rejected() {
        let mut handshake = started(b"pass");
        feed(&mut handshake, b"HTTP/1.1 200");

        let err = handshake.step().unwrap_err();
        assert!(matches!(err, HandshakeError::MalformedVersion(_)));
        assert!(handshake.stream().is_closed());
    }

    #[test]
    fn test_version_with_trailing_data_rejected() {
        let mut handshake = started(b"pass");
        feed(&mut handshake, b"RFB 003.008\n\x01");

        let err = handshake.step().unwrap_err();
        assert!(matches!(err, HandshakeError::UnexpectedData(1)));
        assert!(handshake.stream().is_closed());
    }

    #[test]
    fn test_version_one_byte_at_a_time() {
        let mut handshake = started(b"pass");
        let version = b"RFB 003.008\n";

        for &byte in &version[..version.len() - 1] {
            feed(&mut handshake, &[byte]);
            assert_eq!(handshake.step().unwrap(), Step::Waiting);
            assert_eq!(handshake.state(), HandshakeState::ProtocolVersion);
            assert_eq!(handshake.stream_mut().pending_outbound(), 0);
        }

        feed(&mut handshake, &version[version.len() - 1..]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);
        assert_eq!(handshake.state(), HandshakeState::SecurityTypeNegotiation);
    }

    #[test]
    fn test_security_type_selected() {
        let mut handshake = at_state(HandshakeState::SecurityTypeNegotiation);
        feed(&mut handshake, &[3, 1, 2, 16]);

        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.state(), HandshakeState::SecurityChallenge);
        assert_eq!(outbound(&mut handshake), vec![2]);
    }

    #[test]
    fn test_security_list_waits_for_all_types() {
        let mut handshake = at_state(HandshakeState::SecurityTypeNegotiation);

        feed(&mut handshake, &[3]);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);
        feed(&mut handshake, &[1, 16]);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);
        assert_eq!(handshake.stream().available(), 3);

        feed(&mut handshake, &[2]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.state(), HandshakeState::SecurityChallenge);
    }

    #[test]
    fn test_zero_security_types_rejected() {
        let mut handshake = at_state(HandshakeState::SecurityTypeNegotiation);
        feed(&mut handshake, &[0]);

        let err = handshake.step().unwrap_err();
        assert!(matches!(err, HandshakeError::NoSecurityTypes));
        assert!(handshake.stream().is_closed());
    }

    #[test]
    fn test_vnc_auth_missing_rejected() {
        for types in [vec![1u8], vec![1, 16], (0u8..=255).filter(|&t| t != 2).collect()] {
            let mut handshake = at_state(HandshakeState::SecurityTypeNegotiation);
            let mut message = vec![types.len() as u8];
            message.extend_from_slice(&types);
            feed(&mut handshake, &message);

            let err = handshake.step().unwrap_err();
            match err {
                HandshakeError::NoSupportedSecurityType(offered) => assert_eq!(offered, types),
                other => panic!("unexpected error: {:?}", other),
            }
            assert!(handshake.stream().is_closed());
            assert_eq!(handshake.stream_mut().pending_outbound(), 0);
        }
    }

    #[test]
    fn test_challenge_response() {
        let mut handshake = at_state(HandshakeState::SecurityChallenge);

        feed(&mut handshake, &[0u8; 15]);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);
        assert_eq!(handshake.stream_mut().pending_outbound(), 0);

        feed(&mut handshake, &[0u8]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.state(), HandshakeState::SecurityResult);
        assert_eq!(
            outbound(&mut handshake),
            vec![
                0x4a, 0x17, 0xcc, 0x5b, 0x03, 0x55, 0x79, 0x12, 0x4a, 0x17, 0xcc, 0x5b, 0x03,
                0x55, 0x79, 0x12
            ]
        );
    }

    #[test]
    fn test_security_result_ok_sends_shared_client_init() {
        let mut handshake = at_state(HandshakeState::SecurityResult);

        feed(&mut handshake, &[0, 0, 0]);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);

        feed(&mut handshake, &[0]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.state(), HandshakeState::SessionInit);
        assert_eq!(outbound(&mut handshake), vec![1]);
    }

    #[test]
    fn test_security_result_failure() {
        let mut handshake = at_state(HandshakeState::SecurityResult);
        // A reason string follows on real servers; it is not read.
        feed(&mut handshake, &[0, 0, 0, 1, 0, 0, 0, 3, b'b', b'a', b'd']);

        let err = handshake.step().unwrap_err();
        assert!(err.is_auth_failure());
        assert!(matches!(err, HandshakeError::AuthenticationFailed(1)));
        assert!(handshake.stream().is_closed());
        assert_eq!(handshake.stream_mut().pending_outbound(), 0);
        assert_eq!(handshake.state(), HandshakeState::SecurityResult);
    }

    #[test]
    fn test_server_init_zero_length_name() {
        let mut handshake = at_state(HandshakeState::SessionInit);
        feed(&mut handshake, &server_init(800, 600, b""));

        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert!(handshake.is_running());
        assert_eq!(handshake.server_init_blob().unwrap().len(), SERVER_INIT_HEADER_LEN);
        assert_eq!(handshake.pixel_format().unwrap().to_bytes(), PIXEL_FORMAT);
    }

    #[test]
    fn test_server_init_waits_for_name() {
        let mut handshake = at_state(HandshakeState::SessionInit);
        let message = server_init(1024, 768, b"Test");

        feed(&mut handshake, &message[..SERVER_INIT_HEADER_LEN - 1]);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);

        feed(&mut handshake, &message[SERVER_INIT_HEADER_LEN - 1..message.len() - 1]);
        assert_eq!(handshake.step().unwrap(), Step::Waiting);
        assert_eq!(handshake.stream().available(), message.len() - 1);
        assert!(handshake.pixel_format().is_none());
        assert!(handshake.server_init_blob().is_none());

        feed(&mut handshake, &message[message.len() - 1..]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.server_init_blob().unwrap().to_vec(), message);
    }

    #[test]
    fn test_server_init_max_name_accepted() {
        let mut handshake = at_state(HandshakeState::SessionInit);
        feed(&mut handshake, &server_init(1, 1, &[b'x'; 255]));

        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(
            handshake.server_init_blob().unwrap().len(),
            SERVER_INIT_HEADER_LEN + 255
        );
    }

    #[test]
    fn test_server_init_oversized_name_rejected_without_consuming() {
        for name_length in [256u32, 4096, u32::MAX] {
            let mut stream = BufferedStream::new();
            {
                let mut handshake = VncHandshake::new(&mut stream, b"pass".to_vec());
                handshake.start().unwrap();
                for bytes in [&b"RFB 003.008\n"[..], &[1u8, 2][..], &[0u8; 16][..], &[0u8; 4][..]] {
                    handshake.stream_mut().feed(bytes);
                    assert_eq!(handshake.step().unwrap(), Step::Progressed);
                }
                handshake.stream_mut().take_outbound();

                handshake
                    .stream_mut()
                    .feed(&server_init_header(1024, 768, name_length));
                let err = handshake.step().unwrap_err();
                assert!(matches!(err, HandshakeError::DesktopNameTooLong(n) if n == name_length));
                assert!(handshake.server_init_blob().is_none());
            }
            assert!(stream.is_closed());
            assert_eq!(stream.into_inbound().len(), SERVER_INIT_HEADER_LEN);
        }
    }

    #[test]
    fn test_end_to_end() {
        let mut handshake = started(b"pass");

        feed(&mut handshake, b"RFB 003.008\n");
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(outbound(&mut handshake), b"RFB 003.008\n".to_vec());

        feed(&mut handshake, &[1, 2]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(outbound(&mut handshake), vec![0x02]);

        feed(&mut handshake, &[0u8; 16]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(
            outbound(&mut handshake),
            auth::encrypt_challenge(&[0u8; 16], b"pass").to_vec()
        );

        feed(&mut handshake, &[0, 0, 0, 0]);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(outbound(&mut handshake), vec![0x01]);

        let message = server_init(1024, 768, b"Test");
        feed(&mut handshake, &message);
        assert_eq!(handshake.step().unwrap(), Step::Progressed);
        assert_eq!(handshake.state(), HandshakeState::Running);
        assert_eq!(handshake.step().unwrap(), Step::Done);

        let (_, session) = handshake.into_session().unwrap();
        assert_eq!(session.server_init.len(), SERVER_INIT_HEADER_LEN + 4);
        let decoded = session.server_init().unwrap();
        assert_eq!(decoded.framebuffer_width, 1024);
        assert_eq!(decoded.framebuffer_height, 768);
        assert_eq!(decoded.name, "Test");
        assert_eq!(decoded.pixel_format, session.pixel_format);
    }

    #[test]
    fn test_advance_runs_buffered_steps() {
        let mut handshake = started(b"pass");
        feed(&mut handshake, b"RFB 003.008\n");
        assert_eq!(handshake.advance().unwrap(), Step::Waiting);
        outbound(&mut handshake);

        // Everything after the version may arrive in one read
        let mut rest = vec![1, 2];
        rest.extend_from_slice(&[0u8; 16]);
        rest.extend_from_slice(&[0, 0, 0, 0]);
        rest.extend_from_slice(&server_init(640, 480, b"desk"));
        feed(&mut handshake, &rest);

        assert_eq!(handshake.advance().unwrap(), Step::Done);
        assert!(handshake.is_running());

        let mut expected = vec![2];
        expected.extend_from_slice(&auth::encrypt_challenge(&[0u8; 16], b"pass"));
        expected.push(1);
        assert_eq!(outbound(&mut handshake), expected);
    }

    #[test]
    fn test_bytes_after_server_init_left_for_consumer() {
        let mut handshake = at_state(HandshakeState::SessionInit);
        let mut message = server_init(640, 480, b"desk");
        message.extend_from_slice(&[0, 0, 0, 1]); // start of a FramebufferUpdate
        feed(&mut handshake, &message);

        assert_eq!(handshake.advance().unwrap(), Step::Done);
        let (stream, _) = handshake.into_session().unwrap();
        assert_eq!(stream.into_inbound().to_vec(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_into_session_before_running() {
        let handshake = at_state(HandshakeState::SessionInit);
        assert!(matches!(handshake.into_session(), Err(HandshakeError::NotRunning)));
    }

    #[test]
    fn test_step_after_failure() {
        let mut handshake = started(b"pass");
        feed(&mut handshake, b"RFB 003.003\n");
        assert!(handshake.step().is_err());

        assert!(matches!(handshake.step(), Err(HandshakeError::Closed)));
    }

    #[test]
    fn test_transport_closed_by_owner() {
        let mut handshake = at_state(HandshakeState::SecurityChallenge);
        handshake.stream_mut().close();

        assert!(matches!(handshake.step(), Err(HandshakeError::Closed)));
    }

    #[test]
    fn test_state_ordering() {
        assert!(HandshakeState::Disconnected < HandshakeState::ProtocolVersion);
        assert!(HandshakeState::SessionInit < HandshakeState::Running);
        assert_eq!(HandshakeState::SecurityTypeNegotiation.to_string(), "SecurityTypeNegotiation");
    }
}
