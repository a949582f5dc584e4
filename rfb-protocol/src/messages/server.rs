//! Server-to-client handshake messages.

use super::types::{
    PixelFormat, MAX_DESKTOP_NAME_LEN, PIXEL_FORMAT_LEN, SERVER_INIT_HEADER_LEN,
};
use std::io;

/// ServerInit message - initial server parameters.
///
/// The handshake keeps the raw ServerInit bytes; this type decodes them for
/// the layer that takes over once the session is running.
///
/// # Wire Format
///
/// - 2 bytes: framebuffer width
/// - 2 bytes: framebuffer height
/// - 16 bytes: PixelFormat
/// - 4 bytes: name length (at most 255 is accepted)
/// - N bytes: desktop name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInit {
    pub framebuffer_width: u16,
    pub framebuffer_height: u16,
    pub pixel_format: PixelFormat,
    pub name: String,
}

impl ServerInit {
    /// Read the name length from a buffered ServerInit header.
    ///
    /// `header` must hold at least [`SERVER_INIT_HEADER_LEN`] bytes.
    pub fn name_length(header: &[u8]) -> u32 {
        let at = SERVER_INIT_HEADER_LEN - 4;
        u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
    }

    /// Copy the PixelFormat record out of a buffered ServerInit header.
    pub fn pixel_format_bytes(header: &[u8]) -> [u8; PIXEL_FORMAT_LEN] {
        let mut pf = [0u8; PIXEL_FORMAT_LEN];
        pf.copy_from_slice(&header[4..4 + PIXEL_FORMAT_LEN]);
        pf
    }

    /// Decode a complete ServerInit message.
    ///
    /// The desktop name is decoded as lossy UTF-8; servers that send Latin-1
    /// names still produce a usable session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The buffer is shorter than the header or the declared name
    /// - The declared name length exceeds 255 bytes
    /// - Bytes follow the declared name
    pub fn parse(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < SERVER_INIT_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "ServerInit header needs {} bytes, got {}",
                    SERVER_INIT_HEADER_LEN,
                    buf.len()
                ),
            ));
        }

        let name_length = Self::name_length(buf);
        if name_length > MAX_DESKTOP_NAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("desktop name length {} exceeds {}", name_length, MAX_DESKTOP_NAME_LEN),
            ));
        }

        let expected = SERVER_INIT_HEADER_LEN + name_length as usize;
        if buf.len() != expected {
            return Err(io::Error::new(
                if buf.len() < expected {
                    io::ErrorKind::UnexpectedEof
                } else {
                    io::ErrorKind::InvalidData
                },
                format!("ServerInit should be {} bytes, got {}", expected, buf.len()),
            ));
        }

        Ok(Self {
            framebuffer_width: u16::from_be_bytes([buf[0], buf[1]]),
            framebuffer_height: u16::from_be_bytes([buf[2], buf[3]]),
            pixel_format: PixelFormat::from_bytes(&Self::pixel_format_bytes(buf)),
            name: String::from_utf8_lossy(&buf[SERVER_INIT_HEADER_LEN..]).into_owned(),
        })
    }

    /// Encode to the wire form. Used by tests and scripted servers.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SERVER_INIT_HEADER_LEN + self.name.len());
        out.extend_from_slice(&self.framebuffer_width.to_be_bytes());
        out.extend_from_slice(&self.framebuffer_height.to_be_bytes());
        out.extend_from_slice(&self.pixel_format.to_bytes());
        out.extend_from_slice(&(self.name.len() as u32).to_be_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out
    }
}
