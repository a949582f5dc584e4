//! Core RFB handshake types and wire constants.
//!
//! - [`ProtocolVersion`] - The 12-byte `"RFB xxx.yyy\n"` version message
//! - [`PixelFormat`] - Pixel layout record carried in ServerInit
//! - Fixed message sizes and security type identifiers

use std::fmt;

/// Length of the ProtocolVersion message in bytes.
pub const PROTOCOL_VERSION_LEN: usize = 12;

/// The only protocol major version this client speaks.
pub const SUPPORTED_MAJOR: u16 = 3;

/// Oldest minor version accepted (RFB 3.7 introduced the security type list).
pub const MIN_SUPPORTED_MINOR: u16 = 7;

/// Security type for VNC Authentication (DES challenge/response).
pub const SECURITY_TYPE_VNC_AUTH: u8 = 2;

/// Size of the VNC Authentication challenge and response.
pub const CHALLENGE_LEN: usize = 16;

/// Size of the SecurityResult message.
pub const SECURITY_RESULT_LEN: usize = 4;

/// SecurityResult value meaning "authentication succeeded".
pub const SECURITY_RESULT_OK: u32 = 0;

/// Size of the PixelFormat record.
pub const PIXEL_FORMAT_LEN: usize = 16;

/// Size of the fixed ServerInit header: width, height, pixel format, name length.
pub const SERVER_INIT_HEADER_LEN: usize = 2 + 2 + PIXEL_FORMAT_LEN + 4;

/// Largest desktop name accepted from a server.
pub const MAX_DESKTOP_NAME_LEN: u32 = 255;

/// RFB protocol version as announced by the server.
///
/// # Wire Format
///
/// Exactly 12 ASCII bytes: `"RFB "`, three decimal digits, `'.'`, three
/// decimal digits, `'\n'`.
///
/// # Examples
///
/// ```
/// use rfb_protocol::messages::types::ProtocolVersion;
///
/// let version = ProtocolVersion::parse(b"RFB 003.008\n").unwrap();
/// assert_eq!(version, ProtocolVersion { major: 3, minor: 8 });
/// assert!(version.is_supported());
///
/// assert!(ProtocolVersion::parse(b"RFB 3.8\n").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

impl ProtocolVersion {
    /// Parse a version message. Returns `None` if it is not well-formed.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() != PROTOCOL_VERSION_LEN
            || &buf[0..4] != b"RFB "
            || buf[7] != b'.'
            || buf[11] != b'\n'
        {
            return None;
        }

        let major = parse_digits(&buf[4..7])?;
        let minor = parse_digits(&buf[8..11])?;
        Some(Self { major, minor })
    }

    /// Whether this client can talk to a server announcing this version.
    pub fn is_supported(&self) -> bool {
        self.major == SUPPORTED_MAJOR && self.minor >= MIN_SUPPORTED_MINOR
    }

    /// Encode as the 12-byte wire form.
    pub fn to_bytes(&self) -> [u8; PROTOCOL_VERSION_LEN] {
        let text = format!("RFB {:03}.{:03}\n", self.major % 1000, self.minor % 1000);
        let mut out = [0u8; PROTOCOL_VERSION_LEN];
        out.copy_from_slice(text.as_bytes());
        out
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn parse_digits(digits: &[u8]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &d| {
        if d.is_ascii_digit() {
            Some(acc * 10 + u16::from(d - b'0'))
        } else {
            None
        }
    })
}

/// RFB pixel format specification.
///
/// The handshake captures this record verbatim from ServerInit and does not
/// interpret it; the fields are decoded for the benefit of whoever consumes
/// the session afterwards.
///
/// # Wire Format
///
/// PixelFormat is 16 bytes on the wire:
/// - 1 byte: bits_per_pixel
/// - 1 byte: depth
/// - 1 byte: big_endian
/// - 1 byte: true_color
/// - 2 bytes: red_max
/// - 2 bytes: green_max
/// - 2 bytes: blue_max
/// - 1 byte: red_shift
/// - 1 byte: green_shift
/// - 1 byte: blue_shift
/// - 3 bytes: padding
///
/// # Examples
///
/// ```
/// use rfb_protocol::messages::types::PixelFormat;
///
/// let wire = [32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0];
/// let pf = PixelFormat::from_bytes(&wire);
/// assert_eq!(pf.bits_per_pixel, 32);
/// assert_eq!(pf.red_max, 255);
/// assert_eq!(pf.bytes_per_pixel(), 4);
/// assert_eq!(pf.to_bytes(), wire);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: u8,
    pub true_color: u8,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
    pub padding: [u8; 3],
}

impl PixelFormat {
    /// Calculate bytes per pixel (1, 2, 3, or 4).
    pub fn bytes_per_pixel(&self) -> u8 {
        self.bits_per_pixel.div_ceil(8)
    }

    /// Decode the 16-byte wire record. No field is validated.
    pub fn from_bytes(buf: &[u8; PIXEL_FORMAT_LEN]) -> Self {
        Self {
            bits_per_pixel: buf[0],
            depth: buf[1],
            big_endian: buf[2],
            true_color: buf[3],
            red_max: u16::from_be_bytes([buf[4], buf[5]]),
            green_max: u16::from_be_bytes([buf[6], buf[7]]),
            blue_max: u16::from_be_bytes([buf[8], buf[9]]),
            red_shift: buf[10],
            green_shift: buf[11],
            blue_shift: buf[12],
            padding: [buf[13], buf[14], buf[15]],
        }
    }

    /// Encode back into the exact 16 bytes it was decoded from.
    pub fn to_bytes(&self) -> [u8; PIXEL_FORMAT_LEN] {
        let mut out = [0u8; PIXEL_FORMAT_LEN];
        out[0] = self.bits_per_pixel;
        out[1] = self.depth;
        out[2] = self.big_endian;
        out[3] = self.true_color;
        out[4..6].copy_from_slice(&self.red_max.to_be_bytes());
        out[6..8].copy_from_slice(&self.green_max.to_be_bytes());
        out[8..10].copy_from_slice(&self.blue_max.to_be_bytes());
        out[10] = self.red_shift;
        out[11] = self.green_shift;
        out[12] = self.blue_shift;
        out[13..16].copy_from_slice(&self.padding);
        out
    }
}
