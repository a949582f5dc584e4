//! Client-to-server handshake messages.

/// ClientInit message - client initialization.
///
/// Sent by the client after a successful SecurityResult. Indicates whether
/// the client wants a shared or exclusive session. The handshake always asks
/// for a shared session.
///
/// # Wire Format
///
/// - 1 byte: shared flag (0 = exclusive, 1 = shared)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInit {
    pub shared: bool,
}

impl ClientInit {
    /// The only ClientInit this client ever sends.
    pub const SHARED: Self = Self { shared: true };

    /// Encode as the single wire byte.
    pub fn to_bytes(self) -> [u8; 1] {
        [u8::from(self.shared)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_init_encoding() {
        assert_eq!(ClientInit::SHARED.to_bytes(), [1]);
        assert_eq!(ClientInit { shared: false }.to_bytes(), [0]);
    }
}
