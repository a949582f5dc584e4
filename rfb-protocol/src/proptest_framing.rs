//! Property tests for handshake framing.
//!
//! These tests verify that the handshake reaches the same result no matter
//! how the server's bytes are fragmented, which is what happens on real
//! network streams.
