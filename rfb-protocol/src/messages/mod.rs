//! RFB handshake message types.
//!
//! - **Core types** ([`types`]) - ProtocolVersion, PixelFormat and wire constants
//! - **Server messages** ([`server`]) - ServerInit
//! - **Client messages** ([`client`]) - ClientInit
//!
//! # Wire Format Rules
//!
//! All multi-byte integers use network byte order (big-endian). Everything
//! here works on byte slices; reading from the network is the job of
//! [`crate::io`] and the handshake state machine.

pub mod client;
pub mod server;
pub mod types;

pub use client::ClientInit;
pub use server::ServerInit;
pub use types::{PixelFormat, ProtocolVersion};
