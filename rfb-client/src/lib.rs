//! Async VNC client connector.
//!
//! This crate owns the network side of an RFB connection: it opens the TCP
//! socket, drives the sans-I/O handshake from `rfb-protocol` over it, and
//! hands back the socket with the negotiated session once the server has sent
//! ServerInit.
//!
//! # Features
//!
//! - **Async I/O**: Built on tokio; any `AsyncRead + AsyncWrite` transport works
//! - **VNC Authentication**: DES challenge/response with the configured password
//! - **Configuration management**: Builder, TOML files, and (feature `cli`)
//!   command-line arguments
//! - **Fail-fast policy**: Every protocol violation ends the handshake with a
//!   typed error
//!
//! # Quick Start
//!
//! ```no_run
//! use rfb_client::{establish, Config};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::builder()
//!         .host("localhost")
//!         .port(5900)
//!         .password("secret")
//!         .build()?;
//!
//!     let connection = establish(&config).await?;
//!     let (width, height) = connection.size();
//!     println!("Connected to {} ({}x{})", connection.name(), width, height);
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Errors are categorized as either:
//! - **Fatal**: Authentication failures, configuration errors, protocol violations
//! - **Retryable**: Network errors, timeouts, early disconnects
//!
//! Retrying is left to the caller.
//!
//! # Safety
//!
//! This crate is `#![forbid(unsafe_code)]` and uses only safe Rust.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod errors;
pub mod transport;

// Private implementation modules
mod connection;

// Optional CLI support
#[cfg(feature = "cli")]
pub mod args;

// Re-exports
pub use config::Config;
pub use connection::{drive_handshake, establish, Connection};
pub use errors::RfbClientError;
pub use rfb_protocol::{PixelFormat, ServerInit, Session};
