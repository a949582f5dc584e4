//! Command-line argument parsing for VNC client applications.
//!
//! This module is only available when the `cli` feature is enabled.
//! It provides a structured way to parse command-line arguments and
//! convert them into a `Config` object.
//!
//! # Examples
//!
//! ```no_run
//! use rfb_client::args::{init_logging, Args};
//! use rfb_client::Config;
//!
//! let args = Args::parse();
//! init_logging(args.verbose);
//! let config = Config::from_args(args)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::Config;
use crate::errors::RfbClientError;
use clap::Parser;
use std::path::PathBuf;

/// VNC client command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// VNC server address (host, host:port or host:display)
    ///
    /// Examples:
    ///   - localhost (port 5900)
    ///   - 192.168.1.100:0 (display :0 = port 5900)
    ///   - vnc.example.com:5905
    #[arg(value_name = "SERVER", required_unless_present = "config")]
    pub server: Option<String>,

    /// Server port (overrides port in SERVER if specified)
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Password for VNC authentication
    #[arg(short = 'P', long, value_name = "PASSWORD", env = "VNC_PASSWORD")]
    pub password: Option<String>,

    /// Read the password from a file
    #[arg(long, value_name = "FILE", conflicts_with = "password")]
    pub password_file: Option<PathBuf>,

    /// Connection and handshake timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Configuration file path (TOML format)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Parse command-line arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse arguments from an iterator.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }
}

/// Install a `tracing` subscriber for command-line tools.
///
/// `verbose` is the `-v` count: 0 logs at info, 1 at debug, 2 or more at trace.
/// `RUST_LOG` overrides the level when set.
pub fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

impl Config {
    /// Create a configuration from command-line arguments.
    ///
    /// If a config file is specified in the arguments, it will be loaded
    /// first, then overridden by explicit command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The server address is invalid
    /// - The configuration validation fails
    pub fn from_args(args: Args) -> Result<Self, RfbClientError> {
        // Start with config file if provided
        let mut config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        // Override with command-line arguments
        if let Some(server) = &args.server {
            let (host, port) = parse_server_address(server)?;
            config.connection.host = host;
            config.connection.port = port;
        }

        // Explicit port wins over the one parsed from SERVER
        if let Some(port) = args.port {
            config.connection.port = port;
        }

        if let Some(password) = args.password {
            config.connection.password = Some(password);
            config.connection.password_file = None;
        } else if let Some(path) = args.password_file {
            config.connection.password_file = Some(path);
            config.connection.password = None;
        }

        if let Some(timeout_ms) = args.timeout_ms {
            config.connection.timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse server address in the format "host", "host:port" or "host:display".
///
/// VNC display numbers (0-99) are converted to port numbers (5900-5999).
fn parse_server_address(server: &str) -> Result<(String, u16), RfbClientError> {
    if let Some((host, port_or_display)) = server.rsplit_once(':') {
        let num = port_or_display.parse::<u16>().map_err(|_| {
            RfbClientError::Config(format!(
                "Invalid port or display number: {}",
                port_or_display
            ))
        })?;

        let port = if num < 100 {
            // Display number: :0 = 5900, :1 = 5901, etc.
            5900 + num
        } else {
            // Direct port number
            num
        };

        Ok((host.to_string(), port))
    } else {
        // No port specified, use default VNC port
        Ok((server.to_string(), 5900))
    }
}
