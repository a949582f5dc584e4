//! Configuration types for the VNC client.
//!
//! Configuration can be built in code with [`Config::builder()`], loaded from a
//! TOML file with [`Config::load()`], or (with the `cli` feature) assembled
//! from command-line arguments.
//!
//! # TOML Format
//!
//! ```toml
//! [connection]
//! host = "vnc.example.com"
//! port = 5901
//! password_file = "/etc/vnc/passwd"
//! timeout_ms = 5000
//! ```

use crate::errors::RfbClientError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete VNC client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings.
    pub connection: ConnectionConfig,
}

/// Connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server hostname or IP address.
    pub host: String,
    /// Server port (typically 5900 + display number).
    #[serde(default = "default_port")]
    pub port: u16,
    /// VNC password (if required).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// File holding the VNC password. A single trailing newline is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    /// Connection and handshake timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_port() -> u16 {
    5900
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            password: None,
            password_file: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse and validate a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`RfbClientError::Config`] if the document is not valid TOML,
    /// does not match the schema, or fails validation.
    pub fn from_toml_str(contents: &str) -> Result<Self, RfbClientError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| RfbClientError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RfbClientError::Config`] if the file cannot be read or its
    /// contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfbClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RfbClientError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), RfbClientError> {
        // Validate host
        if self.connection.host.is_empty() {
            return Err(RfbClientError::Config("Host cannot be empty".to_string()));
        }

        // Validate port
        if self.connection.port == 0 {
            return Err(RfbClientError::Config("Port cannot be 0".to_string()));
        }

        if self.connection.timeout_ms == 0 {
            return Err(RfbClientError::Config("Timeout cannot be 0".to_string()));
        }

        if self.connection.password.is_some() && self.connection.password_file.is_some() {
            return Err(RfbClientError::Config(
                "Specify either password or password_file, not both".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }

    /// Resolve the password into the bytes sent to the authentication step.
    ///
    /// No password configured means an empty password. Characters outside
    /// Latin-1 cannot be represented on the wire and become `'?'`.
    ///
    /// # Errors
    ///
    /// Returns [`RfbClientError::Config`] if the password file cannot be read.
    pub fn password_bytes(&self) -> Result<Vec<u8>, RfbClientError> {
        if let Some(password) = &self.connection.password {
            return Ok(latin1_bytes(password));
        }

        let Some(path) = &self.connection.password_file else {
            return Ok(Vec::new());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| {
            RfbClientError::Config(format!(
                "Failed to read password file {}: {}",
                path.display(),
                e
            ))
        })?;
        let password = contents
            .strip_suffix("\r\n")
            .or_else(|| contents.strip_suffix('\n'))
            .unwrap_or(&contents);
        Ok(latin1_bytes(password))
    }
}

fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Builder for creating a `Config`.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the server hostname or IP address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.connection.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.connection.port = port;
        self
    }

    /// Sets the VNC password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.connection.password = Some(password.into());
        self
    }

    /// Reads the VNC password from a file at connect time.
    #[must_use]
    pub fn password_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.connection.password_file = Some(path.into());
        self
    }

    /// Sets the connection and handshake timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.connection.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Config, RfbClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
