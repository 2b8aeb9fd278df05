//! Configuration for XML output

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Output options for one conversion call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Whether to format output with newlines and two-space indentation
    pub pretty_print: bool,

    /// Decimal places kept when formatting coordinates; trailing zeros are
    /// trimmed. The default round-trips within 1e-6 of the source values.
    pub precision: u8,

    /// Hard cap on output size in bytes; growth past it aborts the
    /// conversion with no partial document
    pub max_output_bytes: Option<usize>,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            precision: 8,
            max_output_bytes: None,
        }
    }
}

impl WriteConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to pretty-print output
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set the numeric precision (decimal places)
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// Set the output size cap in bytes
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
