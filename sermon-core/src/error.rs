//! Error types shared by the monitor core.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the serial monitor core.
///
/// None of these are fatal to the host: receivers and the monitor log them
/// and surface them as inline console notices.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or write was attempted on a closed connection.
    #[error("connection to {port} is not open")]
    ConnectionNotOpen {
        /// Name of the port that was closed.
        port: String,
    },

    /// The OS refused to open the named port (missing device, permissions).
    #[error("failed to open serial port {port}: {source}")]
    PortOpen {
        /// Name of the port that failed to open.
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// A received line is not a JSON document the caller can use.
    #[error("malformed JSON line: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The read loop did not exit within its grace period.
    #[error("receiver did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    /// Baud rate outside the supported set.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    /// Any other I/O failure on the connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration file could not be read or parsed.
    #[error("invalid config {path}: {reason}")]
    Config {
        /// The file that was being loaded.
        path: PathBuf,
        /// What went wrong reading or parsing it.
        reason: String,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors the read loop treats as transient and retries past.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionNotOpen { .. })
    }
}
