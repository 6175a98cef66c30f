//! Serial connection abstraction.
//!
//! The core never talks to an OS port directly. Everything goes through
//! [`SerialConnection`], so the read loop and the monitor can run against
//! real hardware ([`SerialPortConnection`]) or a scripted [`MockConnection`].

pub mod mock;
#[cfg(feature = "hardware")]
pub mod serial;

pub use mock::{MockConnection, MockHandle};
#[cfg(feature = "hardware")]
pub use serial::SerialPortConnection;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Baud rates offered for selection, lowest first.
pub const BAUD_RATES: [u32; 16] = [
    300, 1_200, 2_400, 4_800, 9_600, 19_200, 38_400, 57_600, 74_880, 115_200, 230_400, 250_000,
    500_000, 921_600, 1_000_000, 2_000_000,
];

/// Baud rate selected when nothing else is configured.
pub const DEFAULT_BAUD_RATE: u32 = 921_600;

/// Per-read timeout applied to opened ports.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(400);

/// A baud rate from the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BaudRate(u32);

impl BaudRate {
    /// All supported rates, in selection order.
    pub fn all() -> impl Iterator<Item = Self> {
        BAUD_RATES.iter().copied().map(Self)
    }

    /// The rate in bits per second.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Position of this rate in [`BAUD_RATES`].
    pub fn index(self) -> usize {
        BAUD_RATES.iter().position(|&b| b == self.0).unwrap_or_default()
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self(DEFAULT_BAUD_RATE)
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        if BAUD_RATES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::UnsupportedBaudRate(value))
        }
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.0
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings used to open a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    /// OS device name, e.g. `/dev/ttyACM0` or `COM3`.
    pub port_name: String,
    pub baud_rate: BaudRate,
    /// Upper bound on a single blocking read.
    pub read_timeout: Duration,
}

impl PortSettings {
    /// Settings with the default read timeout.
    pub fn new(port_name: impl Into<String>, baud_rate: BaudRate) -> Self {
        Self { port_name: port_name.into(), baud_rate, read_timeout: DEFAULT_READ_TIMEOUT }
    }

    /// Replace the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// Snapshot of a connection as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub port_name: String,
    pub baud_rate: u32,
    /// Whether the port is currently attached.
    pub is_open: bool,
}

/// Capabilities the monitor needs from a serial device.
///
/// Reads are bounded by the connection's own timeout: a read that times out
/// returns `Ok(0)` rather than an error.
pub trait SerialConnection: Send {
    /// OS device name of the port.
    fn port_name(&self) -> &str;

    /// Configured baud rate.
    fn baud_rate(&self) -> u32;

    /// Whether the port is currently attached.
    fn is_open(&self) -> bool;

    /// Open the port. Opening an already open connection is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Detach from the device. Closing a closed connection is a no-op.
    fn close(&mut self);

    /// Write all bytes and flush.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes, waiting at most the read timeout.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Number of bytes waiting in the input buffer.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Snapshot for the host.
    fn state(&self) -> ConnectionState {
        ConnectionState {
            port_name: self.port_name().to_string(),
            baud_rate: self.baud_rate(),
            is_open: self.is_open(),
        }
    }
}

/// A connection shared between the read loop and the host thread.
#[derive(Clone)]
pub struct SharedConnection {
    inner: Arc<Mutex<Box<dyn SerialConnection>>>,
    port_name: String,
}

impl SharedConnection {
    /// Wrap `connection` for sharing across threads.
    pub fn new(connection: Box<dyn SerialConnection>) -> Self {
        let port_name = connection.port_name().to_string();
        Self { inner: Arc::new(Mutex::new(connection)), port_name }
    }

    /// Port name, readable without taking the lock.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Lock the connection. A poisoned lock means a holder panicked mid-I/O,
    /// which callers treat like a dropped connection.
    pub fn lock(&self) -> Result<MutexGuard<'_, Box<dyn SerialConnection>>> {
        self.inner.lock().map_err(|_| Error::ConnectionNotOpen { port: self.port_name.clone() })
    }

    /// Whether the connection is open; a poisoned lock counts as closed.
    pub fn is_open(&self) -> bool {
        self.lock().map(|conn| conn.is_open()).unwrap_or(false)
    }
}

impl fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnection").field("port_name", &self.port_name).finish()
    }
}
