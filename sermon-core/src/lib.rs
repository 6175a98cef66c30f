//! Sermon Core - serial debug monitor engine.
//!
//! This crate owns the serial connection, the background line receiver and
//! the JSON flattening used to inspect structured debug output. Hosts (the
//! `sermon` CLI, tests, benches) drive it through [`Monitor`] or use the
//! pieces directly.

pub mod config;
pub mod connection;
pub mod console;
pub mod error;
pub mod flatten;
pub mod inspector;
pub mod ports;
pub mod receiver;
pub mod session;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use connection::{
    BaudRate, ConnectionState, MockConnection, MockHandle, PortSettings, SerialConnection, SharedConnection,
};
#[cfg(feature = "hardware")]
pub use connection::SerialPortConnection;
pub use console::ConsoleBuffer;
pub use error::{Error, Result};
pub use flatten::{display_value, flatten, flatten_sorted, parse_line, FlatMap};
pub use inspector::{DebugInspector, DetailRow};
#[cfg(feature = "hardware")]
pub use ports::list_ports;
pub use ports::{restore_selection, PortInfo, PortType};
pub use receiver::{Frame, LineReceiver, ReceiverOptions};
pub use session::{Monitor, MonitorEvent, Submission};
