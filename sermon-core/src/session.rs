//! Monitor session.
//!
//! Owns the connection and the background receiver, and publishes what the
//! host should show as [`MonitorEvent`]s on a channel. The host thread
//! connects, disconnects and submits commands; the receiver thread only reads.

use crate::connection::{ConnectionState, SerialConnection, SharedConnection};
use crate::error::{Error, Result};
use crate::receiver::{Frame, LineReceiver, ReceiverOptions};
use crossbeam_channel::{Receiver, Sender};
use std::thread;
use std::time::Duration;

/// Pause between opening the port and starting to read from it.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Typed by the user to close the port and quit.
pub const EXIT_COMMAND: &str = "exit";

/// Line terminator appended to submitted commands.
pub const LINE_ENDING: &str = "\r\n";

/// What the host shows in its console.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A line received from the device.
    Frame(Frame),
    /// An inline console message from the monitor itself.
    Notice(String),
}

/// Outcome of [`Monitor::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The command went out; `echo` is what the console shows for it.
    Sent { echo: String },
    /// The user asked to quit. The connection is already closed.
    Exit,
}

/// A serial monitor session.
pub struct Monitor {
    connection: SharedConnection,
    options: ReceiverOptions,
    receiver: Option<LineReceiver>,
    event_tx: Sender<MonitorEvent>,
    event_rx: Receiver<MonitorEvent>,
}

impl Monitor {
    /// A closed session over `connection`.
    pub fn new(connection: Box<dyn SerialConnection>, options: ReceiverOptions) -> Self {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        Self { connection: SharedConnection::new(connection), options, receiver: None, event_tx, event_rx }
    }

    /// Receiver side of the event channel. All clones share one queue.
    pub fn events(&self) -> Receiver<MonitorEvent> {
        self.event_rx.clone()
    }

    /// Whether the port is open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Whether a read loop is attached.
    pub fn is_receiving(&self) -> bool {
        self.receiver.as_ref().is_some_and(LineReceiver::is_running)
    }

    /// Snapshot of the underlying connection.
    pub fn state(&self) -> Result<ConnectionState> {
        Ok(self.connection.lock()?.state())
    }

    fn notice(&self, message: impl Into<String>) {
        let _ = self.event_tx.send(MonitorEvent::Notice(message.into()));
    }

    /// Open the port and start receiving.
    ///
    /// A read loop left over from a port that has since closed is stopped
    /// and replaced.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_receiving() && self.is_connected() {
            return Ok(());
        }
        if let Some(mut stale) = self.receiver.take() {
            log::debug!("Dropping stale receiver on {}", self.connection.port_name());
            stale.stop();
        }
        self.notice("** Opening Serial Port");

        let opened = self.connection.lock().and_then(|mut conn| {
            conn.open()?;
            Ok(conn.baud_rate())
        });
        let baud_rate = match opened {
            Ok(baud_rate) => baud_rate,
            Err(e) => {
                log::error!("{e}");
                self.notice("** An Error Occurred while Opening the Serial Port");
                return Err(e);
            }
        };
        self.notice(format!("** Baud Rate: {baud_rate}"));

        thread::sleep(SETTLE_DELAY);

        // The port was opened above; if it vanished during the settle delay
        // the receiver must fail rather than reopen it.
        let options = ReceiverOptions { open_if_closed: false, ..self.options.clone() };
        let frame_tx = self.event_tx.clone();
        let error_tx = self.event_tx.clone();
        let started = LineReceiver::start_with_errors(
            self.connection.clone(),
            options,
            move |frame| {
                let _ = frame_tx.send(MonitorEvent::Frame(frame));
            },
            move |e| {
                let notice = format!("** An Error Occurred while Reading the Serial Port: {e}");
                let _ = error_tx.send(MonitorEvent::Notice(notice));
            },
        );
        let receiver = match started {
            Ok(receiver) => receiver,
            Err(e) => {
                log::error!("{e}");
                if let Ok(mut conn) = self.connection.lock() {
                    conn.close();
                }
                self.notice("** An Error Occurred while Opening the Serial Port");
                return Err(e);
            }
        };
        self.receiver = Some(receiver);
        log::debug!("Port {} is open now, ready to receive", self.connection.port_name());
        Ok(())
    }

    /// Stop receiving, then close the port.
    pub fn disconnect(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.stop();
        }
        match self.connection.lock() {
            Ok(mut conn) => conn.close(),
            Err(e) => log::warn!("Could not close {}: {e}", self.connection.port_name()),
        }
        log::debug!("Port {} is closed, ready to open", self.connection.port_name());
    }

    /// Connect when closed, disconnect when open. Returns the new state.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_connected() {
            self.disconnect();
            Ok(false)
        } else {
            self.connect()?;
            Ok(true)
        }
    }

    /// Send a user command, or close the session on `exit`.
    pub fn submit(&mut self, text: &str) -> Result<Submission> {
        if text == EXIT_COMMAND {
            self.disconnect();
            return Ok(Submission::Exit);
        }

        let mut conn = self.connection.lock()?;
        if !conn.is_open() {
            return Err(Error::ConnectionNotOpen { port: conn.port_name().to_string() });
        }
        let mut payload = Vec::with_capacity(text.len() + LINE_ENDING.len());
        payload.extend_from_slice(text.as_bytes());
        payload.extend_from_slice(LINE_ENDING.as_bytes());
        conn.write(&payload)?;
        log::debug!("Sent {} bytes to {}", payload.len(), conn.port_name());

        Ok(Submission::Sent { echo: format!("\r\n>> {text}") })
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.stop();
        }
    }
}
