//! Background line receiver.
//!
//! Polls a shared serial connection on a dedicated thread, splits the input
//! into `\n`-terminated frames and hands each one to a single consumer.
//! The consumer runs on the receiver thread; hosts that need frames on their
//! own thread use [`LineReceiver::start_channel`] and drain the channel.

pub mod framer;

pub use framer::LineFramer;

use crate::connection::SharedConnection;
use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Display format of frame timestamps: hour:minute:second:microseconds.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S:%6f";

/// One timestamped line received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Arrival index, starting at 0 for each receiver.
    pub seq: u64,
    /// Taken when the poll that produced this frame began.
    pub timestamp: DateTime<Local>,
    /// Line bytes without the `\n` delimiter.
    pub raw: Vec<u8>,
}

impl Frame {
    /// The line as text, lossily decoded, with a trailing `\r` removed.
    pub fn text(&self) -> Cow<'_, str> {
        let raw = self.raw.strip_suffix(b"\r").unwrap_or(self.raw.as_slice());
        String::from_utf8_lossy(raw)
    }

    /// Timestamp rendered with [`TIMESTAMP_FORMAT`].
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Tuning of the read loop.
#[derive(Debug, Clone)]
pub struct ReceiverOptions {
    /// Wait between polls that found no input.
    pub poll_interval: Duration,
    /// How long [`LineReceiver::stop`] waits for the thread to exit.
    pub shutdown_grace: Duration,
    /// Open a closed connection on start instead of failing.
    pub open_if_closed: bool,
    /// Upper bound on bytes taken from the port per poll.
    pub read_chunk: usize,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            shutdown_grace: Duration::from_secs(1),
            open_if_closed: true,
            read_chunk: 1024,
        }
    }
}

/// Handle to a running read loop. Dropping it stops the loop.
pub struct LineReceiver {
    port_name: String,
    stop_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
    shutdown_grace: Duration,
}

impl LineReceiver {
    /// Start polling `connection`, calling `on_frame` for every line.
    pub fn start<F>(connection: SharedConnection, options: ReceiverOptions, on_frame: F) -> Result<Self>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        Self::start_with_errors(connection, options, on_frame, |_| {})
    }

    /// Like [`Self::start`], and also report read failures to `on_error`.
    ///
    /// Only the first error of a run of failed polls is reported; the run
    /// ends with the next poll that succeeds.
    pub fn start_with_errors<F, E>(
        connection: SharedConnection,
        options: ReceiverOptions,
        on_frame: F,
        on_error: E,
    ) -> Result<Self>
    where
        F: FnMut(Frame) + Send + 'static,
        E: FnMut(&Error) + Send + 'static,
    {
        ensure_open(&connection, &options)?;

        let port_name = connection.port_name().to_string();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        let shutdown_grace = options.shutdown_grace;

        let read_loop = ReadLoop {
            buf: vec![0u8; options.read_chunk.max(1)],
            connection,
            options,
            stop_rx,
            running: running.clone(),
            framer: LineFramer::new(),
            seq: 0,
        };

        let thread_handle = thread::Builder::new().name("sermon-reader".to_string()).spawn(move || {
            read_loop.run(on_frame, on_error);
            let _ = done_tx.send(());
        })?;

        log::info!("Receiving thread started on {port_name}");
        Ok(Self {
            port_name,
            stop_tx: Some(stop_tx),
            done_rx,
            running,
            thread_handle: Some(thread_handle),
            shutdown_grace,
        })
    }

    /// Start polling and deliver frames through a channel.
    pub fn start_channel(connection: SharedConnection, options: ReceiverOptions) -> Result<(Self, Receiver<Frame>)> {
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let receiver = Self::start(connection, options, move |frame| {
            let _ = frame_tx.send(frame);
        })?;
        Ok((receiver, frame_rx))
    }

    /// True from a successful start until [`Self::stop`] is called.
    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some()
    }

    /// Ask the loop to exit and wait up to the grace period for it.
    ///
    /// A loop that overruns the grace period is abandoned, not killed; the
    /// receiver still counts as stopped and delivers nothing further.
    pub fn stop(&mut self) {
        let Some(stop_tx) = self.stop_tx.take() else {
            return;
        };
        log::info!("Stopping receiving thread on {}", self.port_name);
        self.running.store(false, Ordering::SeqCst);
        drop(stop_tx);

        match self.done_rx.recv_timeout(self.shutdown_grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.thread_handle.take() {
                    if handle.join().is_err() {
                        log::error!("Receiving thread on {} panicked", self.port_name);
                    }
                }
                log::debug!("Receiving thread on {} stopped", self.port_name);
            }
            Err(RecvTimeoutError::Timeout) => {
                self.thread_handle = None;
                log::warn!("{}; abandoning thread on {}", Error::ShutdownTimeout(self.shutdown_grace), self.port_name);
            }
        }
    }
}

impl Drop for LineReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn ensure_open(connection: &SharedConnection, options: &ReceiverOptions) -> Result<()> {
    let mut conn = connection.lock()?;
    if conn.is_open() {
        return Ok(());
    }
    if !options.open_if_closed {
        return Err(Error::ConnectionNotOpen { port: connection.port_name().to_string() });
    }
    log::warn!("Connection to {} not yet active, opening it", connection.port_name());
    conn.open()?;
    if conn.is_open() {
        Ok(())
    } else {
        Err(Error::ConnectionNotOpen { port: connection.port_name().to_string() })
    }
}

struct ReadLoop {
    connection: SharedConnection,
    options: ReceiverOptions,
    stop_rx: Receiver<()>,
    running: Arc<AtomicBool>,
    framer: LineFramer,
    buf: Vec<u8>,
    seq: u64,
}

impl ReadLoop {
    fn run<F: FnMut(Frame), E: FnMut(&Error)>(mut self, mut on_frame: F, mut on_error: E) {
        log::debug!("Serial read thread started");
        let mut failing = false;
        while self.running.load(Ordering::SeqCst) {
            let started = Local::now();
            match self.poll_once() {
                Ok(Some(raw)) => {
                    failing = false;
                    // stop() may have returned while this poll was reading
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    log::debug!("Read line: {}", String::from_utf8_lossy(&raw));
                    let frame = Frame { seq: self.seq, timestamp: started, raw };
                    self.seq += 1;
                    on_frame(frame);
                    continue;
                }
                Ok(None) => failing = false,
                Err(e) if failing => log::debug!("Serial read on {} still failing: {e}", self.connection.port_name()),
                Err(e) => {
                    if e.is_transient() {
                        log::warn!("Serial read on {} failed: {e}", self.connection.port_name());
                    } else {
                        log::error!("Serial read on {} failed: {e}", self.connection.port_name());
                    }
                    failing = true;
                    if self.running.load(Ordering::SeqCst) {
                        on_error(&e);
                    }
                }
            }

            match self.stop_rx.recv_timeout(self.options.poll_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::debug!("Serial read thread exiting ({} frames, {} bytes unframed)", self.seq, self.framer.pending());
    }

    /// One availability check: `Ok(None)` when there is no complete line yet.
    fn poll_once(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(line) = self.framer.next_line() {
            return Ok(Some(line));
        }

        let mut conn = self.connection.lock()?;
        if !conn.is_open() {
            return Ok(None);
        }
        let available = conn.bytes_available()?;
        if available == 0 {
            return Ok(None);
        }
        let want = available.min(self.buf.len());
        let n = conn.read(&mut self.buf[..want])?;
        drop(conn);

        self.framer.push(&self.buf[..n]);
        Ok(self.framer.next_line())
    }
}
