//! In-memory serial connection.
//!
//! Used by the test suites and by `sermon monitor --mock`. Every chunk pushed
//! through [`MockHandle::push`] becomes visible to exactly one poll, which
//! makes multi-poll scenarios deterministic.

use super::{SerialConnection, DEFAULT_BAUD_RATE};
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MockState {
    open: bool,
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    fail_open: bool,
    vanish_on_open: bool,
    poll_errors: VecDeque<io::ErrorKind>,
    open_count: usize,
}

/// Scripted connection; the paired [`MockHandle`] drives it from outside.
pub struct MockConnection {
    port_name: String,
    baud_rate: u32,
    state: Arc<Mutex<MockState>>,
}

/// Remote end of a [`MockConnection`]: feeds input and inspects output.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // The state holds plain data; a panic elsewhere cannot leave it torn.
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl MockConnection {
    /// A closed connection named `port_name` and the handle driving it.
    pub fn new(port_name: impl Into<String>) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let conn = Self { port_name: port_name.into(), baud_rate: DEFAULT_BAUD_RATE, state: state.clone() };
        (conn, MockHandle { state })
    }

    /// Report `baud_rate` instead of the default.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    fn not_open(&self) -> Error {
        Error::ConnectionNotOpen { port: self.port_name.clone() }
    }
}

impl SerialConnection for MockConnection {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    fn open(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_open {
            return Err(Error::PortOpen {
                port: self.port_name.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "device absent"),
            });
        }
        if !state.open {
            state.open = !state.vanish_on_open;
            state.open_count += 1;
        }
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.state).open = false;
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(self.not_open());
        }
        state.written.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(self.not_open());
        }
        let Some(mut chunk) = state.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            state.chunks.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(self.not_open());
        }
        if let Some(kind) = state.poll_errors.pop_front() {
            return Err(io::Error::new(kind, "injected mock failure").into());
        }
        Ok(state.chunks.front().map_or(0, Vec::len))
    }
}

impl MockHandle {
    /// Queue a chunk of input bytes.
    pub fn push(&self, data: impl AsRef<[u8]>) {
        lock(&self.state).chunks.push_back(data.as_ref().to_vec());
    }

    /// Queue `line` followed by `\n` as a single chunk.
    pub fn push_line(&self, line: &str) {
        let mut chunk = line.as_bytes().to_vec();
        chunk.push(b'\n');
        lock(&self.state).chunks.push_back(chunk);
    }

    /// Chunks not yet consumed by a read.
    pub fn pending(&self) -> usize {
        lock(&self.state).chunks.len()
    }

    /// Everything written to the connection so far.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.state).written.clone()
    }

    /// [`Self::written`], lossily decoded.
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written()).into_owned()
    }

    /// Whether the connection side is open.
    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// How many times the connection went from closed to open.
    pub fn open_count(&self) -> usize {
        lock(&self.state).open_count
    }

    /// Make subsequent `open` calls fail with a port error.
    pub fn set_fail_open(&self, fail: bool) {
        lock(&self.state).fail_open = fail;
    }

    /// Let `open` succeed but leave the port closed, like a device that
    /// enumerates and drops off straight away.
    pub fn set_vanish_on_open(&self, vanish: bool) {
        lock(&self.state).vanish_on_open = vanish;
    }

    /// Fail the next availability check with an I/O error of `kind`.
    /// Repeated calls queue consecutive failures.
    pub fn fail_next_poll(&self, kind: io::ErrorKind) {
        lock(&self.state).poll_errors.push_back(kind);
    }

    /// Simulate the device dropping off the bus.
    pub fn unplug(&self) {
        lock(&self.state).open = false;
    }
}
