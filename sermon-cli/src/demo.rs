//! Simulated device for `sermon monitor --mock`.
//!
//! Feeds a [`MockHandle`] with boot logs and periodic status documents, and
//! acknowledges every command the host writes.

use crossbeam_channel::{RecvTimeoutError, Sender};
use sermon_core::MockHandle;
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;

const BOOT_LOG: [&str; 3] = [
    "I (31) boot: ESP-IDF v5.1 2nd stage bootloader",
    "I (312) wifi: connected, rssi -61",
    "I (1203) evse: boot complete",
];

/// Background generator driving a mock connection.
pub struct DemoDevice {
    stop_tx: Option<Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl DemoDevice {
    pub fn spawn(mock: MockHandle, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let thread_handle = thread::Builder::new().name("sermon-demo".to_string()).spawn(move || {
            for line in BOOT_LOG {
                mock.push_line(line);
            }
            let mut acked = 0;
            let mut tick = 0u64;
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                acked = acknowledge(&mock, acked);
                tick += 1;
                mock.push_line(&status_document(tick).to_string());
            }
            log::debug!("Demo device stopped after {tick} status documents");
        })?;
        Ok(Self { stop_tx: Some(stop_tx), thread_handle: Some(thread_handle) })
    }

    pub fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DemoDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reply to each complete command written since byte `acked`. Returns the
/// new acknowledged position.
fn acknowledge(mock: &MockHandle, acked: usize) -> usize {
    let written = mock.written_text();
    let Some(pending) = written.get(acked..) else {
        return acked;
    };
    let mut consumed = 0;
    while let Some(end) = pending[consumed..].find("\r\n") {
        let command = &pending[consumed..consumed + end];
        mock.push_line(&json!({ "ack": command }).to_string());
        consumed += end + 2;
    }
    acked + consumed
}

/// Status document the demo device prints at every tick.
pub fn status_document(tick: u64) -> Value {
    let charging = tick % 8 >= 4;
    json!({
        "uptime": tick,
        "evse": {
            "state": if charging { "charging" } else { "idle" },
            "pilot": { "duty": if charging { 26 } else { 100 }, "volts": [if charging { 6 } else { 9 }, -12] },
        },
        "meter": {
            "amps": if charging { json!([16.0, 15.9, 16.1]) } else { json!([0.0, 0.0, 0.0]) },
            "sessions": tick / 8,
        },
        "errors": [],
    })
}
