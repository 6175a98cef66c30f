//! Serial connection backed by the `serialport` crate.

use super::{PortSettings, SerialConnection};
use crate::error::{Error, Result};
use serialport::SerialPort;
use std::io::{self, Read, Write};

/// An OS serial port. Created closed; [`SerialConnection::open`] attaches
/// to the device.
pub struct SerialPortConnection {
    settings: PortSettings,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortConnection {
    /// A closed connection for `settings`.
    pub const fn new(settings: PortSettings) -> Self {
        Self { settings, port: None }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        let name = &self.settings.port_name;
        self.port.as_mut().ok_or_else(|| Error::ConnectionNotOpen { port: name.clone() })
    }
}

impl SerialConnection for SerialPortConnection {
    fn port_name(&self) -> &str {
        &self.settings.port_name
    }

    fn baud_rate(&self) -> u32 {
        self.settings.baud_rate.value()
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.settings.port_name, self.settings.baud_rate.value())
            .timeout(self.settings.read_timeout)
            .open()
            .map_err(|e| Error::PortOpen { port: self.settings.port_name.clone(), source: e.into() })?;
        log::info!(
            "Opened {} at {} baud (timeout {:?})",
            self.settings.port_name,
            self.settings.baud_rate,
            self.settings.read_timeout
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!("Closed {}", self.settings.port_name);
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port_mut()?.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let waiting = self.port_mut()?.bytes_to_read().map_err(io::Error::from)?;
        Ok(waiting as usize)
    }
}
