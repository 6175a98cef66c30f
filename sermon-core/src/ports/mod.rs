//! Port listing module.
//!
//! Wraps the OS device listing and restores a previous port selection.

/// Information about an available serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS device name.
    pub name: String,
    pub port_type: PortType,
}

/// Kind of serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortType {
    Usb {
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Bluetooth,
    Pci,
    Unknown,
}

impl PortInfo {
    /// Human-readable description of the port.
    pub fn description(&self) -> String {
        match &self.port_type {
            PortType::Usb { vid, pid, product, .. } => match product {
                Some(product) => format!("USB {product} ({vid:04X}:{pid:04X})"),
                None => format!("USB ({vid:04X}:{pid:04X})"),
            },
            PortType::Bluetooth => "Bluetooth".to_string(),
            PortType::Pci => "PCI".to_string(),
            PortType::Unknown => "Unknown".to_string(),
        }
    }
}

#[cfg(feature = "hardware")]
impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        let port_type = match info.port_type {
            serialport::SerialPortType::UsbPort(usb) => PortType::Usb {
                vid: usb.vid,
                pid: usb.pid,
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            serialport::SerialPortType::BluetoothPort => PortType::Bluetooth,
            serialport::SerialPortType::PciPort => PortType::Pci,
            serialport::SerialPortType::Unknown => PortType::Unknown,
        };
        Self { name: info.port_name, port_type }
    }
}

/// List the serial ports the OS currently reports.
#[cfg(feature = "hardware")]
pub fn list_ports() -> crate::Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(std::io::Error::from)?;
    let ports: Vec<PortInfo> = ports
        .into_iter()
        // On macOS only the calling units (/dev/cu.*) are usable for a monitor
        .filter(|p| !cfg!(target_os = "macos") || !p.port_name.starts_with("/dev/tty."))
        .map(PortInfo::from)
        .collect();
    log::debug!("Found {} serial port(s)", ports.len());
    Ok(ports)
}

/// Index of the first port whose name contains `pattern`.
///
/// An empty pattern selects nothing.
pub fn restore_selection<S: AsRef<str>>(names: &[S], pattern: &str) -> Option<usize> {
    if pattern.is_empty() {
        return None;
    }
    names.iter().position(|name| name.as_ref().contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_selection_substring() {
        let names = ["/dev/cu.Bluetooth-Incoming-Port", "/dev/cu.usbmodem14211", "/dev/cu.usbmodem1421"];
        assert_eq!(restore_selection(&names, "usbmodem1421"), Some(1));
        assert_eq!(restore_selection(&names, "ttyACM0"), None);
        assert_eq!(restore_selection(&names, ""), None);
    }

    #[test]
    fn test_restore_selection_empty_list() {
        let names: Vec<String> = Vec::new();
        assert_eq!(restore_selection(&names, "usb"), None);
    }

    #[test]
    fn test_port_descriptions() {
        let cases = vec![
            (
                PortType::Usb {
                    vid: 0x2341,
                    pid: 0x0043,
                    manufacturer: None,
                    product: Some("Uno".to_string()),
                    serial_number: None,
                },
                "USB Uno (2341:0043)",
            ),
            (
                PortType::Usb { vid: 0x0403, pid: 0x6001, manufacturer: None, product: None, serial_number: None },
                "USB (0403:6001)",
            ),
            (PortType::Bluetooth, "Bluetooth"),
            (PortType::Pci, "PCI"),
            (PortType::Unknown, "Unknown"),
        ];

        for (port_type, expected) in cases {
            let info = PortInfo { name: "/dev/ttyX".to_string(), port_type };
            assert_eq!(info.description(), expected);
        }
    }
}
