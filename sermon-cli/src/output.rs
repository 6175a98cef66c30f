//! Text rendering for the terminal host.

use sermon_core::connection::DEFAULT_BAUD_RATE;
use sermon_core::{display_value, flatten_sorted, restore_selection, BaudRate, DetailRow, PortInfo};
use serde_json::Value;

/// One `key: K, val: V` line per flattened entry, sorted by key.
pub fn flatten_lines(value: &Value) -> Vec<String> {
    flatten_sorted(value).iter().map(|(key, val)| format!("key: {key}, val: {}", display_value(val))).collect()
}

/// Supported baud rates, the default one marked.
pub fn baud_lines() -> Vec<String> {
    BaudRate::all()
        .map(|rate| {
            if rate.value() == DEFAULT_BAUD_RATE {
                format!("{rate} (default)")
            } else {
                rate.to_string()
            }
        })
        .collect()
}

pub fn port_lines(ports: &[PortInfo]) -> Vec<String> {
    ports.iter().map(|p| format!("{}  {}", p.name, p.description())).collect()
}

/// Detail rows of the inspected key, indented under the frame.
pub fn detail_lines(key: &str, rows: &[DetailRow]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!("  [{key}]"));
    lines.extend(rows.iter().map(|row| format!("    key: {}, val: {}", row.key, row.value)));
    lines
}

/// The first listed port containing `pattern`, or `pattern` itself when
/// nothing matches.
pub fn resolve_port(names: &[String], pattern: &str) -> String {
    restore_selection(names, pattern).map_or_else(|| pattern.to_string(), |i| names[i].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sermon_core::PortType;
    use serde_json::json;

    #[test]
    fn test_flatten_lines_sorted() {
        let doc = json!({"b": {"y": "on", "x": [1, 2]}, "a": null});
        assert_eq!(flatten_lines(&doc), ["key: a, val: null", "key: b_x_0, val: 1", "key: b_x_1, val: 2", "key: b_y, val: on"]);
    }

    #[test]
    fn test_baud_lines_mark_default() {
        let lines = baud_lines();
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], "300");
        assert_eq!(lines[13], "921600 (default)");
        assert_eq!(lines.iter().filter(|l| l.ends_with("(default)")).count(), 1);
    }

    #[test]
    fn test_port_lines() {
        let ports = vec![
            PortInfo { name: "/dev/ttyS0".into(), port_type: PortType::Unknown },
            PortInfo {
                name: "/dev/ttyACM0".into(),
                port_type: PortType::Usb {
                    vid: 0x2341,
                    pid: 0x0043,
                    manufacturer: None,
                    product: Some("EVSE Debug".into()),
                    serial_number: None,
                },
            },
        ];
        assert_eq!(port_lines(&ports), ["/dev/ttyS0  Unknown", "/dev/ttyACM0  USB EVSE Debug (2341:0043)"]);
    }

    #[test]
    fn test_detail_lines() {
        let rows = vec![DetailRow { key: "pilot_duty".into(), value: "53".into() }];
        assert_eq!(detail_lines("evse", &rows), ["  [evse]", "    key: pilot_duty, val: 53"]);
    }

    #[test]
    fn test_resolve_port() {
        let names = vec!["/dev/cu.Bluetooth".to_string(), "/dev/cu.usbmodem1421".to_string()];
        assert_eq!(resolve_port(&names, "usbmodem"), "/dev/cu.usbmodem1421");
        assert_eq!(resolve_port(&names, "/dev/ttyUSB0"), "/dev/ttyUSB0");
        assert_eq!(resolve_port(&[], "COM3"), "COM3");
    }
}
