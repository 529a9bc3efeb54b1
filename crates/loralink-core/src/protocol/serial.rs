//! Serial port handling
//!
//! Opens and enumerates the USB/serial devices behind which the E22 radio
//! sits. The module settings are fixed by the radio: 8 data bits, no
//! parity, one stop bit, no flow control.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::time::Duration;

use super::{TransportError, DEFAULT_BAUD_RATE};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,
    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,
    /// USB product ID (if USB device)
    pub pid: Option<u16>,
    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb) => (Some(usb.vid), Some(usb.pid), usb.product),
            _ => (None, None, None),
        };
        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// List available serial ports in deterministic order, USB adapters first.
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by_key(|p| (p.vid.is_none(), p.name.clone()));
    ports
}

/// Open a serial port configured for the radio (8N1, no flow control).
///
/// The read timeout is kept short so that reads poll rather than block;
/// the transport only reads bytes the port has already buffered.
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, TransportError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

    serialport::new(name, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(100))
        .open()
        .map_err(|e| TransportError::Serial(e.to_string()))
}

/// Clear both serial buffers, discarding stale bytes from before open.
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), TransportError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| TransportError::Serial(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports_does_not_panic() {
        for port in list_ports() {
            println!("Found port: {} - {:?}", port.name, port.product);
        }
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = open_port("/definitely/not/a/port", None);
        assert!(matches!(result, Err(TransportError::Serial(_))));
    }
}
