//! Serial port configuration and connection management
//!
//! Handles USB serial port discovery and the serialport-backed transport
//! for the companion board.

use super::link::Transport;
use crate::config::DEFAULT_BAUD;
use crate::error::DeviceError;
use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyACM0, COM3)
    pub port_path: String,
    /// Baud rate (default: 9600)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: DataBits,
    /// Parity (default: None)
    pub parity: Parity,
    /// Stop bits (default: 1)
    pub stop_bits: StopBits,
    /// Flow control (default: None)
    pub flow_control: FlowControl,
    /// Per-read timeout; the line link does the real waiting
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::from("/dev/ttyACM0"),
            baud_rate: DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(10),
        }
    }
}

impl PortConfig {
    /// Create a new configuration with the companion board's 8N1 settings
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Serial connection to the companion board
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    port_path: String,
}

impl SerialConnection {
    /// Open and configure the port. Any failure is `PortUnavailable`.
    pub fn open(config: PortConfig) -> Result<Self, DeviceError> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| DeviceError::PortUnavailable {
                port: config.port_path.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "Opened {} at {} baud (8N1, no flow control)",
            config.port_path, config.baud_rate
        );

        Ok(Self {
            port,
            port_path: config.port_path,
        })
    }
}

impl Transport for SerialConnection {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(data.len())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) {
        // The handle is released when the boxed port drops; flush what is left.
        let _ = self.port.flush();
        info!("Closing {}", self.port_path);
    }
}

/// Information about a detected serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// List all available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().with_context(|| "Failed to enumerate serial ports")?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    PortType::UsbSerial,
                    info.manufacturer,
                    info.product,
                    info.serial_number,
                    Some(info.vid),
                    Some(info.pid),
                ),
                serialport::SerialPortType::PciPort => {
                    (PortType::PciSerial, None, None, None, None, None)
                }
                serialport::SerialPortType::BluetoothPort => {
                    (PortType::Bluetooth, None, None, None, None, None)
                }
                serialport::SerialPortType::Unknown => {
                    (PortType::Unknown, None, None, None, None, None)
                }
            };

            PortInfo {
                path: p.port_name,
                port_type,
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect())
}

/// Print formatted list of available serial ports
pub fn print_ports() -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Plug in the game board over USB");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyACM* /dev/ttyUSB*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in ports {
        let marker = if is_companion_candidate(&port) {
            " [game board?]".green().to_string()
        } else {
            String::new()
        };
        println!("\n{}: {}{}", "Port".cyan(), port.path.white().bold(), marker);
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let Some(ref serial) = port.serial_number {
            println!("  Serial: {}", serial);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            println!("  VID:PID: {:04x}:{:04x}", vid, pid);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        "Use: reflex-host play -p <PORT> to start a game".yellow()
    );

    Ok(())
}

/// Whether a port looks like a microcontroller board or USB-UART bridge
pub fn is_companion_candidate(p: &PortInfo) -> bool {
    if p.port_type != PortType::UsbSerial {
        return false;
    }

    if let (Some(vid), Some(pid)) = (p.vid, p.pid) {
        match vid {
            // Arduino LLC / Arduino SRL
            0x2341 | 0x2a03 => return true,
            // FTDI
            0x0403 => return true,
            // Silicon Labs CP210x
            0x10c4 if pid == 0xea60 || pid == 0xea70 => return true,
            // WCH CH340/CH341
            0x1a86 if pid == 0x7523 || pid == 0x5523 => return true,
            // Prolific PL2303
            0x067b if pid == 0x2303 => return true,
            _ => {}
        }
    }

    if let Some(ref prod) = p.product {
        let prod_lower = prod.to_lowercase();
        return prod_lower.contains("arduino")
            || prod_lower.contains("serial")
            || prod_lower.contains("uart")
            || prod_lower.contains("usb");
    }

    false
}

/// Auto-detect ports that likely carry the game board
pub fn detect_companion_ports() -> Result<Vec<PortInfo>> {
    Ok(list_ports()?
        .into_iter()
        .filter(is_companion_candidate)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usb(vid: u16, pid: u16, product: Option<&str>) -> PortInfo {
        PortInfo {
            path: "/dev/ttyACM0".to_string(),
            port_type: PortType::UsbSerial,
            manufacturer: None,
            product: product.map(str::to_string),
            serial_number: None,
            vid: Some(vid),
            pid: Some(pid),
        }
    }

    #[test]
    fn test_default_config() {
        let config = PortConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn test_config_builder() {
        let config = PortConfig::new("/dev/ttyUSB1").with_baud_rate(115200);

        assert_eq!(config.port_path, "/dev/ttyUSB1");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timeout, Duration::from_millis(10));
    }

    #[test]
    fn test_open_missing_port_is_unavailable() {
        let err = SerialConnection::open(PortConfig::new("/dev/does-not-exist-reflex"))
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/dev/does-not-exist-reflex"));
    }

    #[test]
    fn test_companion_detection() {
        assert!(is_companion_candidate(&usb(0x2341, 0x0043, None)));
        assert!(is_companion_candidate(&usb(0x1a86, 0x7523, None)));
        assert!(is_companion_candidate(&usb(0x1234, 0x0001, Some("Arduino Uno"))));
        assert!(!is_companion_candidate(&usb(0x1234, 0x0001, Some("Keyboard"))));

        let mut bt = usb(0x2341, 0x0043, None);
        bt.port_type = PortType::Bluetooth;
        assert!(!is_companion_candidate(&bt));
    }
}
