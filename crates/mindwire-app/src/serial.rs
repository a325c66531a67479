//! Serial byte source for ThinkGear headsets
//!
//! Wraps a serial port behind the core [`ByteSource`] contract: reads
//! honor the configured timeout and report `Ok(0)` instead of raising, so
//! the frame reader can treat "no data yet" as a recoverable outcome.

use std::io::Read;
use std::time::Duration;

use mindwire_core::ByteSource;

/// Serial connection to a headset.
///
/// Owns the port handle for the life of the session; dropping the source
/// closes the port.
pub struct SerialSource {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialSource {
    /// Open a serial connection.
    ///
    /// # Arguments
    ///
    /// * `port_name` - Serial port name (e.g., "/dev/ttyUSB0" or "COM10")
    /// * `baud_rate` - Baud rate (ThinkGear headsets typically use 57600)
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be opened.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, anyhow::Error> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(1000))
            .open()?;

        Ok(Self { port })
    }

    /// List available serial ports.
    #[must_use]
    pub fn list_ports() -> Vec<String> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .unwrap_or_default()
    }
}

impl ByteSource for SerialSource {
    type Error = std::io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}
