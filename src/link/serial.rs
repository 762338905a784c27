//! Serial port transport.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::core::Transport;

/// Read timeout for a single byte once the port reports data.
const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// A [`Transport`] over a local serial device.
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`, 8N1.
    ///
    /// On failure the ports that do exist are logged.
    pub fn open(path: &str, baud_rate: u32) -> io::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(SERIAL_READ_TIMEOUT)
            .open()
            .map_err(|err| {
                tracing::error!(port = path, error = %err, "failed to open serial port");
                match available_ports() {
                    Ok(ports) if !ports.is_empty() => {
                        tracing::info!(available = ?ports, "available serial ports");
                    }
                    _ => tracing::info!("no serial ports found"),
                }
                io::Error::from(err)
            })?;
        tracing::info!(port = path, baud_rate, "serial port opened");
        Ok(Self {
            name: path.to_string(),
            port: Some(port),
        })
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::ErrorKind::NotConnected.into())
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()
    }

    fn is_ready(&mut self) -> io::Result<bool> {
        Ok(self.port()?.bytes_to_read()? > 0)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.port()?.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.name, "serial port closed");
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn describe(&self) -> String {
        format!("serial:{}", self.name)
    }
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> io::Result<Vec<String>> {
    Ok(serialport::available_ports()
        .map_err(io::Error::from)?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}
