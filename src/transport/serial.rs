// src/transport/serial.rs

use crate::common::{LinkSettings, LinkTransport};
use core::time::Duration;
use log::{debug, info};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};

/// How long a single `read` may block when nothing is pending.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum SerialLinkError {
    #[error("serial port is not open")]
    NotOpen,

    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
}

/// [`LinkTransport`] over a real serial port.
pub struct SerialLink {
    port: Option<Box<dyn SerialPort>>,
}

impl core::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.port.as_ref().and_then(|p| p.name()))
            .finish()
    }
}

impl SerialLink {
    pub fn new() -> Self {
        SerialLink { port: None }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, SerialLinkError> {
        self.port.as_mut().ok_or(SerialLinkError::NotOpen)
    }
}

impl Default for SerialLink {
    fn default() -> Self {
        SerialLink::new()
    }
}

impl LinkTransport for SerialLink {
    type Error = SerialLinkError;

    fn open(&mut self, settings: &LinkSettings) -> Result<(), Self::Error> {
        self.close();

        let port = serialport::new(settings.path.to_string_lossy(), settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;

        info!(
            "opened {} at {} baud",
            settings.path.display(),
            settings.baud_rate
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            debug!("closing {}", port.name().unwrap_or_default());
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        let pending = self.port()?.bytes_to_read()?;
        Ok(usize::try_from(pending).unwrap_or(usize::MAX))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.port()?.read(buf) {
            Ok(n) => Ok(n),
            // Nothing arrived within the read timeout
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn flush_input(&mut self) -> Result<(), Self::Error> {
        self.port()?.clear(ClearBuffer::Input)?;
        Ok(())
    }
}
