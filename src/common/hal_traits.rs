// src/common/hal_traits.rs

use super::frame::LinkSettings;
use core::fmt::Debug;
use core::time::Duration;
use std::io;
use std::path::Path;

/// Abstraction for the blocking waits the protocol and recovery need.
pub trait Delay {
    /// Block for at least `duration`.
    fn delay(&mut self, duration: Duration);
}

/// `Delay` backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Abstraction for the duplex byte link to the sensor.
///
/// Reads never block for long: `read` returns whatever is pending (possibly
/// nothing) so the caller stays in charge of protocol timing.
pub trait LinkTransport {
    /// Associated error type for link failures.
    type Error: Debug;

    /// Opens (or reopens) the link. An already-open link is closed first.
    fn open(&mut self, settings: &LinkSettings) -> Result<(), Self::Error>;

    /// Releases the link. Closing a closed link is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Writes all of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Reads up to `buf.len()` pending bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Discards everything in the receive buffer.
    fn flush_input(&mut self) -> Result<(), Self::Error>;
}

/// Abstraction for the OS-level directives used to power-cycle the sensor.
///
/// Handles are opaque strings understood by the implementation (a PCI
/// address for controllers, a USB bus position for devices).
pub trait HardwareControl {
    /// Finds the bus controller bound to `driver`.
    fn locate_controller(&mut self, driver: &str) -> io::Result<Option<String>>;

    /// Finds the USB device with the given vendor/product id.
    fn locate_usb_device(&mut self, vendor: u16, product: u16) -> io::Result<Option<String>>;

    fn unbind_controller(&mut self, driver: &str, handle: &str) -> io::Result<()>;

    fn bind_controller(&mut self, driver: &str, handle: &str) -> io::Result<()>;

    /// Asks the bus to re-enumerate everything behind it.
    fn rescan_bus(&mut self) -> io::Result<()>;

    fn unbind_usb_device(&mut self, handle: &str) -> io::Result<()>;

    fn bind_usb_device(&mut self, handle: &str) -> io::Result<()>;

    /// Loads the serial bridge kernel driver.
    fn load_driver(&mut self, driver: &str) -> io::Result<()>;

    /// Teaches the serial bridge driver a vendor/product id.
    ///
    /// Implementations report an id the driver already knows as
    /// `io::ErrorKind::AlreadyExists`.
    fn register_usb_id(&mut self, driver: &str, vendor: u16, product: u16) -> io::Result<()>;

    /// Whether the link device node currently exists.
    fn link_present(&mut self, path: &Path) -> bool;
}
