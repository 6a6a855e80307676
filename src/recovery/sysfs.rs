// src/recovery/sysfs.rs

use crate::common::HardwareControl;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Linux implementation of [`HardwareControl`] over sysfs and `modprobe`.
///
/// Needs root. `root` is `/sys` on a real system; tests point it at a
/// scratch directory.
#[derive(Debug, Clone)]
pub struct SysfsControl {
    root: PathBuf,
    modprobe: PathBuf,
}

impl SysfsControl {
    pub fn new() -> Self {
        SysfsControl::with_root("/sys")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        SysfsControl {
            root: root.into(),
            modprobe: PathBuf::from("modprobe"),
        }
    }

    /// Replaces the `modprobe` executable run by `load_driver`.
    pub fn with_modprobe(mut self, modprobe: impl Into<PathBuf>) -> Self {
        self.modprobe = modprobe.into();
        self
    }

    fn pci_driver(&self, driver: &str) -> PathBuf {
        self.root.join("bus/pci/drivers").join(driver)
    }

    fn write_attr(&self, path: PathBuf, value: &str) -> io::Result<()> {
        debug!("echo {value} > {}", path.display());
        fs::write(&path, value)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))
    }
}

impl Default for SysfsControl {
    fn default() -> Self {
        SysfsControl::new()
    }
}

/// `dddd:bb:dd.f`
fn is_pci_address(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() == 12
        && b[4] == b':'
        && b[7] == b':'
        && b[10] == b'.'
        && b.iter()
            .enumerate()
            .filter(|(i, _)| ![4, 7, 10].contains(i))
            .all(|(_, c)| c.is_ascii_hexdigit())
}

fn read_hex_attr(path: &Path) -> Option<u16> {
    let text = fs::read_to_string(path).ok()?;
    u16::from_str_radix(text.trim(), 16).ok()
}

impl HardwareControl for SysfsControl {
    fn locate_controller(&mut self, driver: &str) -> io::Result<Option<String>> {
        let dir = self.pci_driver(driver);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut found: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_pci_address(name))
            .collect();
        found.sort();
        Ok(found.into_iter().next())
    }

    fn locate_usb_device(&mut self, vendor: u16, product: u16) -> io::Result<Option<String>> {
        let dir = self.root.join("bus/usb/devices");
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut found: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                // Interfaces ("1-1.3:1.0") carry no ids of their own
                if name.contains(':') {
                    return None;
                }
                let path = entry.path();
                let matches = read_hex_attr(&path.join("idVendor")) == Some(vendor)
                    && read_hex_attr(&path.join("idProduct")) == Some(product);
                matches.then_some(name)
            })
            .collect();
        found.sort();
        Ok(found.into_iter().next())
    }

    fn unbind_controller(&mut self, driver: &str, handle: &str) -> io::Result<()> {
        self.write_attr(self.pci_driver(driver).join("unbind"), handle)
    }

    fn bind_controller(&mut self, driver: &str, handle: &str) -> io::Result<()> {
        self.write_attr(self.pci_driver(driver).join("bind"), handle)
    }

    fn rescan_bus(&mut self) -> io::Result<()> {
        self.write_attr(self.root.join("bus/pci/rescan"), "1")
    }

    fn unbind_usb_device(&mut self, handle: &str) -> io::Result<()> {
        self.write_attr(self.root.join("bus/usb/drivers/usb/unbind"), handle)
    }

    fn bind_usb_device(&mut self, handle: &str) -> io::Result<()> {
        self.write_attr(self.root.join("bus/usb/drivers/usb/bind"), handle)
    }

    fn load_driver(&mut self, driver: &str) -> io::Result<()> {
        let output = Command::new(&self.modprobe).arg(driver).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "modprobe {driver}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn register_usb_id(&mut self, driver: &str, vendor: u16, product: u16) -> io::Result<()> {
        let path = self
            .root
            .join("bus/usb-serial/drivers")
            .join(driver)
            .join("new_id");
        // The kernel answers EEXIST for an id it already knows, which std
        // maps to ErrorKind::AlreadyExists.
        self.write_attr(path, &format!("{vendor:04x} {product:04x}"))
    }

    fn link_present(&mut self, path: &Path) -> bool {
        path.exists()
    }
}

/// Control for setups without hardware (simulated link): nothing can be
/// located, so recovery always ends in `DeviceNotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullControl;

impl HardwareControl for NullControl {
    fn locate_controller(&mut self, _driver: &str) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn locate_usb_device(&mut self, _vendor: u16, _product: u16) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn unbind_controller(&mut self, _driver: &str, _handle: &str) -> io::Result<()> {
        Ok(())
    }

    fn bind_controller(&mut self, _driver: &str, _handle: &str) -> io::Result<()> {
        Ok(())
    }

    fn rescan_bus(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn unbind_usb_device(&mut self, _handle: &str) -> io::Result<()> {
        Ok(())
    }

    fn bind_usb_device(&mut self, _handle: &str) -> io::Result<()> {
        Ok(())
    }

    fn load_driver(&mut self, _driver: &str) -> io::Result<()> {
        Ok(())
    }

    fn register_usb_id(&mut self, _driver: &str, _vendor: u16, _product: u16) -> io::Result<()> {
        Ok(())
    }

    fn link_present(&mut self, _path: &Path) -> bool {
        false
    }
}
