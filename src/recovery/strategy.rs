// src/recovery/strategy.rs

use core::fmt;
use core::str::FromStr;

/// USB vendor/product id pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UsbId {
    pub vendor: u16,
    pub product: u16,
}

impl UsbId {
    /// Omron 2JCIE-BU01.
    pub const OMRON_2JCIE_BU01: UsbId = UsbId::new(0x0590, 0x00d4);

    pub const fn new(vendor: u16, product: u16) -> Self {
        UsbId { vendor, product }
    }
}

impl Default for UsbId {
    fn default() -> Self {
        UsbId::OMRON_2JCIE_BU01
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.product)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid USB id '{0}', expected vvvv:pppp in hex")]
pub struct ParseUsbIdError(String);

impl FromStr for UsbId {
    type Err = ParseUsbIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseUsbIdError(s.to_string());
        let (vendor, product) = s.trim().split_once(':').ok_or_else(err)?;
        let vendor = u16::from_str_radix(vendor, 16).map_err(|_| err())?;
        let product = u16::from_str_radix(product, 16).map_err(|_| err())?;
        Ok(UsbId { vendor, product })
    }
}

/// How far up the bus the power-cycle reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetStrategy {
    /// Unbind the whole host controller, rescan the PCI bus and rebind it.
    /// Needed where the hub cannot switch port power (Raspberry Pi 4); resets
    /// every USB device on the controller.
    BusController {
        /// Host controller driver, e.g. `xhci_hcd`.
        controller_driver: String,
    },
    /// Unbind and rebind only the sensor's own USB device.
    UsbDevice,
}

impl ResetStrategy {
    pub fn bus_controller() -> Self {
        ResetStrategy::BusController {
            controller_driver: "xhci_hcd".to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResetStrategy::BusController { .. } => "controller",
            ResetStrategy::UsbDevice => "device",
        }
    }
}

impl Default for ResetStrategy {
    fn default() -> Self {
        ResetStrategy::bus_controller()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reset scope '{0}', expected 'controller' or 'device'")]
pub struct ParseResetStrategyError(String);

impl FromStr for ResetStrategy {
    type Err = ParseResetStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "controller" | "bus" | "pci" => Ok(ResetStrategy::bus_controller()),
            "device" | "usb" => Ok(ResetStrategy::UsbDevice),
            _ => Err(ParseResetStrategyError(s.to_string())),
        }
    }
}
