// src/common/frame.rs

use std::path::PathBuf;

/// Baud rate the 2JCIE-BU01 serial bridge is fixed at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default device node the FTDI bridge enumerates as.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Everything needed to (re)open the link the same way every time.
///
/// Character framing is always 8N1 without flow control; only the device
/// node and the baud rate vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub path: PathBuf,
    pub baud_rate: u32,
}

impl LinkSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LinkSettings {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        LinkSettings::new(DEFAULT_PORT)
    }
}
