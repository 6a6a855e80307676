// src/config.rs

use crate::common::{timing, LinkSettings};
use crate::recovery::strategy::{ParseResetStrategyError, ParseUsbIdError};
use crate::recovery::{RecoveryConfig, ResetStrategy, UsbId};
use core::time::Duration;
use log::debug;
use std::env;

pub const ENV_PORT: &str = "ENVSENSOR_PORT";
pub const ENV_BAUD: &str = "ENVSENSOR_BAUD";
pub const ENV_MOCK: &str = "ENVSENSOR_MOCK";
pub const ENV_POLL_INTERVAL_SECS: &str = "ENVSENSOR_POLL_INTERVAL_SECS";
pub const ENV_STALE_THRESHOLD: &str = "ENVSENSOR_STALE_THRESHOLD";
pub const ENV_RESET_SCOPE: &str = "ENVSENSOR_RESET_SCOPE";
pub const ENV_USB_ID: &str = "ENVSENSOR_USB_ID";

/// Shortest run of identical readings that may count as a freeze.
pub const MIN_STALE_THRESHOLD: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: expected a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key}: expected true/false, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("{key}: must not be zero")]
    Zero { key: &'static str },

    #[error("{key}: must be at least {min}, got {got}")]
    TooSmall {
        key: &'static str,
        min: u32,
        got: u32,
    },

    #[error("ENVSENSOR_RESET_SCOPE: {0}")]
    ResetScope(#[from] ParseResetStrategyError),

    #[error("ENVSENSOR_USB_ID: {0}")]
    UsbId(#[from] ParseUsbIdError),
}

/// Everything a running sensor session needs.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub link: LinkSettings,
    /// Run of identical readings treated as a frozen device.
    pub stale_threshold: u32,
    pub recovery: RecoveryConfig,
    pub poll_interval: Duration,
    /// Use the simulated link instead of the serial port.
    pub simulate: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            link: LinkSettings::default(),
            stale_threshold: timing::STALE_THRESHOLD,
            recovery: RecoveryConfig::default(),
            poll_interval: timing::POLL_INTERVAL,
            simulate: false,
        }
    }
}

impl SensorConfig {
    /// Defaults overridden by `ENVSENSOR_*` variables, after loading `.env`
    /// from the working directory if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_except(&[])
    }

    /// Like [`SensorConfig::from_env`], but the `skip` variables are never
    /// read, so a caller that supplies those settings itself is not tripped
    /// up by a bad value in the environment.
    pub fn from_env_except(skip: &[&str]) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| {
            if skip.iter().any(|s| *s == key) {
                return None;
            }
            env::var(key).ok()
        })
    }

    /// Same as [`SensorConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SensorConfig::default();

        if let Some(port) = lookup(ENV_PORT) {
            config.link.path = port.trim().into();
        }
        if let Some(value) = lookup(ENV_BAUD) {
            config.link.baud_rate = parse_nonzero(ENV_BAUD, &value)?;
        }
        if let Some(value) = lookup(ENV_MOCK) {
            config.simulate = parse_flag(ENV_MOCK, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_SECS) {
            let secs = parse_nonzero(ENV_POLL_INTERVAL_SECS, &value)?;
            config.poll_interval = Duration::from_secs(secs.into());
        }
        if let Some(value) = lookup(ENV_STALE_THRESHOLD) {
            let threshold = parse_nonzero(ENV_STALE_THRESHOLD, &value)?;
            if threshold < MIN_STALE_THRESHOLD {
                return Err(ConfigError::TooSmall {
                    key: ENV_STALE_THRESHOLD,
                    min: MIN_STALE_THRESHOLD,
                    got: threshold,
                });
            }
            config.stale_threshold = threshold;
        }
        if let Some(value) = lookup(ENV_RESET_SCOPE) {
            config.recovery.strategy = value.trim().parse::<ResetStrategy>()?;
        }
        if let Some(value) = lookup(ENV_USB_ID) {
            config.recovery.usb_id = value.trim().parse::<UsbId>()?;
        }

        debug!("loaded config: {config:?}");
        Ok(config)
    }
}

fn parse_nonzero(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::Zero { key }),
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(vars: &[(&str, &str)]) -> Result<SensorConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SensorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.link.path, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(config.link.baud_rate, 115_200);
        assert_eq!(config.stale_threshold, 10);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert!(!config.simulate);
        assert_eq!(config.recovery.strategy, ResetStrategy::bus_controller());
        assert_eq!(config.recovery.usb_id, UsbId::OMRON_2JCIE_BU01);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_PORT, "/dev/ttyUSB1"),
            (ENV_BAUD, "57600"),
            (ENV_MOCK, "true"),
            (ENV_POLL_INTERVAL_SECS, "5"),
            (ENV_STALE_THRESHOLD, "4"),
            (ENV_RESET_SCOPE, "device"),
            (ENV_USB_ID, "0403:6001"),
        ])
        .unwrap();
        assert_eq!(config.link.path, PathBuf::from("/dev/ttyUSB1"));
        assert_eq!(config.link.baud_rate, 57_600);
        assert!(config.simulate);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.stale_threshold, 4);
        assert_eq!(config.recovery.strategy, ResetStrategy::UsbDevice);
        assert_eq!(
            config.recovery.usb_id,
            UsbId {
                vendor: 0x0403,
                product: 0x6001,
            }
        );
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            load(&[(ENV_BAUD, "fast")]),
            Err(ConfigError::InvalidNumber { key: ENV_BAUD, .. })
        ));
        assert!(matches!(
            load(&[(ENV_STALE_THRESHOLD, "0")]),
            Err(ConfigError::Zero {
                key: ENV_STALE_THRESHOLD,
            })
        ));
        assert!(matches!(
            load(&[(ENV_MOCK, "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
        assert!(matches!(
            load(&[(ENV_RESET_SCOPE, "hub")]),
            Err(ConfigError::ResetScope(_))
        ));
        assert!(matches!(
            load(&[(ENV_USB_ID, "0590")]),
            Err(ConfigError::UsbId(_))
        ));
    }

    #[test]
    fn test_stale_threshold_below_two_rejected() {
        assert!(matches!(
            load(&[(ENV_STALE_THRESHOLD, "1")]),
            Err(ConfigError::TooSmall {
                key: ENV_STALE_THRESHOLD,
                min: 2,
                got: 1,
            })
        ));
        let config = load(&[(ENV_STALE_THRESHOLD, "2")]).unwrap();
        assert_eq!(config.stale_threshold, 2);
    }
}
