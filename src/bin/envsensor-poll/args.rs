use std::{path::PathBuf, time::Duration};

use clap::Parser;
use envsensor::config::{SensorConfig, ENV_MOCK, ENV_POLL_INTERVAL_SECS, ENV_PORT, ENV_RESET_SCOPE};
use envsensor::recovery::ResetStrategy;

/// Polls an Omron 2JCIE-BU01 and logs every reading.
///
/// Settings not given on the command line come from `ENVSENSOR_*`
/// variables (or a `.env` file), then from built-in defaults.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Serial device of the sensor.
    #[arg(long)]
    pub port: Option<PathBuf>,

    /// Use the simulated sensor instead of the serial port.
    #[arg(long)]
    pub mock: bool,

    /// Seconds between reads.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: Option<u64>,

    /// Power-cycle scope used when the sensor freezes: controller or device.
    #[arg(long)]
    pub reset_scope: Option<ResetStrategy>,

    /// Root of the sysfs tree used for recovery.
    #[arg(long, env = "ENVSENSOR_SYSFS_ROOT", default_value = "/sys")]
    pub sysfs_root: PathBuf,

    /// Exit after this many readings instead of running forever.
    #[arg(long)]
    pub samples: Option<u64>,
}

impl Args {
    /// `ENVSENSOR_*` variables made irrelevant by the flags given.
    pub fn overridden_vars(&self) -> Vec<&'static str> {
        let mut vars = Vec::new();
        if self.port.is_some() {
            vars.push(ENV_PORT);
        }
        if self.mock {
            vars.push(ENV_MOCK);
        }
        if self.interval_secs.is_some() {
            vars.push(ENV_POLL_INTERVAL_SECS);
        }
        if self.reset_scope.is_some() {
            vars.push(ENV_RESET_SCOPE);
        }
        vars
    }

    /// Writes the flags given over `config`.
    pub fn apply(&self, config: &mut SensorConfig) {
        if let Some(port) = &self.port {
            config.link.path = port.clone();
        }
        if self.mock {
            config.simulate = true;
        }
        if let Some(secs) = self.interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(scope) = &self.reset_scope {
            config.recovery.strategy = scope.clone();
        }
    }
}
