// src/recovery/mod.rs

//! Hardware recovery for a frozen sensor.
//!
//! The 2JCIE-BU01 occasionally wedges and only a loss of USB power brings it
//! back. `RecoveryController` drives that power-cycle through a
//! [`HardwareControl`] implementation, waits for the serial device node to
//! return, reopens the link and discards the garbage the sensor sends right
//! after power-on.

pub mod strategy;
pub mod sysfs;

pub use strategy::{ResetStrategy, UsbId};
pub use sysfs::{NullControl, SysfsControl};

use crate::common::{
    build_command, timing, Delay, HardwareControl, LinkSettings, LinkTransport, RecoveryError,
    RecoveryOutcome,
};
use core::time::Duration;
use log::{debug, error, info, warn};
use std::io;

/// Waits used by the recovery sequence. Defaults are the empirical values in
/// [`timing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTiming {
    pub unbind_settle: Duration,
    pub reenumerate_settle: Duration,
    pub controller_bind_settle: Duration,
    pub reappear_poll_interval: Duration,
    pub reappear_poll_attempts: u32,
    pub warmup_reads: u32,
    pub warmup_interval: Duration,
    pub warmup_settle: Duration,
}

impl Default for RecoveryTiming {
    fn default() -> Self {
        RecoveryTiming {
            unbind_settle: timing::UNBIND_SETTLE,
            reenumerate_settle: timing::REENUMERATE_SETTLE,
            controller_bind_settle: timing::CONTROLLER_BIND_SETTLE,
            reappear_poll_interval: timing::REAPPEAR_POLL_INTERVAL,
            reappear_poll_attempts: timing::REAPPEAR_POLL_ATTEMPTS,
            warmup_reads: timing::WARMUP_READS,
            warmup_interval: timing::WARMUP_INTERVAL,
            warmup_settle: timing::WARMUP_SETTLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    pub strategy: ResetStrategy,
    /// Id of the sensor's USB serial bridge.
    pub usb_id: UsbId,
    /// Kernel driver serving the serial bridge.
    pub serial_driver: String,
    pub timing: RecoveryTiming,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            strategy: ResetStrategy::default(),
            usb_id: UsbId::default(),
            serial_driver: "ftdi_sio".to_string(),
            timing: RecoveryTiming::default(),
        }
    }
}

fn control_failed(step: &'static str) -> impl FnOnce(io::Error) -> RecoveryError {
    move |source| RecoveryError::Control { step, source }
}

#[derive(Debug)]
pub struct RecoveryController<H> {
    control: H,
    config: RecoveryConfig,
    attempts: u32,
}

impl<H: HardwareControl> RecoveryController<H> {
    pub fn new(control: H, config: RecoveryConfig) -> Self {
        RecoveryController {
            control,
            config,
            attempts: 0,
        }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn control(&self) -> &H {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut H {
        &mut self.control
    }

    /// Recovery attempts made so far, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Runs one full recovery attempt. Never panics and never retries; the
    /// caller decides whether another attempt is worth making later.
    pub fn recover<L, D>(
        &mut self,
        link: &mut L,
        delay: &mut D,
        settings: &LinkSettings,
    ) -> RecoveryOutcome
    where
        L: LinkTransport,
        D: Delay,
    {
        self.attempts += 1;
        warn!(
            "starting {} reset of sensor {} (attempt {})",
            self.config.strategy.name(),
            self.config.usb_id,
            self.attempts
        );

        match self.run(link, delay, settings) {
            Ok(()) => {
                info!("sensor recovered, warm-up reads discarded");
                RecoveryOutcome::Recovered
            }
            Err(e) => {
                error!("sensor recovery failed: {e}");
                RecoveryOutcome::Failed(e)
            }
        }
    }

    fn run<L, D>(
        &mut self,
        link: &mut L,
        delay: &mut D,
        settings: &LinkSettings,
    ) -> Result<(), RecoveryError>
    where
        L: LinkTransport,
        D: Delay,
    {
        let handle = self.locate()?;
        link.close();
        self.power_cycle(&handle, delay)?;
        self.wait_for_link(settings, delay)?;
        if let Err(e) = link.open(settings) {
            let reason = format!("{}: {e:?}", settings.path.display());
            return Err(RecoveryError::ReopenError(reason));
        }
        info!("reopened {}", settings.path.display());
        self.warm_up(link, delay)
    }

    fn locate(&mut self) -> Result<String, RecoveryError> {
        let found = match &self.config.strategy {
            ResetStrategy::BusController { controller_driver } => self
                .control
                .locate_controller(controller_driver)
                .map_err(control_failed("locate controller"))?
                .ok_or_else(|| RecoveryError::DeviceNotFound {
                    target: format!("{controller_driver} controller"),
                })?,
            ResetStrategy::UsbDevice => {
                let id = self.config.usb_id;
                self.control
                    .locate_usb_device(id.vendor, id.product)
                    .map_err(control_failed("locate USB device"))?
                    .ok_or_else(|| RecoveryError::DeviceNotFound {
                        target: format!("USB device {id}"),
                    })?
            }
        };
        debug!("located hardware handle {found}");
        Ok(found)
    }

    fn power_cycle<D: Delay>(
        &mut self,
        handle: &str,
        delay: &mut D,
    ) -> Result<(), RecoveryError> {
        let timing = self.config.timing.clone();
        match self.config.strategy.clone() {
            ResetStrategy::BusController { controller_driver } => {
                warn!("unbinding {controller_driver} controller {handle}, all USB devices drop");
                self.control
                    .unbind_controller(&controller_driver, handle)
                    .map_err(control_failed("unbind controller"))?;
                delay.delay(timing.unbind_settle);

                self.control
                    .rescan_bus()
                    .map_err(control_failed("rescan bus"))?;
                delay.delay(timing.reenumerate_settle);

                self.control
                    .bind_controller(&controller_driver, handle)
                    .map_err(control_failed("bind controller"))?;
                delay.delay(timing.controller_bind_settle);

                self.register_serial_driver();
            }
            ResetStrategy::UsbDevice => {
                warn!("unbinding USB device {handle}");
                self.control
                    .unbind_usb_device(handle)
                    .map_err(control_failed("unbind USB device"))?;
                delay.delay(timing.unbind_settle);

                self.control
                    .bind_usb_device(handle)
                    .map_err(control_failed("bind USB device"))?;
                delay.delay(timing.reenumerate_settle);
            }
        }
        Ok(())
    }

    /// Makes sure the serial bridge driver knows the sensor's id again after
    /// a controller reset. Failures are logged only; whether the link comes
    /// back is decided by the reappearance poll.
    fn register_serial_driver(&mut self) {
        let driver = self.config.serial_driver.clone();
        let id = self.config.usb_id;

        if let Err(e) = self.control.load_driver(&driver) {
            warn!("failed to load {driver}: {e}");
        }

        match self.control.register_usb_id(&driver, id.vendor, id.product) {
            Ok(()) => info!("registered {id} with {driver}"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{id} already registered with {driver}");
            }
            Err(e) => warn!("failed to register {id} with {driver}: {e}"),
        }
    }

    fn wait_for_link<D: Delay>(
        &mut self,
        settings: &LinkSettings,
        delay: &mut D,
    ) -> Result<(), RecoveryError> {
        let attempts = self.config.timing.reappear_poll_attempts;
        for poll in 1..=attempts {
            delay.delay(self.config.timing.reappear_poll_interval);
            if self.control.link_present(&settings.path) {
                info!("{} is back after {poll} polls", settings.path.display());
                return Ok(());
            }
        }
        Err(RecoveryError::DeviceNotReappeared {
            path: settings.path.display().to_string(),
            attempts,
        })
    }

    fn warm_up<L, D>(&mut self, link: &mut L, delay: &mut D) -> Result<(), RecoveryError>
    where
        L: LinkTransport,
        D: Delay,
    {
        let command = build_command();
        let mut scratch = [0u8; 2 * timing::DEFAULT_READ_CHUNK];

        for attempt in 1..=self.config.timing.warmup_reads {
            delay.delay(self.config.timing.warmup_interval);

            let discarded = (|| -> Result<usize, L::Error> {
                link.flush_input()?;
                link.write_all(&command)?;
                delay.delay(self.config.timing.warmup_settle);
                let want = link
                    .bytes_available()?
                    .clamp(timing::DEFAULT_READ_CHUNK, scratch.len());
                link.read(&mut scratch[..want])
            })()
            .map_err(|e| RecoveryError::WarmUp {
                attempt,
                reason: format!("{e:?}"),
            })?;

            debug!("warm-up read {attempt} discarded {discarded} bytes");
        }
        Ok(())
    }
}
