// src/session/mod.rs

mod io_helpers;
mod transaction;

use crate::common::{Delay, HardwareControl, LinkSettings, LinkTransport, SensorError};
use crate::config::SensorConfig;
use crate::recovery::RecoveryController;
use crate::staleness::StalenessDetector;
use log::info;

/// Whether the session currently holds an open link.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkState {
    Closed,
    Open,
}

/// One sensor, one link, one read cycle at a time.
///
/// All methods take `&mut self`; sharing a session across threads means
/// wrapping the whole session, so cycles can never overlap on the link.
#[derive(Debug)]
pub struct SensorSession<L, D, H>
where
    L: LinkTransport,
    D: Delay,
    H: HardwareControl,
{
    link: L,
    delay: D,
    settings: LinkSettings,
    detector: StalenessDetector,
    recovery: RecoveryController<H>,
    state: LinkState,
}

impl<L, D, H> SensorSession<L, D, H>
where
    L: LinkTransport,
    D: Delay,
    H: HardwareControl,
{
    pub fn new(
        link: L,
        delay: D,
        settings: LinkSettings,
        detector: StalenessDetector,
        recovery: RecoveryController<H>,
    ) -> Self {
        SensorSession {
            link,
            delay,
            settings,
            detector,
            recovery,
            state: LinkState::Closed,
        }
    }

    /// Builds a closed session from configuration.
    pub fn from_config(link: L, delay: D, control: H, config: &SensorConfig) -> Self {
        SensorSession::new(
            link,
            delay,
            config.link.clone(),
            StalenessDetector::new(config.stale_threshold),
            RecoveryController::new(control, config.recovery.clone()),
        )
    }

    /// Opens the link. Opening an open session reopens it.
    pub fn open(&mut self) -> Result<(), SensorError<L::Error>> {
        self.link.open(&self.settings).map_err(|e| {
            self.state = LinkState::Closed;
            SensorError::Io(e)
        })?;
        self.state = LinkState::Open;
        info!("sensor link opened on {}", self.settings.path.display());
        Ok(())
    }

    /// Releases the link. Idempotent.
    pub fn close(&mut self) {
        if self.state == LinkState::Open || self.link.is_open() {
            self.link.close();
            info!("sensor link closed");
        }
        self.state = LinkState::Closed;
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    pub fn detector(&self) -> &StalenessDetector {
        &self.detector
    }

    pub fn recovery(&self) -> &RecoveryController<H> {
        &self.recovery
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Tracks whatever the link ended up as after recovery touched it.
    fn sync_state(&mut self) {
        self.state = if self.link.is_open() {
            LinkState::Open
        } else {
            LinkState::Closed
        };
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{encode_response, RawReading};
    use crate::recovery::RecoveryConfig;
    use crate::testing::{MockControl, RecordingDelay, ScriptedLink};

    pub(super) type TestSession = SensorSession<ScriptedLink, RecordingDelay, MockControl>;

    pub(super) fn session() -> TestSession {
        SensorSession::new(
            ScriptedLink::new(),
            RecordingDelay::default(),
            LinkSettings::new("/dev/ttyUSB0"),
            StalenessDetector::default(),
            RecoveryController::new(
                MockControl::with_controller("0000:01:00.0"),
                RecoveryConfig::default(),
            ),
        )
    }

    pub(super) fn frame(temperature: i16) -> Vec<u8> {
        let raw = RawReading {
            temperature,
            humidity: 4800,
            pressure: 1_012_000,
            ..RawReading::default()
        };
        encode_response(&raw, 0).to_vec()
    }

    #[test]
    fn test_session_starts_closed() {
        let s = session();
        assert_eq!(s.state(), LinkState::Closed);
        assert!(!s.link().is_open());
    }

    #[test]
    fn test_open_and_close() {
        let mut s = session();
        s.open().unwrap();
        assert_eq!(s.state(), LinkState::Open);
        assert_eq!(s.link().opens, 1);

        s.close();
        assert_eq!(s.state(), LinkState::Closed);
        assert_eq!(s.link().closes, 1);

        // Idempotent
        s.close();
        assert_eq!(s.link().closes, 1);
    }

    #[test]
    fn test_open_failure_leaves_session_closed() {
        let mut s = session();
        s.link_mut().fail_open = true;
        assert!(matches!(s.open(), Err(SensorError::Io(_))));
        assert_eq!(s.state(), LinkState::Closed);
    }

    #[test]
    fn test_from_config_uses_configured_settings() {
        let mut config = SensorConfig::default();
        config.link = LinkSettings::new("/dev/ttyUSB3");
        config.stale_threshold = 4;
        let s = SensorSession::from_config(
            ScriptedLink::new(),
            RecordingDelay::default(),
            MockControl::default(),
            &config,
        );
        assert_eq!(s.settings().path, std::path::PathBuf::from("/dev/ttyUSB3"));
        assert_eq!(s.detector().threshold(), 4);
        assert_eq!(s.recovery().attempts(), 0);
    }
}
