// src/session/transaction.rs

use super::SensorSession;
use crate::common::{decode_response, Delay, HardwareControl, LinkTransport, Reading, SensorError};
use crate::staleness::Signal;
use log::{debug, warn};

impl<L, D, H> SensorSession<L, D, H>
where
    L: LinkTransport,
    D: Delay,
    H: HardwareControl,
{
    /// Runs one complete read cycle and returns the decoded reading.
    ///
    /// When the reading completes a run of identical readings long enough to
    /// count as a frozen device, hardware recovery runs before this returns
    /// and the cycle fails with [`SensorError::Stale`] whatever the recovery
    /// outcome. The session state afterwards follows the link: open if
    /// recovery reopened it (or never closed it), closed otherwise.
    pub fn read_once(&mut self) -> Result<Reading, SensorError<L::Error>> {
        if !self.is_open() {
            return Err(SensorError::LinkClosed);
        }

        // 1. Request/response
        let response = self.exchange()?;

        // 2. Decode
        let reading = decode_response(&response).map_err(|e| {
            warn!("discarding {}-byte response: {e}", response.len());
            SensorError::MalformedResponse(e)
        })?;

        // 3. Staleness
        match self.detector.observe(&reading) {
            Signal::Fresh => {
                debug!("read {reading:?}");
                Ok(reading)
            }
            Signal::Stale(count) => {
                warn!("sensor returned {count} identical readings, treating it as frozen");
                let recovery = self
                    .recovery
                    .recover(&mut self.link, &mut self.delay, &self.settings);
                self.sync_state();
                Err(SensorError::Stale { count, recovery })
            }
        }
    }
}
