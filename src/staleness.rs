// src/staleness.rs

//! Frozen-sensor detection.
//!
//! A wedged 2JCIE-BU01 keeps answering with its last good frame, byte for
//! byte. A genuinely static room almost never holds all nine fields exactly
//! constant, so a long enough run of identical readings is treated as a
//! freeze.

use crate::common::{timing, Reading};

/// What the caller should do with the reading just observed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Keep the reading.
    Fresh,
    /// The device looks frozen; `run` identical readings were seen in a row.
    Stale(u32),
}

#[derive(Debug, Clone)]
pub struct StalenessDetector {
    threshold: u32,
    /// Identical readings seen after the one stored in `last`.
    repeats: u32,
    last: Option<Reading>,
}

impl StalenessDetector {
    /// `threshold` is the run length that counts as stale; values below 2
    /// are raised to 2 so a single reading can never be stale.
    pub fn new(threshold: u32) -> Self {
        StalenessDetector {
            threshold: threshold.max(2),
            repeats: 0,
            last: None,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Identical readings seen after the current baseline.
    pub fn repeat_count(&self) -> u32 {
        self.repeats
    }

    pub fn last_reading(&self) -> Option<&Reading> {
        self.last.as_ref()
    }

    /// Feeds one decoded reading through the detector.
    ///
    /// Emitting `Stale` also clears the detector, so the reading after a
    /// recovery attempt starts a new baseline whatever the attempt's outcome.
    pub fn observe(&mut self, reading: &Reading) -> Signal {
        if self.last.as_ref() == Some(reading) {
            self.repeats += 1;
            let run = self.repeats + 1;
            if run >= self.threshold {
                self.reset();
                return Signal::Stale(run);
            }
        } else {
            self.repeats = 0;
            self.last = Some(*reading);
        }
        Signal::Fresh
    }

    /// Returns to the initial state with no baseline.
    pub fn reset(&mut self) {
        self.repeats = 0;
        self.last = None;
    }
}

impl Default for StalenessDetector {
    fn default() -> Self {
        StalenessDetector::new(timing::STALE_THRESHOLD)
    }
}
