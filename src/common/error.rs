// src/common/error.rs

use core::fmt::Debug;
use std::io;

/// Structural problems with a frame received from (or built for) the device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Buffer is shorter than the layout requires.
    #[error("frame too short: needed {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },

    /// First two bytes are not the protocol header.
    #[error("bad frame header: {found:02x?}")]
    BadHeader { found: [u8; 2] },

    /// Trailing CRC does not match the frame contents.
    #[error("CRC mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    CrcMismatch { expected: u16, calculated: u16 },
}

/// Why a hardware recovery attempt did not bring the sensor back.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    /// No controller or USB device handle could be located.
    #[error("no hardware handle found for {target}")]
    DeviceNotFound { target: String },

    /// The link device node never came back after the reset.
    #[error("{path} did not reappear after {attempts} polls")]
    DeviceNotReappeared { path: String, attempts: u32 },

    /// The link reappeared but could not be reopened.
    #[error("failed to reopen link: {0}")]
    ReopenError(String),

    /// A warm-up round-trip failed on the reopened link.
    #[error("warm-up read {attempt} failed: {reason}")]
    WarmUp { attempt: u32, reason: String },

    /// An OS-level control directive failed.
    #[error("{step} failed: {source}")]
    Control {
        step: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Outcome of one hardware recovery attempt.
#[derive(Debug)]
pub enum RecoveryOutcome {
    Recovered,
    Failed(RecoveryError),
}

impl RecoveryOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryOutcome::Recovered)
    }
}

impl core::fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecoveryOutcome::Recovered => write!(f, "recovered"),
            RecoveryOutcome::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Failure of one read cycle. Every variant is local to the cycle; the caller
/// simply polls again.
#[derive(Debug, thiserror::Error)]
pub enum SensorError<E = ()>
where
    E: Debug,
{
    /// Underlying I/O error from the link transport.
    #[error("link I/O error: {0:?}")]
    Io(E),

    /// The session has no open link.
    #[error("link is not open")]
    LinkClosed,

    /// Too few bytes arrived, even after the single retry read.
    #[error("short response: got {got} bytes, need at least {needed}")]
    ShortResponse { needed: usize, got: usize },

    /// Response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] FrameError),

    /// The device repeated itself long enough to be considered frozen.
    /// Recovery has already been attempted; `recovery` says how it went.
    #[error("sensor stale after {count} identical readings, recovery {recovery}")]
    Stale {
        count: u32,
        recovery: RecoveryOutcome,
    },
}

impl<E: Debug> SensorError<E> {
    /// True for the frozen-device failure, whatever the recovery outcome.
    pub fn is_stale(&self) -> bool {
        matches!(self, SensorError::Stale { .. })
    }
}
