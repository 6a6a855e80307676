// src/session/io_helpers.rs

use super::SensorSession;
use crate::common::{
    build_command, timing, Delay, HardwareControl, LinkTransport, SensorError, MIN_RESPONSE_LEN,
};
use arrayvec::ArrayVec;
use log::debug;

/// Largest response kept per cycle; a "Latest Data Long" frame is 58 bytes.
pub(crate) const RESPONSE_CAPACITY: usize = 128;

/// Raw bytes collected during one cycle.
pub(crate) type ResponseBuffer = ArrayVec<u8, RESPONSE_CAPACITY>;

// Implementation block for I/O related helpers
impl<L, D, H> SensorSession<L, D, H>
where
    L: LinkTransport,
    D: Delay,
    H: HardwareControl,
{
    /// One request/response exchange: flush, send, wait, read, and read once
    /// more if the first read came up short.
    pub(super) fn exchange(&mut self) -> Result<ResponseBuffer, SensorError<L::Error>> {
        self.link.flush_input().map_err(SensorError::Io)?;
        self.link
            .write_all(&build_command())
            .map_err(SensorError::Io)?;
        self.delay.delay(timing::RESPONSE_WAIT);

        let mut response = ResponseBuffer::new();
        self.read_pending(&mut response)?;

        if response.len() < MIN_RESPONSE_LEN {
            debug!("short first read ({} bytes), retrying once", response.len());
            self.delay.delay(timing::SHORT_READ_RETRY_WAIT);
            self.read_pending(&mut response)?;
        }

        if response.len() < MIN_RESPONSE_LEN {
            return Err(SensorError::ShortResponse {
                needed: MIN_RESPONSE_LEN,
                got: response.len(),
            });
        }
        Ok(response)
    }

    /// Appends whatever the link has pending to `response`, returning the
    /// number of bytes added.
    pub(super) fn read_pending(
        &mut self,
        response: &mut ResponseBuffer,
    ) -> Result<usize, SensorError<L::Error>> {
        let available = self.link.bytes_available().map_err(SensorError::Io)?;
        let want = match available {
            0 => timing::DEFAULT_READ_CHUNK,
            n => n,
        }
        .min(response.remaining_capacity());
        if want == 0 {
            return Ok(0);
        }

        let mut chunk = [0u8; RESPONSE_CAPACITY];
        let n = self.link.read(&mut chunk[..want]).map_err(SensorError::Io)?;
        let n = n.min(want);
        // `want` never exceeds the remaining capacity
        let _ = response.try_extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}
