// src/common/timing.rs

use core::time::Duration;

// Nominal values measured against real 2JCIE-BU01 units on a Raspberry Pi 4.
// The recovery waits are the shortest that reliably let the xHCI controller
// and the FTDI bridge settle; they are defaults for `RecoveryTiming`.

// === Request/Response (normal cycle) ===

/// Wait after writing the command before reading the response.
pub const RESPONSE_WAIT: Duration = Duration::from_millis(100);
/// Extra wait before the single retry read when the first read came up short.
pub const SHORT_READ_RETRY_WAIT: Duration = Duration::from_millis(50);
/// Read size used when the link reports nothing pending.
pub const DEFAULT_READ_CHUNK: usize = 64;

// === Staleness ===

/// Consecutive identical readings treated as a frozen device.
pub const STALE_THRESHOLD: u32 = 10;

// === Hardware Recovery ===

/// Settle after unbinding the controller or device.
pub const UNBIND_SETTLE: Duration = Duration::from_secs(3);
/// Settle after rescanning the bus (controller scope) or rebinding the device.
pub const REENUMERATE_SETTLE: Duration = Duration::from_secs(3);
/// Settle after rebinding the host controller.
pub const CONTROLLER_BIND_SETTLE: Duration = Duration::from_secs(5);
/// Interval between checks for the link device node.
pub const REAPPEAR_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Number of checks for the link device node before giving up.
pub const REAPPEAR_POLL_ATTEMPTS: u32 = 10;

// === Warm-up ===

/// Round-trips discarded after reopening; the sensor emits garbage at power-on.
pub const WARMUP_READS: u32 = 3;
/// Pause before each warm-up round-trip.
pub const WARMUP_INTERVAL: Duration = Duration::from_secs(1);
/// Wait between the warm-up command and its discarded read.
pub const WARMUP_SETTLE: Duration = Duration::from_millis(150);

// === Polling ===

/// Default interval between read cycles in the background poller.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
