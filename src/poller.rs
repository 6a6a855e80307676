// src/poller.rs

//! Background polling.
//!
//! A single worker thread owns the [`SensorSession`] so read cycles can never
//! overlap. Successful readings are published into a [`LatestReading`] slot
//! that any number of consumers can read without waiting on the cycle.

use crate::common::{Delay, HardwareControl, LinkTransport, Reading};
use crate::session::SensorSession;
use core::time::Duration;
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

/// One published reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub reading: Reading,
    pub taken_at: SystemTime,
    /// Starts at 1 and increases by one per published reading.
    pub sequence: u64,
}

/// Shared "latest value" slot. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct LatestReading {
    slot: Arc<Mutex<Option<Sample>>>,
}

impl LatestReading {
    pub fn new() -> Self {
        LatestReading::default()
    }

    /// Most recent sample, if any reading has been published yet.
    pub fn get(&self) -> Option<Sample> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `reading` as the latest sample and returns its sequence number.
    pub fn publish(&self, reading: Reading) -> u64 {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = slot.as_ref().map_or(1, |s| s.sequence + 1);
        *slot = Some(Sample {
            reading,
            taken_at: SystemTime::now(),
            sequence,
        });
        sequence
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// A reading was published with this sequence number.
    Published(u64),
    /// The link could not be opened; the next tick tries again.
    OpenFailed,
    /// The device looked frozen and a reset was attempted.
    Stale,
    /// The read cycle failed; nothing was published.
    Failed,
}

/// Runs one poll tick: opens the session if needed, then reads once.
pub fn poll_once<L, D, H>(session: &mut SensorSession<L, D, H>, latest: &LatestReading) -> Tick
where
    L: LinkTransport,
    D: Delay,
    H: HardwareControl,
{
    if !session.is_open() {
        if let Err(e) = session.open() {
            warn!("cannot open {}: {e}", session.settings().path.display());
            return Tick::OpenFailed;
        }
    }

    match session.read_once() {
        Ok(reading) => Tick::Published(latest.publish(reading)),
        Err(e) if e.is_stale() => {
            error!("{e}");
            Tick::Stale
        }
        Err(e) => {
            warn!("read failed: {e}");
            Tick::Failed
        }
    }
}

/// Handle to the polling thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct Poller {
    latest: LatestReading,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Poller {
    /// Moves `session` onto a new thread that polls immediately and then
    /// every `interval`. The session is closed when the thread stops.
    pub fn spawn<L, D, H>(
        mut session: SensorSession<L, D, H>,
        interval: Duration,
    ) -> std::io::Result<Self>
    where
        L: LinkTransport + Send + 'static,
        D: Delay + Send + 'static,
        H: HardwareControl + Send + 'static,
    {
        let latest = LatestReading::new();
        let slot = latest.clone();
        let (stop, stopped) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("envsensor-poller".to_string())
            .spawn(move || {
                info!("polling every {interval:?}");
                loop {
                    if let Tick::Published(sequence) = poll_once(&mut session, &slot) {
                        debug!("published reading {sequence}");
                    }
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                session.close();
                info!("poller stopped");
            })?;

        Ok(Poller {
            latest,
            stop: Some(stop),
            worker: Some(worker),
        })
    }

    /// Shared slot the worker publishes into.
    pub fn latest(&self) -> LatestReading {
        self.latest.clone()
    }

    /// Signals the worker and waits for it to finish its current cycle.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("poller thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
