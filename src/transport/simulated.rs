// src/transport/simulated.rs

use crate::common::{
    encode_response, verify_frame_crc, LinkSettings, LinkTransport, RawReading, COMMAND_LEN,
    FRAME_HEADER,
};
use core::f64::consts::TAU;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimulatedLinkError {
    #[error("simulated link is not open")]
    NotOpen,
}

/// Baseline, swing and wave frequency (Hz) of one simulated channel.
#[derive(Debug, Clone, Copy)]
struct Channel {
    base: f64,
    swing: f64,
    freq: f64,
}

impl Channel {
    const fn new(base: f64, swing: f64, freq: f64) -> Self {
        Channel { base, swing, freq }
    }
}

const TEMPERATURE: Channel = Channel::new(22.0, 3.0, 0.001);
const HUMIDITY: Channel = Channel::new(50.0, 15.0, 0.0007);
const ILLUMINANCE: Channel = Channel::new(300.0, 200.0, 0.0005);
const PRESSURE: Channel = Channel::new(1013.25, 5.0, 0.0003);
const NOISE: Channel = Channel::new(40.0, 10.0, 0.002);
const ETVOC: Channel = Channel::new(50.0, 80.0, 0.0008);
const ECO2: Channel = Channel::new(600.0, 300.0, 0.0006);
const DISCOMFORT: Channel = Channel::new(70.0, 5.0, 0.001);
const HEAT_STROKE: Channel = Channel::new(22.0, 3.0, 0.0009);

/// eCO2 never reads below outdoor air.
const ECO2_FLOOR: f64 = 400.0;

/// Link that answers read commands with plausible, slowly drifting data.
///
/// Each channel follows two superimposed sine waves of wall-clock time plus
/// a little random jitter. Only well-formed, correctly checksummed command
/// frames get an answer; anything else is dropped like a real device would.
#[derive(Debug)]
pub struct SimulatedLink {
    open: bool,
    rng: StdRng,
    sequence: u8,
    pending: VecDeque<u8>,
}

impl SimulatedLink {
    pub fn new() -> Self {
        SimulatedLink::with_rng(StdRng::from_entropy())
    }

    /// Deterministic jitter, for tests.
    pub fn seeded(seed: u64) -> Self {
        SimulatedLink::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        SimulatedLink {
            open: false,
            rng,
            sequence: 0,
            pending: VecDeque::new(),
        }
    }

    /// The raw fields the device would report at `t` seconds since the epoch.
    pub fn sample_at(&mut self, t: f64) -> RawReading {
        let temperature = self.channel(TEMPERATURE, t);
        let humidity = self.channel(HUMIDITY, t);
        let illuminance = self.channel(ILLUMINANCE, t).max(0.0);
        let pressure = self.channel(PRESSURE, t);
        let noise = self.channel(NOISE, t);
        let etvoc = self.channel(ETVOC, t).max(0.0);
        let eco2 = self.channel(ECO2, t).max(ECO2_FLOOR);
        let discomfort = self.channel(DISCOMFORT, t);
        let heat_stroke = self.channel(HEAT_STROKE, t);

        // `as` saturates, so even absurd values stay in range
        RawReading {
            temperature: (temperature * 100.0).round() as i16,
            humidity: (humidity * 100.0).round() as u16,
            illuminance: illuminance as u16,
            pressure: (pressure * 1000.0).round() as u32,
            noise: (noise * 100.0).round() as u16,
            etvoc: etvoc as u16,
            eco2: eco2 as u16,
            discomfort: (discomfort * 100.0).round() as u16,
            heat_stroke: (heat_stroke * 100.0).round() as i16,
        }
    }

    fn channel(&mut self, channel: Channel, t: f64) -> f64 {
        let phase = t * channel.freq * TAU;
        let wave = 0.5 * phase.sin() + 0.3 * (2.1 * phase + 1.3).sin();
        let jitter = self.rng.gen_range(-0.03..=0.03);
        channel.base + channel.swing * (wave + jitter)
    }

    fn is_read_command(bytes: &[u8]) -> bool {
        bytes.len() == COMMAND_LEN
            && bytes.starts_with(&FRAME_HEADER)
            && verify_frame_crc(bytes).is_ok()
    }
}

impl Default for SimulatedLink {
    fn default() -> Self {
        SimulatedLink::new()
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

impl LinkTransport for SimulatedLink {
    type Error = SimulatedLinkError;

    fn open(&mut self, settings: &LinkSettings) -> Result<(), Self::Error> {
        self.open = true;
        self.pending.clear();
        let path = settings.path.display();
        info!("simulated sensor standing in for {path}");
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.pending.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if !self.open {
            return Err(SimulatedLinkError::NotOpen);
        }
        if !Self::is_read_command(bytes) {
            debug!(
                "simulated sensor ignoring {} unrecognised bytes",
                bytes.len()
            );
            return Ok(());
        }
        let raw = self.sample_at(now_secs());
        self.pending.extend(encode_response(&raw, self.sequence));
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        if !self.open {
            return Err(SimulatedLinkError::NotOpen);
        }
        Ok(self.pending.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.open {
            return Err(SimulatedLinkError::NotOpen);
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn flush_input(&mut self) -> Result<(), Self::Error> {
        if !self.open {
            return Err(SimulatedLinkError::NotOpen);
        }
        self.pending.clear();
        Ok(())
    }
}
