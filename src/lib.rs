// src/lib.rs

pub mod common;
pub mod config;
pub mod poller;
pub mod recovery;
pub mod session;
pub mod staleness;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use common::{Reading, SensorError};
pub use config::SensorConfig;
pub use poller::{LatestReading, Poller};
pub use session::SensorSession;
