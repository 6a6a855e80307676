// src/transport/mod.rs

//! Concrete [`LinkTransport`](crate::common::LinkTransport) implementations.

#[cfg(feature = "serial")]
pub mod serial;
pub mod simulated;

#[cfg(feature = "serial")]
pub use serial::{SerialLink, SerialLinkError};
pub use simulated::{SimulatedLink, SimulatedLinkError};
