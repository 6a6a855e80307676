// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod crc;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod reading;
pub mod response;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From command.rs
pub use command::{build_command, build_read_command, CommandFrame, COMMAND_LEN, FRAME_HEADER};

// From crc.rs
pub use crc::{calculate_crc16, decode_crc, encode_crc, verify_frame_crc};

// From error.rs
pub use error::{FrameError, RecoveryError, RecoveryOutcome, SensorError};

// From frame.rs
pub use frame::LinkSettings;

// From hal_traits.rs
pub use hal_traits::{Delay, HardwareControl, LinkTransport, StdDelay};

// From reading.rs
pub use reading::{RawReading, Reading};

// From response.rs
pub use response::{
    decode_response, encode_response, parse_raw_response, LATEST_DATA_LONG_LEN, MIN_RESPONSE_LEN,
};

// From timing.rs (constants - users can access via common::timing::*)
