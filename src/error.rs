//! Error taxonomy for talking to the companion device
//!
//! A missing response is not an error: `read_line` returns `None` and the
//! calling loop polls again. Only the conditions below are surfaced.

use std::io;
use thiserror::Error;

/// Errors raised by the transport and the game loops built on it
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The serial device could not be opened or configured. Fatal.
    #[error("serial port {port} unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// A write did not reach the device. Callers treat this as best effort.
    #[error("write to device failed: {0}")]
    WriteFailed(#[from] io::Error),

    /// A polling loop hit its configured ceiling.
    #[error("gave up waiting for {waiting_for} after {polls} polls")]
    PollLimitExceeded {
        waiting_for: &'static str,
        polls: u32,
    },
}

impl DeviceError {
    /// Whether this error should end the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeviceError::PortUnavailable { .. })
    }
}
