//! Serial link to the companion game board
//!
//! This module provides:
//! - The `Transport` backend trait and the polling `LineLink` built on it
//! - A serialport-backed connection plus port discovery (`serial` feature)
//! - An in-memory simulated board for tests and `--simulate` runs

pub mod link;
#[cfg(feature = "serial")]
pub mod port;
pub mod sim;

pub use link::{LineLink, Transport};
#[cfg(feature = "serial")]
pub use port::{PortConfig, SerialConnection};
pub use sim::SimulatedDevice;
