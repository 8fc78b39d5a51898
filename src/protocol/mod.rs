//! Command protocol spoken with the game board
//!
//! Newline-terminated ASCII, one command in flight at a time. Replies are
//! not correlated with commands; ordering comes only from the host's own
//! send-then-read sequencing.

pub mod client;
pub mod message;

pub use client::Device;
pub use message::DeviceEvent;
