//! Named-command client for the game board
//!
//! Each operation sends one command line and, where the board may answer,
//! performs a single bounded read. Replies to plain commands are not
//! checked; only READ_COLOR and the unsolicited events carry meaning.

use super::message::{Command, DeviceEvent};
use crate::config::CommandWaits;
use crate::error::DeviceError;
use crate::game::player::{Color, PlayerId};
use crate::serial::{LineLink, Transport};
use log::{debug, warn};
use std::time::Duration;

/// Client for the board's command set
pub struct Device<T: Transport> {
    link: LineLink<T>,
    waits: CommandWaits,
}

impl<T: Transport> Device<T> {
    pub fn new(link: LineLink<T>, waits: CommandWaits) -> Self {
        Self { link, waits }
    }

    /// Borrow the transport backend, if still open
    #[cfg(test)]
    pub fn transport(&self) -> Option<&T> {
        self.link.backend()
    }

    /// Send one command line
    pub fn send(&mut self, command: Command) -> Result<usize, DeviceError> {
        self.link.send(command.encode().as_bytes())
    }

    /// Send a command and swallow whatever single line comes back.
    /// Write failures are logged and otherwise ignored.
    pub fn exchange(&mut self, command: Command) -> Option<String> {
        if let Err(e) = self.send(command) {
            warn!("{} not delivered: {}", command, e);
        }
        let reply = self.link.read_line(command.wait(&self.waits));
        if reply.is_none() {
            debug!("No reply to {}", command);
        }
        reply
    }

    /// Send a raw command line (used by the CLI's send subcommand)
    pub fn send_raw(&mut self, line: &str, wait: Duration) -> Result<Option<String>, DeviceError> {
        self.link.send(format!("{}\n", line).as_bytes())?;
        Ok(self.link.read_line(wait))
    }

    /// Wait for the boot banner. Returns whether READY was seen.
    pub fn await_ready(&mut self) -> bool {
        crate::config::pause_ms(self.waits.boot_settle_ms);
        let timeout = Duration::from_millis(self.waits.ready_ms);
        matches!(
            self.link.read_line(timeout).map(|line| DeviceEvent::parse(&line)),
            Some(DeviceEvent::Ready)
        )
    }

    /// Listen once for an unsolicited event
    pub fn poll_event(&mut self, timeout: Duration) -> Option<DeviceEvent> {
        self.link.read_line(timeout).map(|line| DeviceEvent::parse(&line))
    }

    /// Reset every output. `wait` differs between the idle reset and the
    /// reset before round one.
    pub fn clear_all(&mut self, wait: Duration) {
        if let Err(e) = self.send(Command::ClearAll) {
            warn!("CLEAR_ALL not delivered: {}", e);
        }
        self.link.read_line(wait);
    }

    pub fn play_start(&mut self) {
        self.exchange(Command::PlayStart);
    }

    pub fn effect(&mut self) {
        self.exchange(Command::Effect);
    }

    pub fn show_color(&mut self, color: Color) {
        self.exchange(Command::ShowColor(color));
    }

    /// Ask for one sensor sample. `None` when the board stayed quiet or
    /// answered with something other than a detection.
    pub fn read_color(&mut self) -> Option<i32> {
        self.exchange(Command::ReadColor)
            .and_then(|line| DeviceEvent::parse(&line).detected())
    }

    pub fn clear_game(&mut self) {
        self.exchange(Command::ClearGame);
    }

    pub fn score_led(&mut self, winner: PlayerId, round: u8) {
        self.exchange(Command::ScoreLed { winner, round });
    }

    pub fn play_champion(&mut self) {
        self.exchange(Command::PlayChampion);
    }

    pub fn celebrate(&mut self, winner: PlayerId) {
        self.exchange(Command::Celebrate(winner));
    }

    pub fn close(&mut self) {
        self.link.close();
    }
}
