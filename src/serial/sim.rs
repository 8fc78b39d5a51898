//! In-memory stand-in for the game board firmware
//!
//! Behaves like the companion board on the other end of the wire: it
//! announces READY, presses the start button when the host idles, lights
//! the requested colour and answers READ_COLOR polls from a script. Every
//! command it receives is recorded for assertions.

use super::link::Transport;
use crate::game::rng::SimpleRng;
use std::collections::VecDeque;
use std::io;

/// What READ_COLOR answers once the detection script runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Report whatever colour was last shown
    Target,
    /// Always report this value
    #[cfg(test)]
    Fixed(i32),
    /// Never answer
    #[cfg(test)]
    Silent,
}

/// Simulated companion board
#[derive(Debug)]
pub struct SimulatedDevice {
    outbox: VecDeque<String>,
    inbox: Vec<u8>,
    commands: Vec<String>,
    script: VecDeque<Option<i32>>,
    turn_scripts: VecDeque<Vec<Option<i32>>>,
    fallback: Fallback,
    target: Option<i32>,
    armed: bool,
    press_start: bool,
    last_command: Option<String>,
    fail_writes: bool,
    misses: Option<SimpleRng>,
    closed: bool,
}

impl SimulatedDevice {
    /// Board that boots with READY, presses start when idle and detects
    /// the shown colour on the first poll.
    pub fn new() -> Self {
        Self {
            outbox: VecDeque::from(vec!["READY".to_string()]),
            inbox: Vec::new(),
            commands: Vec::new(),
            script: VecDeque::new(),
            turn_scripts: VecDeque::new(),
            fallback: Fallback::Target,
            target: None,
            armed: true,
            press_start: true,
            last_command: None,
            fail_writes: false,
            misses: None,
            closed: false,
        }
    }

    /// Players who fumble: before each correct card the board reports a
    /// random number of wrong colours and empty polls.
    pub fn with_fumbles(seed: u64) -> Self {
        let mut sim = Self::new();
        sim.misses = Some(SimpleRng::new(seed));
        sim
    }

    /// Queue answers for upcoming READ_COLOR polls (`None` = no reply)
    #[cfg(test)]
    pub fn with_script(mut self, detections: Vec<Option<i32>>) -> Self {
        self.script.extend(detections);
        self
    }

    /// Queue one script per upcoming SHOW_COLOR, loaded as each colour
    /// is revealed
    #[cfg(test)]
    pub fn with_turn_scripts(mut self, turns: Vec<Vec<Option<i32>>>) -> Self {
        self.turn_scripts.extend(turns);
        self
    }

    #[cfg(test)]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Never press the start button on its own
    #[cfg(test)]
    pub fn without_start_press(mut self) -> Self {
        self.press_start = false;
        self
    }

    /// Skip the READY boot banner
    #[cfg(test)]
    pub fn silent_boot(mut self) -> Self {
        self.outbox.retain(|line| line != "READY");
        self
    }

    #[cfg(test)]
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }

    /// Push an unsolicited line towards the host
    #[cfg(test)]
    pub fn push_line(&mut self, line: &str) {
        self.outbox.push_back(line.to_string());
    }

    /// Every command received so far, without line terminators
    #[cfg(test)]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Commands received that start with `prefix`
    #[cfg(test)]
    pub fn commands_named(&self, prefix: &str) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn handle_command(&mut self, command: &str) {
        self.commands.push(command.to_string());

        let (name, arg) = match command.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (command, None),
        };

        match name {
            "READ_COLOR" => {
                if let Some(value) = self.next_detection() {
                    self.outbox.push_back(format!("DETECTED:{}", value));
                }
            }
            "SHOW_COLOR" => {
                self.target = arg.and_then(|a| a.parse().ok());
                if let Some(turn) = self.turn_scripts.pop_front() {
                    self.script.extend(turn);
                }
                self.plan_fumbles();
                self.outbox.push_back("OK".to_string());
            }
            "CLEAR_ALL" => {
                if self.last_command.as_deref() != Some("PLAY_START") {
                    self.armed = true;
                }
                self.outbox.push_back("OK".to_string());
            }
            "PLAY_START" => {
                self.armed = false;
                self.outbox.push_back("OK".to_string());
            }
            _ => self.outbox.push_back("OK".to_string()),
        }

        self.last_command = Some(name.to_string());
    }

    fn plan_fumbles(&mut self) {
        let (Some(rng), Some(target)) = (self.misses.as_mut(), self.target) else {
            return;
        };
        for _ in 0..rng.next_range(4) {
            if rng.next_range(2) == 0 {
                self.script.push_back(None);
            } else {
                let wrong = (target + 1 + rng.next_range(2) as i32) % 3;
                self.script.push_back(Some(wrong));
            }
        }
    }

    fn next_detection(&mut self) -> Option<i32> {
        if let Some(step) = self.script.pop_front() {
            return step;
        }
        match self.fallback {
            Fallback::Target => self.target,
            #[cfg(test)]
            Fallback::Fixed(value) => Some(value),
            #[cfg(test)]
            Fallback::Silent => None,
        }
    }

    fn complete_lines(&mut self) {
        while let Some(pos) = self.inbox.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.inbox.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let command = line.trim_end_matches(['\r', '\n']).to_string();
            if !command.is_empty() {
                self.handle_command(&command);
            }
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedDevice {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "device closed"));
        }
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }
        self.inbox.extend_from_slice(data);
        self.complete_lines();
        Ok(data.len())
    }

    /// Hands out at most one line per read, like a slow peer would.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        if self.outbox.is_empty() && self.armed && self.press_start {
            self.armed = false;
            self.outbox.push_back("BUTTON_START".to_string());
        }
        let Some(line) = self.outbox.pop_front() else {
            return Ok(0);
        };

        let bytes = format!("{}\n", line).into_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        if n < bytes.len() {
            // Keep the remainder for the next read
            let rest = String::from_utf8_lossy(&bytes[n..bytes.len() - 1]).into_owned();
            self.outbox.push_front(rest);
        }
        Ok(n)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
