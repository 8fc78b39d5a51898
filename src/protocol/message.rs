//! Wire vocabulary: outbound commands and inbound device events

use crate::config::CommandWaits;
use crate::game::player::{Color, PlayerId};
use std::fmt;
use std::time::Duration;

/// Command lines the host sends to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ClearAll,
    PlayStart,
    Effect,
    ShowColor(Color),
    ReadColor,
    ClearGame,
    ScoreLed { winner: PlayerId, round: u8 },
    PlayChampion,
    Celebrate(PlayerId),
}

impl Command {
    /// Line as sent on the wire, newline included
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }

    /// How long to wait for the (discarded) reply to this command
    pub fn wait(&self, waits: &CommandWaits) -> Duration {
        let ms = match self {
            Command::ClearAll => waits.clear_all_ms,
            Command::PlayStart => waits.play_start_ms,
            Command::Effect => waits.effect_ms,
            Command::ShowColor(_) => waits.show_color_ms,
            Command::ReadColor => waits.read_color_ms,
            Command::ClearGame => waits.clear_game_ms,
            Command::ScoreLed { .. } => waits.score_led_ms,
            Command::PlayChampion => waits.play_champion_ms,
            Command::Celebrate(_) => waits.celebrate_ms,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ClearAll => f.write_str("CLEAR_ALL"),
            Command::PlayStart => f.write_str("PLAY_START"),
            Command::Effect => f.write_str("EFFECT"),
            Command::ShowColor(color) => write!(f, "SHOW_COLOR:{}", color.index()),
            Command::ReadColor => f.write_str("READ_COLOR"),
            Command::ClearGame => f.write_str("CLEAR_GAME"),
            Command::ScoreLed { winner, round } => write!(f, "SCORE_LED:{}:{}", winner, round),
            Command::PlayChampion => f.write_str("PLAY_CHAMPION"),
            Command::Celebrate(winner) => write!(f, "CELEBRATE:{}", winner),
        }
    }
}

/// Something the board reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Boot complete
    Ready,
    /// Physical start button pressed
    ButtonStart,
    /// Colour sensor sample. May be outside 0..=2.
    Detected(i32),
    /// Anything else; ignored by the game
    Other(String),
}

const DETECTED_TAG: &str = "DETECTED:";

impl DeviceEvent {
    /// Classify a line by scanning for the known tokens
    pub fn parse(line: &str) -> DeviceEvent {
        if let Some(pos) = line.find(DETECTED_TAG) {
            if let Some(value) = leading_int(&line[pos + DETECTED_TAG.len()..]) {
                return DeviceEvent::Detected(value);
            }
        }
        if line.contains("BUTTON_START") {
            return DeviceEvent::ButtonStart;
        }
        if line.contains("READY") {
            return DeviceEvent::Ready;
        }
        DeviceEvent::Other(line.to_string())
    }

    /// Detected colour value, if this is a sensor sample
    pub fn detected(&self) -> Option<i32> {
        match self {
            DeviceEvent::Detected(value) => Some(*value),
            _ => None,
        }
    }
}

/// Parse an optionally signed integer at the start of `s`, ignoring
/// leading spaces and whatever follows the digits.
fn leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}
