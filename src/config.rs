//! Game configuration
//!
//! Everything the host waits for is configurable: serial link settings,
//! per-command acknowledgement waits, game pacing and the reaction
//! measurement loop. All durations are stored in milliseconds so the TOML
//! stays readable. Missing sections fall back to the stock timings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Baud rate the companion firmware listens at
pub const DEFAULT_BAUD: u32 = 9600;

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Baud rate (8N1, no flow control)
    pub baud_rate: u32,
    /// Sub-interval between reads while waiting for a line
    pub poll_interval_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD,
            poll_interval_ms: 100,
        }
    }
}

impl LinkSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// How long to wait for a (discarded) reply after each command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandWaits {
    pub clear_all_ms: u64,
    pub clear_all_before_round_ms: u64,
    pub play_start_ms: u64,
    pub effect_ms: u64,
    pub show_color_ms: u64,
    pub read_color_ms: u64,
    pub clear_game_ms: u64,
    pub score_led_ms: u64,
    pub play_champion_ms: u64,
    pub celebrate_ms: u64,
    /// Single read used for each start-button poll
    pub button_poll_ms: u64,
    /// Boot settle time after opening the port
    pub boot_settle_ms: u64,
    /// How long to listen for READY after the boot settle
    pub ready_ms: u64,
}

impl Default for CommandWaits {
    fn default() -> Self {
        Self {
            clear_all_ms: 500,
            clear_all_before_round_ms: 1000,
            play_start_ms: 2000,
            effect_ms: 2000,
            show_color_ms: 1000,
            read_color_ms: 1000,
            clear_game_ms: 1000,
            score_led_ms: 1000,
            play_champion_ms: 4000,
            celebrate_ms: 8000,
            button_poll_ms: 200,
            boot_settle_ms: 2000,
            ready_ms: 3000,
        }
    }
}

/// Fixed pauses that pace a game for the players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pauses {
    pub after_start_fanfare_ms: u64,
    pub before_turn_ms: u64,
    pub between_turns_ms: u64,
    pub between_rounds_ms: u64,
    pub before_restart_ms: u64,
}

impl Default for Pauses {
    fn default() -> Self {
        Self {
            after_start_fanfare_ms: 1000,
            before_turn_ms: 2000,
            between_turns_ms: 2000,
            between_rounds_ms: 2000,
            before_restart_ms: 3000,
        }
    }
}

/// Reaction measurement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureSettings {
    /// Lower bound of the random suspense delay before the reveal
    pub suspense_min_ms: u64,
    /// Upper bound of the random suspense delay before the reveal
    pub suspense_max_ms: u64,
    /// Pause between consecutive READ_COLOR polls
    pub poll_pause_ms: u64,
    /// Give up after this many READ_COLOR polls. Unbounded when absent.
    /// Only the measurement loop reads this; see `GameRules::max_start_polls`.
    pub max_polls: Option<u32>,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self {
            suspense_min_ms: 1000,
            suspense_max_ms: 2000,
            poll_pause_ms: 100,
            max_polls: None,
        }
    }
}

/// Rules of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub rounds: u8,
    pub player_names: [String; 2],
    /// Fixed seed for colour picks and suspense delays
    pub seed: Option<u64>,
    /// Give up waiting for the start button after this many polls.
    /// Waits forever when absent.
    pub max_start_polls: Option<u32>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            rounds: 3,
            player_names: ["PLAYER 1".to_string(), "PLAYER 2".to_string()],
            seed: None,
            max_start_polls: None,
        }
    }
}

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub link: LinkSettings,
    pub waits: CommandWaits,
    pub pauses: Pauses,
    pub measure: MeasureSettings,
    pub game: GameRules,
}

impl GameConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.rounds == 0 {
            bail!("game.rounds must be at least 1");
        }
        if self.link.poll_interval_ms == 0 {
            bail!("link.poll_interval_ms must be greater than 0");
        }
        if self.link.baud_rate == 0 {
            bail!("link.baud_rate must be greater than 0");
        }
        if self.measure.suspense_min_ms > self.measure.suspense_max_ms {
            bail!(
                "measure.suspense_min_ms ({}) exceeds measure.suspense_max_ms ({})",
                self.measure.suspense_min_ms,
                self.measure.suspense_max_ms
            );
        }
        if self.game.player_names.iter().any(|n| n.trim().is_empty()) {
            bail!("game.player_names must not be empty");
        }
        Ok(())
    }

    /// Configuration with every pause and wait collapsed, for driving the
    /// simulated device quickly.
    pub fn instant() -> Self {
        let mut config = Self::default();
        config.link.poll_interval_ms = 1;
        config.waits = CommandWaits {
            clear_all_ms: 5,
            clear_all_before_round_ms: 5,
            play_start_ms: 5,
            effect_ms: 5,
            show_color_ms: 5,
            read_color_ms: 5,
            clear_game_ms: 5,
            score_led_ms: 5,
            play_champion_ms: 5,
            celebrate_ms: 5,
            button_poll_ms: 5,
            boot_settle_ms: 0,
            ready_ms: 5,
        };
        config.pauses = Pauses {
            after_start_fanfare_ms: 0,
            before_turn_ms: 0,
            between_turns_ms: 0,
            between_rounds_ms: 0,
            before_restart_ms: 0,
        };
        config.measure.suspense_min_ms = 0;
        config.measure.suspense_max_ms = 0;
        config.measure.poll_pause_ms = 0;
        config
    }

    /// Swap in the instant waits, pauses and measurement pacing while
    /// keeping the link settings, poll limits and game rules.
    pub fn with_instant_pacing(mut self) -> Self {
        let fast = Self::instant();
        self.waits = fast.waits;
        self.pauses = fast.pauses;
        self.measure.suspense_min_ms = fast.measure.suspense_min_ms;
        self.measure.suspense_max_ms = fast.measure.suspense_max_ms;
        self.measure.poll_pause_ms = fast.measure.poll_pause_ms;
        self
    }
}

/// Sleep for a configured number of milliseconds, skipping zero
pub fn pause_ms(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
