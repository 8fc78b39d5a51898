//! Game progress reporting
//!
//! The state machine emits `GameEvent`s; how they reach the players is up
//! to the `Reporter`. The console reporter prints styled status lines.

use super::player::{Color, GameOutcome, PlayerId};
use chrono::Local;
use colored::Colorize;

/// Notable moments in a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    DeviceReady { ready: bool },
    AwaitingStart,
    StartPressed,
    RoundStarted { round: u8 },
    TurnStarted { player: PlayerId, name: String },
    GetReady,
    EffectStarted,
    ColorRevealed { color: Color },
    /// Sent at most once per measurement
    WrongColor { detected: Color },
    Correct { color: Color, reaction_ms: u64 },
    TurnFinished { name: String, reaction_ms: u64 },
    RoundWon { round: u8, winner: PlayerId, name: String },
    GameOver { scores: [(String, u32); 2], outcome: GameOutcome },
    CelebrationDone,
    Restarting,
}

/// Sink for game events
pub trait Reporter {
    fn report(&mut self, event: GameEvent);
}

/// Prints events to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    show_timestamps: bool,
}

impl ConsoleReporter {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }

    fn line(&self, text: String) {
        if self.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            println!("{} {}", timestamp.to_string().dimmed(), text);
        } else {
            println!("{}", text);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: GameEvent) {
        match event {
            GameEvent::DeviceReady { ready: true } => {
                self.line(format!("{} Board is ready", "[OK]".green().bold()));
            }
            GameEvent::DeviceReady { ready: false } => {
                self.line(format!(
                    "{} READY not received (continuing anyway)",
                    "[WARNING]".yellow().bold()
                ));
            }
            GameEvent::AwaitingStart => {
                println!("\n{}", "#".repeat(43).cyan());
                println!("{}", "#   PRESS THE START BUTTON ON THE BOARD   #".cyan().bold());
                println!("{}", "#".repeat(43).cyan());
            }
            GameEvent::StartPressed => {
                self.line(format!("{} Start button pressed", ">>".green().bold()));
            }
            GameEvent::RoundStarted { round } => {
                println!("\n{}", "=".repeat(29).dimmed());
                println!("{}", format!("           ROUND {}", round).white().bold());
                println!("{}", "=".repeat(29).dimmed());
            }
            GameEvent::TurnStarted { name, .. } => {
                self.line(format!("{} {}'s turn!", ">>".cyan().bold(), name.white().bold()));
            }
            GameEvent::GetReady => self.line("Get ready...".yellow().to_string()),
            GameEvent::EffectStarted => self.line("[LED EFFECT]".dimmed().to_string()),
            GameEvent::ColorRevealed { color } => {
                self.line(format!("{} {}", ">>> LED ON:".bold(), paint(color)));
                self.line("Show the correct colour card to the sensor...".to_string());
            }
            GameEvent::WrongColor { detected } => {
                self.line(format!(
                    "{} Wrong colour ({}). Try again...",
                    "[X]".red().bold(),
                    paint(detected)
                ));
            }
            GameEvent::Correct { color, .. } => {
                self.line(format!("{} Correct! Detected: {}", "[OK]".green().bold(), paint(color)));
            }
            GameEvent::TurnFinished { name, reaction_ms } => {
                self.line(format!("{} reaction time: {} ms", name, reaction_ms.to_string().white().bold()));
            }
            GameEvent::RoundWon { round, name, .. } => {
                self.line(format!(
                    "{} Round {}: {} WINS!",
                    "***".yellow().bold(),
                    round,
                    name.white().bold()
                ));
            }
            GameEvent::GameOver { scores, outcome } => {
                println!("\n{}", "=".repeat(33).dimmed());
                println!("{}", "            GAME OVER".white().bold());
                println!("{}", "=".repeat(33).dimmed());
                println!("FINAL SCORES:");
                for (name, score) in &scores {
                    println!("  {}: {}", name, score);
                }
                match outcome {
                    GameOutcome::Champion(id) => {
                        let name = &scores[usize::from(id.number() - 1)].0;
                        println!(
                            "\n{}",
                            format!("*** {} IS THE CHAMPION! ***", name).green().bold()
                        );
                    }
                    GameOutcome::Draw => println!("\n{}", "*** DRAW! ***".yellow().bold()),
                }
            }
            GameEvent::CelebrationDone => self.line("[CELEBRATION COMPLETE]".dimmed().to_string()),
            GameEvent::Restarting => self.line("Restarting...".cyan().to_string()),
        }
    }
}

fn paint(color: Color) -> String {
    match color {
        Color::Red => color.name().red().bold().to_string(),
        Color::Green => color.name().green().bold().to_string(),
        Color::Blue => color.name().blue().bold().to_string(),
    }
}

/// Keeps every event, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<GameEvent>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|&e| pred(e)).count()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn report(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
