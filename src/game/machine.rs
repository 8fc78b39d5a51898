//! Game state machine
//!
//! One board, two players, strictly sequential:
//! `AwaitingStart -> RoundInProgress(1..=rounds) -> GameOver -> AwaitingStart`.

use super::measure::measure_reaction_time;
use super::player::{decide_round_winner, Color, Game, GameOutcome, PlayerId};
use super::report::{GameEvent, Reporter};
use super::rng::SimpleRng;
use crate::config::{pause_ms, GameConfig};
use crate::error::DeviceError;
use crate::protocol::{Device, DeviceEvent};
use crate::serial::Transport;
use log::{debug, info, warn};
use std::time::Duration;

/// Where the controller currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingStart,
    RoundInProgress(u8),
    GameOver,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::AwaitingStart => write!(f, "waiting for start"),
            Phase::RoundInProgress(round) => write!(f, "round {}", round),
            Phase::GameOver => write!(f, "game over"),
        }
    }
}

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub round: u8,
    pub targets: [Color; 2],
    pub reaction_ms: [u64; 2],
    pub winner: PlayerId,
}

/// What happened in one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub rounds: Vec<RoundResult>,
    pub scores: (u32, u32),
    pub outcome: GameOutcome,
}

/// Drives the board through complete games
pub struct GameController<T: Transport, R: Reporter> {
    device: Device<T>,
    config: GameConfig,
    rng: SimpleRng,
    reporter: R,
    game: Game,
    phase: Phase,
}

impl<T: Transport, R: Reporter> GameController<T, R> {
    pub fn new(device: Device<T>, config: GameConfig, reporter: R) -> Self {
        let rng = SimpleRng::from_seed(config.game.seed);
        let game = Game::new(&config.game.player_names);
        Self {
            device,
            config,
            rng,
            reporter,
            game,
            phase: Phase::AwaitingStart,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[cfg(test)]
    pub fn device(&self) -> &Device<T> {
        &self.device
    }

    #[cfg(test)]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Listen for the board's boot banner and report it
    pub fn handshake(&mut self) -> bool {
        let ready = self.device.await_ready();
        if !ready {
            warn!("READY not received from board");
        }
        self.reporter.report(GameEvent::DeviceReady { ready });
        ready
    }

    /// Play games back to back. Runs forever when `max_games` is `None`.
    pub fn run(&mut self, max_games: Option<u32>) -> Result<u32, DeviceError> {
        let mut played = 0;
        while max_games.map_or(true, |max| played < max) {
            let summary = self.play_game()?;
            played += 1;

            for result in &summary.rounds {
                debug!(
                    "Round {}: {} vs {}, {} ms vs {} ms, won by player {}",
                    result.round,
                    result.targets[0],
                    result.targets[1],
                    result.reaction_ms[0],
                    result.reaction_ms[1],
                    result.winner
                );
            }
            info!(
                "Game {} finished {}-{} ({:?})",
                played, summary.scores.0, summary.scores.1, summary.outcome
            );
        }
        Ok(played)
    }

    /// One full game, from waiting on the start button to the restart pause
    pub fn play_game(&mut self) -> Result<GameSummary, DeviceError> {
        self.game = Game::new(&self.config.game.player_names);
        self.phase = Phase::AwaitingStart;
        self.reporter.report(GameEvent::AwaitingStart);

        self.device
            .clear_all(Duration::from_millis(self.config.waits.clear_all_ms));
        self.wait_for_start()?;
        self.reporter.report(GameEvent::StartPressed);

        self.device.play_start();
        pause_ms(self.config.pauses.after_start_fanfare_ms);
        self.device
            .clear_all(Duration::from_millis(self.config.waits.clear_all_before_round_ms));

        let mut rounds = Vec::with_capacity(usize::from(self.config.game.rounds));
        for round in 1..=self.config.game.rounds {
            rounds.push(self.play_round(round)?);
            pause_ms(self.config.pauses.between_rounds_ms);
        }

        let outcome = self.finish_game();
        let summary = GameSummary {
            rounds,
            scores: self.game.scores(),
            outcome,
        };

        self.reporter.report(GameEvent::Restarting);
        pause_ms(self.config.pauses.before_restart_ms);
        self.phase = Phase::AwaitingStart;

        Ok(summary)
    }

    /// Poll the board until the start button is pressed
    fn wait_for_start(&mut self) -> Result<(), DeviceError> {
        let timeout = Duration::from_millis(self.config.waits.button_poll_ms);
        let mut polls = 0u32;

        loop {
            if let Some(limit) = self.config.game.max_start_polls {
                if polls >= limit {
                    return Err(DeviceError::PollLimitExceeded {
                        waiting_for: "BUTTON_START",
                        polls,
                    });
                }
            }
            polls += 1;

            match self.device.poll_event(timeout) {
                Some(DeviceEvent::ButtonStart) => {
                    info!("Start button pressed after {} polls", polls);
                    return Ok(());
                }
                Some(DeviceEvent::Other(line)) => {
                    debug!("Ignoring {:?} while waiting for start", line)
                }
                Some(event) => debug!("Ignoring {:?} while waiting for start", event),
                None => {}
            }
        }
    }

    fn play_round(&mut self, round: u8) -> Result<RoundResult, DeviceError> {
        self.phase = Phase::RoundInProgress(round);
        self.game.current_round = round;
        self.reporter.report(GameEvent::RoundStarted { round });

        let targets = [self.rng.next_color(), self.rng.next_color()];

        let first = self.play_turn(PlayerId::One, targets[0])?;
        pause_ms(self.config.pauses.between_turns_ms);
        let second = self.play_turn(PlayerId::Two, targets[1])?;

        let winner = decide_round_winner(first, second);
        self.game.award_round(winner);
        let [one, two] = &self.game.players;
        info!(
            "Round {} of {}: {} ms vs {} ms",
            self.game.current_round, self.config.game.rounds, one.reaction_ms, two.reaction_ms
        );
        self.reporter.report(GameEvent::RoundWon {
            round,
            winner,
            name: self.game.player(winner).name.clone(),
        });
        self.device.score_led(winner, round);

        Ok(RoundResult {
            round,
            targets,
            reaction_ms: [first, second],
            winner,
        })
    }

    fn play_turn(&mut self, player: PlayerId, target: Color) -> Result<u64, DeviceError> {
        let name = self.game.player(player).name.clone();
        self.reporter.report(GameEvent::TurnStarted {
            player,
            name: name.clone(),
        });
        pause_ms(self.config.pauses.before_turn_ms);

        let measurement = measure_reaction_time(
            &mut self.device,
            target,
            &self.config.measure,
            &mut self.rng,
            &mut self.reporter,
        )?;

        debug!(
            "{} needed {} polls ({} wrong detections)",
            name, measurement.polls, measurement.wrong_detections
        );
        self.game.player_mut(player).reaction_ms = measurement.reaction_ms;
        self.reporter.report(GameEvent::TurnFinished {
            name,
            reaction_ms: measurement.reaction_ms,
        });
        self.device.clear_game();

        Ok(measurement.reaction_ms)
    }

    fn finish_game(&mut self) -> GameOutcome {
        self.phase = Phase::GameOver;
        let outcome = self.game.outcome();

        let [one, two] = &self.game.players;
        self.reporter.report(GameEvent::GameOver {
            scores: [(one.name.clone(), one.score), (two.name.clone(), two.score)],
            outcome,
        });

        if let GameOutcome::Champion(winner) = outcome {
            self.device.play_champion();
            self.device.celebrate(winner);
            self.reporter.report(GameEvent::CelebrationDone);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::report::RecordingReporter;
    use crate::serial::sim::Fallback;
    use crate::serial::{LineLink, SimulatedDevice};

    fn controller(
        sim: SimulatedDevice,
        config: GameConfig,
    ) -> GameController<SimulatedDevice, RecordingReporter> {
        let device = Device::new(
            LineLink::new(sim, config.link.poll_interval()),
            config.waits.clone(),
        );
        GameController::new(device, config, RecordingReporter::default())
    }

    fn seeded(seed: u64) -> GameConfig {
        let mut config = GameConfig::instant();
        config.game.seed = Some(seed);
        config.measure.max_polls = Some(50);
        config.game.max_start_polls = Some(50);
        config
    }

    #[test]
    fn test_three_rounds_total_three_points() {
        let mut ctl = controller(SimulatedDevice::with_fumbles(11), seeded(5));
        assert!(ctl.handshake());

        let summary = ctl.play_game().unwrap();
        assert_eq!(summary.rounds.len(), 3);
        assert_eq!(summary.scores.0 + summary.scores.1, 3);
        assert_ne!(summary.outcome, GameOutcome::Draw);
        assert_eq!(ctl.game().current_round, 3);
        assert_eq!(ctl.phase(), Phase::AwaitingStart);

        for result in &summary.rounds {
            let [t1, t2] = result.reaction_ms;
            assert_eq!(result.winner, decide_round_winner(t1, t2));
        }
    }

    #[test]
    fn test_command_sequence_for_one_game() {
        let mut ctl = controller(SimulatedDevice::new(), seeded(9));
        let summary = ctl.play_game().unwrap();

        let sim = ctl.device().transport().unwrap();
        let commands = sim.commands();
        assert_eq!(&commands[..3], ["CLEAR_ALL", "PLAY_START", "CLEAR_ALL"]);
        assert_eq!(sim.commands_named("EFFECT").len(), 6);
        assert_eq!(sim.commands_named("CLEAR_GAME").len(), 6);
        assert_eq!(
            sim.commands_named("SCORE_LED"),
            summary
                .rounds
                .iter()
                .map(|r| format!("SCORE_LED:{}:{}", r.winner, r.round))
                .collect::<Vec<_>>()
        );

        let GameOutcome::Champion(winner) = summary.outcome else {
            panic!("three rounds cannot draw");
        };
        let tail = &commands[commands.len() - 2..];
        assert_eq!(tail[0], "PLAY_CHAMPION");
        assert_eq!(tail[1], format!("CELEBRATE:{}", winner));
    }

    #[test]
    fn test_targets_are_shown_in_order() {
        let mut ctl = controller(SimulatedDevice::new(), seeded(21));
        let summary = ctl.play_game().unwrap();

        let shown: Vec<String> = summary
            .rounds
            .iter()
            .flat_map(|r| r.targets)
            .map(|c| format!("SHOW_COLOR:{}", c.index()))
            .collect();
        assert_eq!(ctl.device().transport().unwrap().commands_named("SHOW_COLOR"), shown);
    }

    #[test]
    fn test_even_rounds_can_draw_without_celebration() {
        // Two silent polls make a turn slow; an empty script answers at once.
        let slow = vec![None, None];
        let sim = SimulatedDevice::new().with_turn_scripts(vec![
            vec![],
            slow.clone(),
            slow,
            vec![],
        ]);
        let mut config = seeded(3);
        config.game.rounds = 2;
        config.waits.read_color_ms = 20;
        let mut ctl = controller(sim, config);

        let summary = ctl.play_game().unwrap();
        assert_eq!(summary.rounds[0].winner, PlayerId::One);
        assert_eq!(summary.rounds[1].winner, PlayerId::Two);
        assert_eq!(summary.scores, (1, 1));
        assert_eq!(summary.outcome, GameOutcome::Draw);

        let sim = ctl.device().transport().unwrap();
        assert!(sim.commands_named("PLAY_CHAMPION").is_empty());
        assert!(sim.commands_named("CELEBRATE").is_empty());
        assert_eq!(ctl.reporter().count(|e| matches!(e, GameEvent::CelebrationDone)), 0);
    }

    #[test]
    fn test_champion_two_to_one() {
        let mut ctl = controller(SimulatedDevice::new().silent_boot(), seeded(1));
        ctl.game.award_round(PlayerId::One);
        ctl.game.award_round(PlayerId::Two);
        ctl.game.award_round(PlayerId::One);

        assert_eq!(ctl.finish_game(), GameOutcome::Champion(PlayerId::One));
        assert_eq!(ctl.phase(), Phase::GameOver);
        assert_eq!(
            ctl.device().transport().unwrap().commands(),
            ["PLAY_CHAMPION", "CELEBRATE:1"]
        );
    }

    #[test]
    fn test_run_multiple_games_resets_scores() {
        let mut ctl = controller(SimulatedDevice::with_fumbles(2), seeded(8));
        assert_eq!(ctl.run(Some(2)).unwrap(), 2);

        let sim = ctl.device().transport().unwrap();
        assert_eq!(sim.commands_named("PLAY_START").len(), 2);
        assert_eq!(sim.commands_named("SCORE_LED").len(), 6);
        let (one, two) = ctl.game().scores();
        assert_eq!(one + two, 3);
        assert_eq!(
            ctl.reporter().count(|e| matches!(e, GameEvent::StartPressed)),
            2
        );
    }

    #[test]
    fn test_start_wait_gives_up_at_limit() {
        let sim = SimulatedDevice::new().silent_boot().without_start_press();
        let mut config = seeded(1);
        config.game.max_start_polls = Some(3);
        let mut ctl = controller(sim, config);

        let err = ctl.play_game().unwrap_err();
        assert!(matches!(
            err,
            DeviceError::PollLimitExceeded { waiting_for: "BUTTON_START", polls: 3 }
        ));
        assert_eq!(ctl.phase(), Phase::AwaitingStart);
    }

    #[test]
    fn test_measure_poll_limit_leaves_start_wait_alone() {
        let mut sim = SimulatedDevice::new().silent_boot().without_start_press();
        sim.push_line("noise");
        sim.push_line("BUTTON_START");
        let mut config = seeded(1);
        config.measure.max_polls = Some(1);
        config.game.max_start_polls = None;
        let mut ctl = controller(sim, config);

        assert!(ctl.wait_for_start().is_ok());
    }

    #[test]
    fn test_board_matching_every_target_never_warns() {
        let sim = SimulatedDevice::new().with_fallback(Fallback::Target);
        let mut ctl = controller(sim, seeded(13));
        assert!(ctl.handshake());

        let summary = ctl.play_game().unwrap();
        assert_eq!(summary.rounds.len(), 3);
        assert_eq!(ctl.reporter().count(|e| matches!(e, GameEvent::WrongColor { .. })), 0);
        assert_eq!(ctl.reporter().count(|e| matches!(e, GameEvent::Correct { .. })), 6);
        assert_eq!(ctl.device().transport().unwrap().commands_named("READ_COLOR").len(), 6);
    }

    // The reply to CLEAR_ALL queues behind the buffered lines, so every
    // later reply is read one command late. The game must still finish.
    #[test]
    fn test_start_ignores_other_lines() {
        let mut sim = SimulatedDevice::new().without_start_press();
        sim.push_line("noise");
        sim.push_line("DETECTED:1");
        sim.push_line("BUTTON_START");
        let mut ctl = controller(sim.with_fallback(Fallback::Target), seeded(6));

        let summary = ctl.play_game().unwrap();
        assert_eq!(summary.rounds.len(), 3);
    }
}
