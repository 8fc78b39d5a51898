//! Reaction-time measurement
//!
//! Reveal a colour, then keep polling the sensor until the board reports
//! that colour. The board has no notion of a right answer, so the host
//! polls and judges every sample itself.

use super::player::Color;
use super::report::{GameEvent, Reporter};
use super::rng::SimpleRng;
use crate::config::{pause_ms, MeasureSettings};
use crate::error::DeviceError;
use crate::protocol::Device;
use crate::serial::Transport;
use log::debug;
use std::time::Instant;

/// Result of one measured turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub reaction_ms: u64,
    /// READ_COLOR polls sent, the matching one included
    pub polls: u32,
    /// Detections of any colour other than the target
    pub wrong_detections: u32,
}

/// Run one turn: effect, suspense, reveal, then poll until `target` shows up.
///
/// Without `max_polls` this only returns once the right card is presented.
pub fn measure_reaction_time<T: Transport, R: Reporter>(
    device: &mut Device<T>,
    target: Color,
    settings: &MeasureSettings,
    rng: &mut SimpleRng,
    reporter: &mut R,
) -> Result<Measurement, DeviceError> {
    reporter.report(GameEvent::GetReady);
    reporter.report(GameEvent::EffectStarted);
    device.effect();

    pause_ms(rng.next_between(settings.suspense_min_ms, settings.suspense_max_ms));

    reporter.report(GameEvent::ColorRevealed { color: target });
    device.show_color(target);

    let start = Instant::now();
    let mut polls = 0u32;
    let mut wrong_detections = 0u32;
    let mut warned = false;

    loop {
        if let Some(limit) = settings.max_polls {
            if polls >= limit {
                return Err(DeviceError::PollLimitExceeded {
                    waiting_for: "the target colour",
                    polls,
                });
            }
        }

        polls += 1;
        match device.read_color() {
            Some(value) if value == target.index() => {
                let reaction_ms = start.elapsed().as_millis() as u64;
                reporter.report(GameEvent::Correct { color: target, reaction_ms });
                return Ok(Measurement {
                    reaction_ms,
                    polls,
                    wrong_detections,
                });
            }
            Some(value) => {
                wrong_detections += 1;
                match Color::from_index(value) {
                    Some(detected) if !warned => {
                        warned = true;
                        reporter.report(GameEvent::WrongColor { detected });
                    }
                    Some(_) => {}
                    None => debug!("Sensor value {} out of range", value),
                }
            }
            None => {}
        }

        pause_ms(settings.poll_pause_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::report::RecordingReporter;
    use crate::serial::sim::Fallback;
    use crate::serial::{LineLink, SimulatedDevice};

    fn run(
        sim: SimulatedDevice,
        target: Color,
        max_polls: Option<u32>,
    ) -> (Result<Measurement, DeviceError>, Device<SimulatedDevice>, RecordingReporter) {
        let mut config = GameConfig::instant();
        config.measure.max_polls = max_polls;
        let mut device = Device::new(
            LineLink::new(sim.silent_boot().without_start_press(), config.link.poll_interval()),
            config.waits.clone(),
        );
        let mut reporter = RecordingReporter::default();
        let mut rng = SimpleRng::new(1);
        let result = measure_reaction_time(&mut device, target, &config.measure, &mut rng, &mut reporter);
        (result, device, reporter)
    }

    fn wrong_notices(reporter: &RecordingReporter) -> usize {
        reporter.count(|e| matches!(e, GameEvent::WrongColor { .. }))
    }

    #[test]
    fn test_always_detecting_target() {
        let sim = SimulatedDevice::new().with_fallback(Fallback::Fixed(0));
        let (result, device, reporter) = run(sim, Color::Red, None);

        let measurement = result.unwrap();
        assert_eq!(measurement.polls, 1);
        assert_eq!(measurement.wrong_detections, 0);
        assert_eq!(wrong_notices(&reporter), 0);
        assert!(reporter.events.contains(&GameEvent::Correct {
            color: Color::Red,
            reaction_ms: measurement.reaction_ms,
        }));

        let sim = device.transport().unwrap();
        assert_eq!(sim.commands(), ["EFFECT", "SHOW_COLOR:0", "READ_COLOR"]);
    }

    #[test]
    fn test_stops_at_first_match() {
        let sim = SimulatedDevice::new()
            .with_script(vec![Some(0), None, Some(1), Some(0), Some(2), Some(2)])
            .with_fallback(Fallback::Fixed(0));
        let (result, device, _) = run(sim, Color::Blue, None);

        let measurement = result.unwrap();
        assert_eq!(measurement.polls, 5);
        assert_eq!(measurement.wrong_detections, 3);
        assert_eq!(device.transport().unwrap().commands_named("READ_COLOR").len(), 5);
    }

    #[test]
    fn test_wrong_colour_notified_once() {
        let sim = SimulatedDevice::new().with_script(vec![Some(2), Some(1), Some(2), None, Some(0)]);
        let (result, _, reporter) = run(sim, Color::Red, None);

        assert!(result.is_ok());
        assert_eq!(wrong_notices(&reporter), 1);
        assert!(reporter.events.contains(&GameEvent::WrongColor { detected: Color::Blue }));
    }

    #[test]
    fn test_out_of_range_never_matches() {
        let sim = SimulatedDevice::new()
            .with_script(vec![Some(3), Some(-1), Some(7)])
            .with_fallback(Fallback::Fixed(1));
        let (result, _, reporter) = run(sim, Color::Green, None);

        let measurement = result.unwrap();
        assert_eq!(measurement.polls, 4);
        assert_eq!(measurement.wrong_detections, 3);
        // Out-of-range values are not named to the player
        assert_eq!(wrong_notices(&reporter), 0);
    }

    #[test]
    fn test_silence_keeps_polling_until_limit() {
        let sim = SimulatedDevice::new().with_fallback(Fallback::Silent);
        let (result, device, _) = run(sim, Color::Green, Some(4));

        assert!(matches!(
            result,
            Err(DeviceError::PollLimitExceeded { polls: 4, .. })
        ));
        assert_eq!(device.transport().unwrap().commands_named("READ_COLOR").len(), 4);
    }

    #[test]
    fn test_elapsed_covers_slow_player() {
        let sim = SimulatedDevice::new()
            .with_script(vec![None; 3])
            .with_fallback(Fallback::Target);
        let (result, _, _) = run(sim, Color::Blue, None);

        // Three silent polls at a 5 ms read wait each
        let measurement = result.unwrap();
        assert_eq!(measurement.polls, 4);
        assert!(measurement.reaction_ms >= 15, "too fast: {}", measurement.reaction_ms);
    }
}
