//! Keyboard steering for the interactive car.

use std::io::{self, BufRead, Write};

use racetrack_core::{CarSnapshot, CarView, Position};
use racetrack_rendering::explain_rejection;
use racetrack_system_steering::SteeringPolicy;
use racetrack_world::Track;
use thiserror::Error;
use tracing::{debug, warn};

const VERTICAL_PROMPT: &str = "Enter vertical move (negative = up, positive = down): ";
const HORIZONTAL_PROMPT: &str = "Enter horizontal move (negative = left, positive = right): ";

/// Failures while talking to the player.
#[derive(Debug, Error)]
pub(crate) enum InputError {
    /// The input stream reached its end.
    #[error("input closed")]
    Closed,
    /// Reading the answer or writing the prompt failed.
    #[error("terminal i/o failed")]
    Io(#[from] io::Error),
}

/// Steering policy that asks a player for every move.
///
/// Answers breaking the car's limits are explained and cost the car its
/// turn. Once the input is exhausted the car stops proposing moves.
pub(crate) struct InteractivePolicy<R, W> {
    input: R,
    output: W,
    closed: bool,
}

impl<R: BufRead, W: Write> InteractivePolicy<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            closed: false,
        }
    }

    fn request_destination(&mut self, car: &CarSnapshot) -> Result<Position, InputError> {
        writeln!(
            self.output,
            "User Car {} is currently at {}",
            car.id, car.position
        )?;
        let row_delta = self.ask_delta(VERTICAL_PROMPT)?;
        let column_delta = self.ask_delta(HORIZONTAL_PROMPT)?;

        if let Err(reason) = car.limits.check(row_delta, column_delta) {
            writeln!(self.output, "{}", explain_rejection(car.id, &reason))?;
            return Ok(car.position);
        }

        Ok(car.position.offset(row_delta, column_delta))
    }

    fn ask_delta(&mut self, prompt: &str) -> Result<i32, InputError> {
        let mut line = String::new();
        loop {
            write!(self.output, "{prompt}")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(InputError::Closed);
            }

            match line.trim().parse::<i32>() {
                Ok(delta) => return Ok(delta),
                Err(err) => {
                    debug!(input = line.trim(), %err, "unparsable move");
                    writeln!(self.output, "Please enter a whole number.")?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> SteeringPolicy for InteractivePolicy<R, W> {
    fn propose_destination(
        &mut self,
        car: &CarSnapshot,
        _track: &Track,
        _cars: &CarView,
    ) -> Option<Position> {
        if self.closed {
            return None;
        }

        match self.request_destination(car) {
            Ok(destination) => Some(destination),
            Err(err) => {
                warn!(car = %car.id, %err, "no more moves from the keyboard");
                self.closed = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use racetrack_core::{CarId, SpeedLimits, TurnOrder};

    use super::*;

    fn user_car() -> CarSnapshot {
        CarSnapshot {
            id: CarId::new('3'),
            position: Position::new(3, 1),
            turn_order: TurnOrder::new(3),
            limits: SpeedLimits::default(),
            weight: 7,
            has_won: false,
        }
    }

    fn propose(answers: &str) -> (Option<Position>, String) {
        let mut output = Vec::new();
        let destination = {
            let mut policy = InteractivePolicy::new(answers.as_bytes(), &mut output);
            policy.propose_destination(&user_car(), &Track::default_layout(), &CarView::default())
        };
        (destination, String::from_utf8(output).expect("utf-8"))
    }

    #[test]
    fn deltas_are_applied_to_the_current_position() {
        let (destination, output) = propose("-2\n3\n");

        assert_eq!(destination, Some(Position::new(1, 4)));
        assert!(output.starts_with("User Car 3 is currently at (3,1)\n"));
        assert!(output.contains(VERTICAL_PROMPT));
        assert!(output.contains(HORIZONTAL_PROMPT));
    }

    #[test]
    fn garbage_is_asked_again() {
        let (destination, output) = propose("up\n\n1\n  2  \n");

        assert_eq!(destination, Some(Position::new(4, 3)));
        assert_eq!(output.matches("Please enter a whole number.").count(), 2);
        assert_eq!(output.matches(VERTICAL_PROMPT).count(), 3);
    }

    #[test]
    fn over_limit_answers_skip_the_turn() {
        let (destination, output) = propose("3\n3\n");

        assert_eq!(destination, Some(Position::new(3, 1)));
        assert!(output.contains("INVALID MOVE!"));
        assert!(output.contains("Your attempted move: (3, 3)"));
    }

    #[test]
    fn closed_input_stops_proposing() {
        let mut output = Vec::new();
        let mut policy = InteractivePolicy::new("1\n".as_bytes(), &mut output);
        let car = user_car();
        let track = Track::default_layout();

        assert_eq!(
            policy.propose_destination(&car, &track, &CarView::default()),
            None
        );
        assert!(policy.closed);
        assert_eq!(
            policy.propose_destination(&car, &track, &CarView::default()),
            None
        );
    }
}
