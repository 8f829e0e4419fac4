#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Race system that places entrants on the starting grid and drives rounds.
//!
//! Every turn the runner asks a car's [`SteeringPolicy`] for a destination and
//! submits it to the world as a [`Command::MoveCar`]; the world alone decides
//! what actually happens.

use std::collections::HashSet;

use racetrack_core::{CarId, Command, Event, SpeedLimits, TurnOrder};
use racetrack_system_steering::SteeringPolicy;
use racetrack_world::{apply, query, Car, Race, Track};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Car waiting to be placed on the starting grid.
pub struct Entrant {
    /// Identifier shown on the track.
    pub id: CarId,
    /// Policy that steers the car.
    pub policy: Box<dyn SteeringPolicy>,
    /// Velocity limits and speed budget of the car.
    pub limits: SpeedLimits,
}

impl Entrant {
    /// Creates a new entrant.
    #[must_use]
    pub fn new(id: CarId, policy: Box<dyn SteeringPolicy>, limits: SpeedLimits) -> Self {
        Self { id, policy, limits }
    }
}

/// Reasons a race cannot be set up.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// The track has no unused open cell left for the car.
    #[error("no starting cell left for car {car}")]
    NoStartingCell {
        /// Car that could not be placed.
        car: CarId,
    },
    /// Two entrants share the same identifier.
    #[error("car {car} is entered more than once")]
    DuplicateCar {
        /// Identifier used twice.
        car: CarId,
    },
}

/// Places every entrant on the open cell furthest from the finish.
///
/// Cells are handed out in entry order, each one excluded from later picks.
/// The n-th entrant (counting from zero) receives turn order `n + 1`.
pub fn plan_starting_grid(track: &Track, entrants: &[Entrant]) -> Result<Vec<Car>, SetupError> {
    let mut used = HashSet::with_capacity(entrants.len());
    let mut seen = HashSet::with_capacity(entrants.len());
    let mut cars = Vec::with_capacity(entrants.len());

    for (sequence, entrant) in (1..).zip(entrants) {
        if !seen.insert(entrant.id) {
            return Err(SetupError::DuplicateCar { car: entrant.id });
        }

        let start = track
            .find_highest_weight_open_cell(&used)
            .ok_or(SetupError::NoStartingCell { car: entrant.id })?;
        let _ = used.insert(start);

        debug!(car = %entrant.id, %start, weight = track.weight(start), "car placed");
        cars.push(Car::new(
            entrant.id,
            start,
            entrant.limits,
            TurnOrder::new(sequence),
            track,
        ));
    }

    Ok(cars)
}

/// Steering policy bound to the car it drives.
pub struct Driver {
    car: CarId,
    policy: Box<dyn SteeringPolicy>,
}

impl Driver {
    /// Binds `policy` to `car`.
    #[must_use]
    pub fn new(car: CarId, policy: Box<dyn SteeringPolicy>) -> Self {
        Self { car, policy }
    }

    /// Car steered by this driver.
    #[must_use]
    pub const fn car(&self) -> CarId {
        self.car
    }
}

/// Result of a single round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundResult {
    /// Nobody reached the finish; another round is needed.
    Continue,
    /// The car crossed the finish and ended the round.
    Won(CarId),
}

/// How a call to [`RaceRunner::run`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceSummary {
    /// A car reached the finish.
    Won {
        /// The winning car.
        winner: CarId,
        /// Rounds played, including the winning one.
        rounds: u32,
    },
    /// The round cap was reached without a winner.
    Unfinished {
        /// Rounds played.
        rounds: u32,
    },
}

/// Owns the race and the drivers steering its cars.
pub struct RaceRunner {
    race: Race,
    drivers: Vec<Driver>,
}

impl RaceRunner {
    /// Creates a runner for an already assembled race.
    #[must_use]
    pub fn new(race: Race, drivers: Vec<Driver>) -> Self {
        Self { race, drivers }
    }

    /// Places `entrants` on `track` and builds the runner driving them.
    pub fn setup(track: Track, entrants: Vec<Entrant>) -> Result<Self, SetupError> {
        let cars = plan_starting_grid(&track, &entrants)?;
        let drivers = entrants
            .into_iter()
            .map(|entrant| Driver::new(entrant.id, entrant.policy))
            .collect();

        Ok(Self::new(Race::new(track, cars), drivers))
    }

    /// Read-only access to the race.
    #[must_use]
    pub fn race(&self) -> &Race {
        &self.race
    }

    /// Plays one round: refreshes the order, then lets every car act once.
    ///
    /// The round ends as soon as a car wins; later cars do not act.
    pub fn play_round(&mut self, out_events: &mut Vec<Event>) -> RoundResult {
        apply(&mut self.race, Command::BeginRound, out_events);

        for id in query::turn_order(&self.race) {
            let view = query::car_view(&self.race);
            let Some(car) = view.get(id).copied() else {
                continue;
            };
            if car.has_won {
                continue;
            }

            let Some(driver) = self.drivers.iter_mut().find(|driver| driver.car == id) else {
                warn!(car = %id, "car has no driver");
                continue;
            };

            let destination =
                driver
                    .policy
                    .propose_destination(&car, query::track(&self.race), &view);
            debug!(car = %id, from = %car.position, ?destination, "destination proposed");

            apply(
                &mut self.race,
                Command::MoveCar {
                    car: id,
                    destination,
                },
                out_events,
            );

            if let Some(winner) = query::winner(&self.race) {
                return RoundResult::Won(winner);
            }
        }

        RoundResult::Continue
    }

    /// Plays rounds until a car wins or `max_rounds` rounds have been played.
    ///
    /// `on_round` receives the race and the events of each finished round; an
    /// error from it stops the race and is returned unchanged.
    pub fn run<F, E>(&mut self, max_rounds: Option<u32>, mut on_round: F) -> Result<RaceSummary, E>
    where
        F: FnMut(&Race, &[Event]) -> Result<(), E>,
    {
        let mut events = Vec::new();

        loop {
            let rounds = query::round(&self.race);
            if let Some(winner) = query::winner(&self.race) {
                return Ok(RaceSummary::Won { winner, rounds });
            }
            if max_rounds.is_some_and(|max| rounds >= max) {
                info!(rounds, "round cap reached without a winner");
                return Ok(RaceSummary::Unfinished { rounds });
            }

            events.clear();
            let result = self.play_round(&mut events);
            on_round(&self.race, &events)?;

            if let RoundResult::Won(winner) = result {
                let rounds = query::round(&self.race);
                info!(car = %winner, rounds, "race finished");
                return Ok(RaceSummary::Won { winner, rounds });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use racetrack_system_steering::SpeedFocused;

    use super::*;

    fn entrant(id: char) -> Entrant {
        Entrant::new(CarId::new(id), Box::new(SpeedFocused), SpeedLimits::default())
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let track = Track::default_layout();
        let result = plan_starting_grid(&track, &[entrant('1'), entrant('1')]);
        assert_eq!(
            result.map(|cars| cars.len()),
            Err(SetupError::DuplicateCar {
                car: CarId::new('1')
            })
        );
    }

    #[test]
    fn running_out_of_cells_names_the_car() {
        let track = Track::load(["XTF"]).expect("valid track");
        let result = plan_starting_grid(&track, &[entrant('1'), entrant('2')]);
        assert_eq!(
            result.map(|cars| cars.len()),
            Err(SetupError::NoStartingCell {
                car: CarId::new('2')
            })
        );
    }

    #[test]
    fn empty_field_gives_empty_grid() {
        let track = Track::default_layout();
        let cars = plan_starting_grid(&track, &[]).expect("nothing to place");
        assert!(cars.is_empty());
    }
}
