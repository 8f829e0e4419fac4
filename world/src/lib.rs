#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative race state management for the racetrack engine.

mod car;
pub mod movement;
mod track;
mod weights;

use racetrack_core::{CarId, Command, Event, MoveOutcome, Position, WELCOME_BANNER};
use tracing::{debug, info};

pub use car::Car;
pub use track::{FormatError, Track, FINISH_MARKER, TRACK_MARKER, WALL_MARKER};
pub use weights::{WeightField, UNREACHABLE_WEIGHT};

/// Represents the authoritative race state.
#[derive(Clone, Debug)]
pub struct Race {
    banner: &'static str,
    track: Track,
    cars: Vec<Car>,
    round: u32,
    winner: Option<CarId>,
}

impl Race {
    /// Creates a race on `track` with the provided cars.
    ///
    /// Cars keep the turn-order indices they were constructed with.
    #[must_use]
    pub fn new(track: Track, mut cars: Vec<Car>) -> Self {
        cars.sort_by_key(Car::turn_order);
        Self {
            banner: WELCOME_BANNER,
            track,
            cars,
            round: 0,
            winner: None,
        }
    }

    fn car_index(&self, id: CarId) -> Option<usize> {
        self.cars.iter().position(|car| car.id() == id)
    }

    fn begin_round(&mut self, out_events: &mut Vec<Event>) {
        for car in &mut self.cars {
            car.refresh_weight(&self.track);
        }
        self.cars.sort_by(|a, b| {
            a.turn_order()
                .cmp(&b.turn_order())
                .then_with(|| a.weight().cmp(&b.weight()))
        });
        self.round = self.round.saturating_add(1);

        let order: Vec<CarId> = self.cars.iter().map(Car::id).collect();
        debug!(round = self.round, ?order, "round started");
        out_events.push(Event::RoundStarted {
            round: self.round,
            order,
        });
    }

    fn move_car(
        &mut self,
        id: CarId,
        destination: Option<Position>,
        out_events: &mut Vec<Event>,
    ) {
        if self.winner.is_some() {
            return;
        }
        let Some(index) = self.car_index(id) else {
            return;
        };
        let Some(requested) = destination else {
            return;
        };

        let view = query::car_view(self);
        let car = &mut self.cars[index];
        if car.has_won() {
            return;
        }

        let from = car.position();
        let (row_delta, column_delta) = from.delta_to(requested);
        if let Err(reason) = car.limits().check(row_delta, column_delta) {
            debug!(car = %id, %requested, %reason, "move rejected");
            out_events.push(Event::MoveRejected {
                car: id,
                requested,
                reason,
            });
            return;
        }

        let outcome = movement::resolve(car, Some(requested), &self.track, &view);
        debug!(car = %id, %from, %requested, ?outcome, "move resolved");
        out_events.push(Event::MoveResolved {
            car: id,
            from,
            requested,
            outcome,
        });

        if let MoveOutcome::Won { landed } = outcome {
            info!(car = %id, %landed, round = self.round, "race won");
            self.winner = Some(id);
            out_events.push(Event::RaceWon { car: id, landed });
        }
    }
}

/// Applies the provided command to the race, mutating state deterministically.
pub fn apply(race: &mut Race, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::BeginRound => race.begin_round(out_events),
        Command::MoveCar { car, destination } => race.move_car(car, destination, out_events),
    }
}

/// Query functions that provide read-only access to the race state.
pub mod query {
    use racetrack_core::{CarId, CarView, Position};

    use super::{Car, Race, Track};

    /// Retrieves the banner adapters display when the race starts.
    #[must_use]
    pub fn welcome_banner(race: &Race) -> &'static str {
        race.banner
    }

    /// Provides read-only access to the track.
    #[must_use]
    pub fn track(race: &Race) -> &Track {
        &race.track
    }

    /// Captures a read-only view of the cars on the track.
    #[must_use]
    pub fn car_view(race: &Race) -> CarView {
        CarView::from_snapshots(race.cars.iter().map(Car::snapshot).collect())
    }

    /// Cars in the order fixed by the most recent round start.
    #[must_use]
    pub fn turn_order(race: &Race) -> Vec<CarId> {
        race.cars.iter().map(Car::id).collect()
    }

    /// Number of rounds started so far.
    #[must_use]
    pub fn round(race: &Race) -> u32 {
        race.round
    }

    /// Car that won the race, if any.
    #[must_use]
    pub fn winner(race: &Race) -> Option<CarId> {
        race.winner
    }

    /// Full path history of the provided car.
    #[must_use]
    pub fn car_path(race: &Race, id: CarId) -> Option<&[Position]> {
        race.cars
            .iter()
            .find(|car| car.id() == id)
            .map(Car::path_history)
    }

    /// Path history of the winner, once the race is decided.
    #[must_use]
    pub fn winner_path(race: &Race) -> Option<&[Position]> {
        race.winner.and_then(|id| car_path(race, id))
    }
}

#[cfg(test)]
mod tests {
    use racetrack_core::{SpeedLimits, TurnOrder};

    use super::*;

    fn race_with(cars: &[(char, u32, i32, i32)]) -> Race {
        let track = Track::default_layout();
        let cars = cars
            .iter()
            .map(|&(id, order, row, column)| {
                Car::new(
                    CarId::new(id),
                    Position::new(row, column),
                    SpeedLimits::default(),
                    TurnOrder::new(order),
                    &track,
                )
            })
            .collect();
        Race::new(track, cars)
    }

    #[test]
    fn begin_round_orders_by_turn_order_then_weight() {
        let mut race = race_with(&[('3', 3, 7, 7), ('1', 1, 1, 1), ('2', 2, 8, 1)]);
        let mut events = Vec::new();

        apply(&mut race, Command::BeginRound, &mut events);

        assert_eq!(
            events,
            vec![Event::RoundStarted {
                round: 1,
                order: vec![CarId::new('1'), CarId::new('2'), CarId::new('3')],
            }]
        );
        let view = query::car_view(&race);
        assert_eq!(view.get(CarId::new('3')).map(|car| car.weight), Some(1));
    }

    #[test]
    fn over_limit_request_is_rejected_without_mutation() {
        let mut race = race_with(&[('1', 1, 1, 1)]);
        let mut events = Vec::new();

        apply(
            &mut race,
            Command::MoveCar {
                car: CarId::new('1'),
                destination: Some(Position::new(5, 5)),
            },
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected { reason, .. }] if reason.row_delta == 4 && reason.column_delta == 4
        ));
        assert_eq!(
            query::car_path(&race, CarId::new('1')),
            Some(&[Position::new(1, 1)][..])
        );
    }

    #[test]
    fn winning_move_ends_the_race() {
        let mut race = race_with(&[('1', 1, 1, 6), ('2', 2, 8, 1)]);
        let mut events = Vec::new();

        apply(
            &mut race,
            Command::MoveCar {
                car: CarId::new('1'),
                destination: Some(Position::new(1, 8)),
            },
            &mut events,
        );

        assert_eq!(query::winner(&race), Some(CarId::new('1')));
        assert_eq!(
            query::winner_path(&race),
            Some(&[Position::new(1, 6), Position::new(1, 7), Position::new(1, 8)][..])
        );
        assert!(events.contains(&Event::RaceWon {
            car: CarId::new('1'),
            landed: Position::new(1, 8),
        }));

        events.clear();
        apply(
            &mut race,
            Command::MoveCar {
                car: CarId::new('2'),
                destination: Some(Position::new(8, 2)),
            },
            &mut events,
        );
        assert!(events.is_empty(), "no moves are accepted after a win");
    }

    #[test]
    fn unknown_car_and_empty_requests_emit_nothing() {
        let mut race = race_with(&[('1', 1, 1, 1)]);
        let mut events = Vec::new();

        apply(
            &mut race,
            Command::MoveCar {
                car: CarId::new('9'),
                destination: Some(Position::new(1, 2)),
            },
            &mut events,
        );
        apply(
            &mut race,
            Command::MoveCar {
                car: CarId::new('1'),
                destination: None,
            },
            &mut events,
        );

        assert!(events.is_empty());
    }
}
