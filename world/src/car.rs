//! Authoritative per-car state.

use racetrack_core::{CarId, CarSnapshot, Position, SpeedLimits, TurnOrder};

use crate::track::Track;

/// A car competing in the race.
///
/// The position is only changed by the movement resolver, and the path
/// history only ever grows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Car {
    id: CarId,
    position: Position,
    limits: SpeedLimits,
    turn_order: TurnOrder,
    weight: u32,
    has_won: bool,
    path: Vec<Position>,
}

impl Car {
    /// Places a new car on its starting cell.
    #[must_use]
    pub fn new(
        id: CarId,
        start: Position,
        limits: SpeedLimits,
        turn_order: TurnOrder,
        track: &Track,
    ) -> Self {
        Self {
            id,
            position: start,
            limits,
            turn_order,
            weight: track.weight(start),
            has_won: false,
            path: vec![start],
        }
    }

    /// Identifier of the car.
    #[must_use]
    pub const fn id(&self) -> CarId {
        self.id
    }

    /// Cell the car currently occupies.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Velocity limits and speed budget.
    #[must_use]
    pub const fn limits(&self) -> SpeedLimits {
        self.limits
    }

    /// Turn-order index assigned at setup.
    #[must_use]
    pub const fn turn_order(&self) -> TurnOrder {
        self.turn_order
    }

    /// Weight cached at the last refresh.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether the car has crossed the finish.
    #[must_use]
    pub const fn has_won(&self) -> bool {
        self.has_won
    }

    /// Every cell the car has occupied, starting with its start cell.
    #[must_use]
    pub fn path_history(&self) -> &[Position] {
        &self.path
    }

    /// Captures an immutable snapshot of the car.
    #[must_use]
    pub fn snapshot(&self) -> CarSnapshot {
        CarSnapshot {
            id: self.id,
            position: self.position,
            turn_order: self.turn_order,
            limits: self.limits,
            weight: self.weight,
            has_won: self.has_won,
        }
    }

    pub(crate) fn refresh_weight(&mut self, track: &Track) {
        self.weight = track.weight(self.position);
    }

    pub(crate) fn step_to(&mut self, position: Position) {
        self.position = position;
        self.path.push(position);
    }

    pub(crate) fn mark_won(&mut self) {
        self.has_won = true;
    }
}
