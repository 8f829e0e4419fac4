#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the racetrack engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative race world, and pure systems. Systems submit [`Command`]
//! values describing desired moves, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that adapters
//! narrate and render. Cars are only ever observed through immutable
//! [`CarView`] snapshots outside of the world.

mod path;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use path::rasterize;

/// Canonical banner emitted when a race starts.
pub const WELCOME_BANNER: &str = "Starting Race!";

/// Location of a single grid cell expressed as row and column coordinates.
///
/// Coordinates are signed so that destinations proposed outside of the track
/// can still be represented and rasterized; the track decides whether a
/// position is in bounds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    row: i32,
    column: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Creates a position from unsigned grid indices, saturating at `i32::MAX`.
    #[must_use]
    pub fn from_grid(row: u32, column: u32) -> Self {
        Self {
            row: i32::try_from(row).unwrap_or(i32::MAX),
            column: i32::try_from(column).unwrap_or(i32::MAX),
        }
    }

    /// Returns the position displaced by the provided deltas, saturating at
    /// the bounds of `i32`.
    #[must_use]
    pub const fn offset(self, row_delta: i32, column_delta: i32) -> Self {
        Self {
            row: self.row.saturating_add(row_delta),
            column: self.column.saturating_add(column_delta),
        }
    }

    /// Signed row and column deltas required to travel from `self` to `other`.
    #[must_use]
    pub const fn delta_to(self, other: Position) -> (i32, i32) {
        (
            other.row.saturating_sub(self.row),
            other.column.saturating_sub(self.column),
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.column)
    }
}

/// Single-character identifier assigned to a car.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CarId(char);

impl CarId {
    /// Creates a new car identifier from its display character.
    #[must_use]
    pub const fn new(value: char) -> Self {
        Self(value)
    }

    /// Retrieves the display character of the identifier.
    #[must_use]
    pub const fn get(&self) -> char {
        self.0
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a car in the turn sequence, assigned once at race setup.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TurnOrder(u32);

impl TurnOrder {
    /// Creates a new turn-order index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Per-axis velocity limits and the combined speed budget of a car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedLimits {
    /// Largest absolute row delta allowed in a single move.
    pub max_row_delta: u32,
    /// Largest absolute column delta allowed in a single move.
    pub max_column_delta: u32,
    /// Largest allowed sum of the absolute row and column deltas.
    pub max_speed: u32,
}

impl SpeedLimits {
    /// Creates a new set of limits.
    #[must_use]
    pub const fn new(max_row_delta: u32, max_column_delta: u32, max_speed: u32) -> Self {
        Self {
            max_row_delta,
            max_column_delta,
            max_speed,
        }
    }

    /// Reports whether a move with the provided deltas respects every limit.
    #[must_use]
    pub fn permits(&self, row_delta: i32, column_delta: i32) -> bool {
        let rows = row_delta.unsigned_abs();
        let columns = column_delta.unsigned_abs();
        rows <= self.max_row_delta
            && columns <= self.max_column_delta
            && u64::from(rows) + u64::from(columns) <= u64::from(self.max_speed)
    }

    /// Validates a move, describing the violation when a limit is exceeded.
    pub fn check(&self, row_delta: i32, column_delta: i32) -> Result<(), InvalidMoveRequest> {
        if self.permits(row_delta, column_delta) {
            Ok(())
        } else {
            Err(InvalidMoveRequest {
                row_delta,
                column_delta,
                limits: *self,
            })
        }
    }
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self::new(3, 3, 5)
    }
}

/// Requested move that violates a car's velocity limits or speed budget.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error(
    "move ({row_delta}, {column_delta}) exceeds limits: |rows| <= {}, |columns| <= {}, |rows| + |columns| <= {}",
    .limits.max_row_delta,
    .limits.max_column_delta,
    .limits.max_speed
)]
pub struct InvalidMoveRequest {
    /// Signed row delta that was requested.
    pub row_delta: i32,
    /// Signed column delta that was requested.
    pub column_delta: i32,
    /// Limits the request was checked against.
    pub limits: SpeedLimits,
}

/// Classification of a single track cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Track a car may legally occupy.
    Open,
    /// Impassable cell that blocks movement and weight propagation.
    Wall,
    /// Terminal cell; reaching it wins the race.
    Finish,
}

/// Obstruction met while walking a rasterized path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstructionKind {
    /// The path left the track grid.
    Boundary,
    /// The path crossed a wall cell.
    Wall,
    /// The path ran into the cell occupied by another car.
    Car(CarId),
}

impl fmt::Display for ObstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boundary => write!(f, "boundary"),
            Self::Wall => write!(f, "wall"),
            Self::Car(id) => write!(f, "car {id}"),
        }
    }
}

/// Authoritative result of resolving a requested move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The request was empty, pointed at the current cell, or broke a limit.
    NoMove,
    /// The car walked its whole path and landed on the destination.
    Advanced {
        /// Cell the car occupies after the move.
        landed: Position,
    },
    /// An obstruction stopped the car on the last safe cell before it.
    Blocked {
        /// What stopped the car.
        obstruction: ObstructionKind,
        /// Cell where the obstruction was met.
        obstruction_cell: Position,
        /// Last safe cell the car rolled back to.
        landed: Position,
    },
    /// The car crossed a finish cell before meeting any obstruction.
    Won {
        /// Finish cell the car stopped on.
        landed: Position,
    },
}

/// Commands that express all permissible race mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Refreshes cached weights and fixes the turn order for a new round.
    BeginRound,
    /// Requests that a car travel towards the provided destination.
    MoveCar {
        /// Car attempting to move.
        car: CarId,
        /// Proposed destination; `None` keeps the car in place.
        destination: Option<Position>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces a new round and the order cars will act in.
    RoundStarted {
        /// One-based index of the round.
        round: u32,
        /// Cars in the order they act during the round.
        order: Vec<CarId>,
    },
    /// Reports that a destination violated the car's limits and was ignored.
    MoveRejected {
        /// Car whose request was rejected.
        car: CarId,
        /// Destination that was requested.
        requested: Position,
        /// Limit violation that caused the rejection.
        reason: InvalidMoveRequest,
    },
    /// Reports the outcome of a move request that passed validation.
    MoveResolved {
        /// Car that moved.
        car: CarId,
        /// Cell the car occupied before the move.
        from: Position,
        /// Destination that was requested.
        requested: Position,
        /// Authoritative outcome of the move.
        outcome: MoveOutcome,
    },
    /// Announces the winner of the race.
    RaceWon {
        /// Car that reached the finish.
        car: CarId,
        /// Finish cell the car stopped on.
        landed: Position,
    },
}

/// Immutable representation of a single car's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarSnapshot {
    /// Identifier of the car.
    pub id: CarId,
    /// Cell currently occupied by the car.
    pub position: Position,
    /// Turn-order index fixed at race setup.
    pub turn_order: TurnOrder,
    /// Velocity limits and speed budget of the car.
    pub limits: SpeedLimits,
    /// Weight of the occupied cell cached at the start of the round.
    pub weight: u32,
    /// Whether the car has already crossed the finish.
    pub has_won: bool,
}

/// Read-only snapshot describing all cars on the track.
#[derive(Clone, Debug, Default)]
pub struct CarView {
    snapshots: Vec<CarSnapshot>,
}

impl CarView {
    /// Creates a new car view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CarSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.turn_order);
        Self { snapshots }
    }

    /// Iterator over the captured car snapshots in turn order.
    pub fn iter(&self) -> impl Iterator<Item = &CarSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided car.
    #[must_use]
    pub fn get(&self, id: CarId) -> Option<&CarSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Returns the car other than `excluding` that occupies `position`.
    #[must_use]
    pub fn occupant(&self, position: Position, excluding: CarId) -> Option<CarId> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.id != excluding && snapshot.position == position)
            .map(|snapshot| snapshot.id)
    }

    /// Number of cars captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no cars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
