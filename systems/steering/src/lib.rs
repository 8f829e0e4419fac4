#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Steering policies that propose a destination for a car each turn.
//!
//! Policies only read the track and the car view; the authoritative outcome of
//! a proposal is always decided by the world's movement resolver.

use racetrack_core::{rasterize, CarSnapshot, CarView, Position, SpeedLimits};
use racetrack_world::{
    movement::{scan_path, PathScan},
    Track,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Capability shared by every way of driving a car.
pub trait SteeringPolicy {
    /// Proposes where `car` should travel this turn.
    ///
    /// `None`, or the car's own position, leaves the car in place.
    fn propose_destination(
        &mut self,
        car: &CarSnapshot,
        track: &Track,
        cars: &CarView,
    ) -> Option<Position>;
}

/// Policy that always heads for the lowest reachable weight, ignoring traffic.
///
/// Only the destination cell is checked, so the chosen move may still be
/// blocked by a wall or car somewhere along the way.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedFocused;

impl SteeringPolicy for SpeedFocused {
    fn propose_destination(
        &mut self,
        car: &CarSnapshot,
        track: &Track,
        _cars: &CarView,
    ) -> Option<Position> {
        Some(lowest_weight_destination(car, track, |_| true))
    }
}

/// Policy that only accepts moves whose whole path is free of obstructions.
///
/// A finish cell anywhere on the path makes the candidate safe, since the
/// move ends there.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManeuverFocused;

impl SteeringPolicy for ManeuverFocused {
    fn propose_destination(
        &mut self,
        car: &CarSnapshot,
        track: &Track,
        cars: &CarView,
    ) -> Option<Position> {
        Some(lowest_weight_destination(car, track, |candidate| {
            let path = rasterize(car.position, candidate);
            let scan = scan_path(track, &path, |cell| cars.occupant(cell, car.id));
            !matches!(scan, PathScan::Obstructed { .. })
        }))
    }
}

/// Steering variants selectable when entering a car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// [`SpeedFocused`].
    Speed,
    /// [`ManeuverFocused`].
    Maneuver,
    /// Driven by a human through an input adapter.
    Interactive,
}

impl PolicyKind {
    /// Builds the automated policy for this kind, if it is automated.
    #[must_use]
    pub fn automated(self) -> Option<Box<dyn SteeringPolicy>> {
        match self {
            Self::Speed => Some(Box::new(SpeedFocused)),
            Self::Maneuver => Some(Box::new(ManeuverFocused)),
            Self::Interactive => None,
        }
    }
}

/// Every offset a car with `limits` may request, in scan order.
///
/// Row deltas ascend in the outer loop and column deltas in the inner loop.
/// The zero offset and offsets over the combined speed budget are skipped.
pub fn candidate_offsets(limits: SpeedLimits) -> impl Iterator<Item = (i32, i32)> {
    let rows = i32::try_from(limits.max_row_delta).unwrap_or(i32::MAX);
    let columns = i32::try_from(limits.max_column_delta).unwrap_or(i32::MAX);

    (-rows..=rows)
        .flat_map(move |row_delta| {
            (-columns..=columns).map(move |column_delta| (row_delta, column_delta))
        })
        .filter(move |&(row_delta, column_delta)| {
            (row_delta, column_delta) != (0, 0) && limits.permits(row_delta, column_delta)
        })
}

fn lowest_weight_destination<F>(car: &CarSnapshot, track: &Track, mut accept: F) -> Position
where
    F: FnMut(Position) -> bool,
{
    let mut best = car.position;
    let mut best_weight = track.weight(car.position);

    for (row_delta, column_delta) in candidate_offsets(car.limits) {
        let candidate = car.position.offset(row_delta, column_delta);
        if track.is_out_of_bounds(candidate) || track.is_wall(candidate) {
            continue;
        }

        let weight = track.weight(candidate);
        if weight >= best_weight {
            continue;
        }

        if !accept(candidate) {
            trace!(car = %car.id, %candidate, "candidate rejected");
            continue;
        }

        best = candidate;
        best_weight = weight;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_skip_zero_and_respect_the_budget() {
        let offsets: Vec<(i32, i32)> = candidate_offsets(SpeedLimits::new(1, 1, 1)).collect();
        assert_eq!(offsets, vec![(-1, 0), (0, -1), (0, 1), (1, 0)]);
    }

    #[test]
    fn offsets_cover_the_full_envelope() {
        let count = candidate_offsets(SpeedLimits::new(3, 3, 5)).count();
        // 7x7 envelope minus the origin and the four corners over budget.
        assert_eq!(count, 49 - 1 - 4);
    }

    #[test]
    fn only_automated_kinds_build_a_policy() {
        assert!(PolicyKind::Speed.automated().is_some());
        assert!(PolicyKind::Maneuver.automated().is_some());
        assert!(PolicyKind::Interactive.automated().is_none());
    }
}
