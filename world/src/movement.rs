//! Movement resolver that replays a rasterized path against the track.

use racetrack_core::{rasterize, CarId, CarView, MoveOutcome, ObstructionKind, Position};

use crate::{car::Car, track::Track};

/// First notable cell met while walking a rasterized path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathScan {
    /// Every cell after the start is free, in bounds, and not a finish.
    Clear,
    /// A boundary, wall or car blocks the path at `index`.
    Obstructed {
        /// Index of the blocking cell within the path.
        index: usize,
        /// The blocking cell.
        cell: Position,
        /// What blocks the path.
        obstruction: ObstructionKind,
    },
    /// A finish cell is reached at `index` before any obstruction.
    Finish {
        /// Index of the finish cell within the path.
        index: usize,
        /// The finish cell.
        cell: Position,
    },
}

/// Walks `path` from its second cell and reports the first notable cell.
///
/// Each cell is checked for leaving the grid, then for a wall, then for an
/// occupying car, and finally for a finish; the first match ends the walk.
pub fn scan_path<F>(track: &Track, path: &[Position], occupant: F) -> PathScan
where
    F: Fn(Position) -> Option<CarId>,
{
    for (index, &cell) in path.iter().enumerate().skip(1) {
        let obstruction = if track.is_out_of_bounds(cell) {
            Some(ObstructionKind::Boundary)
        } else if track.is_wall(cell) {
            Some(ObstructionKind::Wall)
        } else {
            occupant(cell).map(ObstructionKind::Car)
        };

        if let Some(obstruction) = obstruction {
            return PathScan::Obstructed {
                index,
                cell,
                obstruction,
            };
        }

        if track.is_finish(cell) {
            return PathScan::Finish { index, cell };
        }
    }

    PathScan::Clear
}

/// Resolves a requested move and applies it to `car`.
///
/// Requests that are empty, point at the current cell, break the car's
/// limits, or come from a car that already won yield [`MoveOutcome::NoMove`]
/// without touching any state. Otherwise the car walks the rasterized path,
/// appending each cell to its history. An obstruction leaves the car on the
/// last safe cell, which is appended once more; a finish cell ends the walk
/// and marks the car as the winner.
pub fn resolve(
    car: &mut Car,
    destination: Option<Position>,
    track: &Track,
    cars: &CarView,
) -> MoveOutcome {
    let start = car.position();
    let Some(destination) = destination else {
        return MoveOutcome::NoMove;
    };
    if car.has_won() || destination == start {
        return MoveOutcome::NoMove;
    }

    let (row_delta, column_delta) = start.delta_to(destination);
    if !car.limits().permits(row_delta, column_delta) {
        return MoveOutcome::NoMove;
    }

    let id = car.id();
    let path = rasterize(start, destination);
    let scan = scan_path(track, &path, |cell| cars.occupant(cell, id));

    match scan {
        PathScan::Clear => {
            for &cell in &path[1..] {
                car.step_to(cell);
            }
            MoveOutcome::Advanced {
                landed: destination,
            }
        }
        PathScan::Obstructed {
            index,
            cell,
            obstruction,
        } => {
            for &step in &path[1..index] {
                car.step_to(step);
            }
            let landed = path[index - 1];
            car.step_to(landed);
            MoveOutcome::Blocked {
                obstruction,
                obstruction_cell: cell,
                landed,
            }
        }
        PathScan::Finish { index, cell } => {
            for &step in &path[1..=index] {
                car.step_to(step);
            }
            car.mark_won();
            MoveOutcome::Won { landed: cell }
        }
    }
}
