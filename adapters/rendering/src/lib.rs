#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Console rendering for racetrack adapters.
//!
//! Frames are plain text: one line per track row with every cell followed by
//! a single space. Narration turns world events into the sentences shown to
//! players between frames.

use std::io::Write;

use anyhow::{Context, Result as AnyResult};
use racetrack_core::{CarId, CarView, Event, InvalidMoveRequest, MoveOutcome, Position};
use racetrack_world::Track;

/// Presentation surface that displays a race as it unfolds.
pub trait RaceRenderer {
    /// Shows the banner that opens the race.
    fn announce(&mut self, banner: &str) -> AnyResult<()>;

    /// Shows the track with the live cars overlaid.
    fn present_frame(&mut self, track: &Track, cars: &CarView) -> AnyResult<()>;

    /// Shows the narration for every event that has any.
    fn present_events(&mut self, events: &[Event]) -> AnyResult<()>;

    /// Shows the final track with the winner's path drawn onto it.
    fn present_winner(
        &mut self,
        track: &Track,
        cars: &CarView,
        winner: CarId,
        path: &[Position],
    ) -> AnyResult<()>;
}

/// Renderer writing plain text frames to any [`Write`] sink.
#[derive(Debug)]
pub struct ConsoleRenderer<W> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    /// Creates a renderer writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the renderer, returning the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_block(&mut self, block: &str) -> AnyResult<()> {
        writeln!(self.out)
            .and_then(|()| write!(self.out, "{block}"))
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush())
            .context("failed to write frame")
    }
}

impl<W: Write> RaceRenderer for ConsoleRenderer<W> {
    fn announce(&mut self, banner: &str) -> AnyResult<()> {
        writeln!(self.out, "{banner}").context("failed to write banner")
    }

    fn present_frame(&mut self, track: &Track, cars: &CarView) -> AnyResult<()> {
        self.write_block(&render_frame(track, cars))
    }

    fn present_events(&mut self, events: &[Event]) -> AnyResult<()> {
        for message in events.iter().filter_map(narrate) {
            writeln!(self.out, "{message}").context("failed to write narration")?;
        }
        Ok(())
    }

    fn present_winner(
        &mut self,
        track: &Track,
        cars: &CarView,
        winner: CarId,
        path: &[Position],
    ) -> AnyResult<()> {
        self.write_block(&render_winning_path(track, cars, winner, path))
    }
}

/// Renders the track with every car drawn on its current cell.
#[must_use]
pub fn render_frame(track: &Track, cars: &CarView) -> String {
    let mut grid = base_grid(track);
    overlay_cars(&mut grid, cars);
    format_grid(&grid)
}

/// Renders the closing frame that traces the winner's path.
///
/// Path cells are marked with the winner's id, skipping walls and cells off
/// the grid; live cars are drawn on top.
#[must_use]
pub fn render_winning_path(
    track: &Track,
    cars: &CarView,
    winner: CarId,
    path: &[Position],
) -> String {
    let mut grid = base_grid(track);
    for &cell in path {
        if !track.is_wall(cell) {
            mark(&mut grid, cell, winner.get());
        }
    }
    overlay_cars(&mut grid, cars);

    format!("Final Track – CAR {winner} WINS!\n\n{}", format_grid(&grid))
}

/// Sentence describing an event, if the event is worth telling.
///
/// Only blocked and winning moves are narrated.
#[must_use]
pub fn narrate(event: &Event) -> Option<String> {
    let Event::MoveResolved {
        car,
        requested,
        outcome,
        ..
    } = event
    else {
        return None;
    };

    match outcome {
        MoveOutcome::Blocked {
            obstruction,
            obstruction_cell,
            landed,
        } => Some(format!(
            "Car {car} attempts to move to {requested}.\n\
             Before reaching the space, Car {car} passes a {obstruction} at {obstruction_cell}.\n\
             This means Car {car} will not reach its destination and will land on the previous safe spot {landed}."
        )),
        MoveOutcome::Won { landed } => Some(format!(
            "Car {car} attempts to move to {requested}.\n\
             Before reaching the space, Car {car} passes the finish line at {landed}.\n\
             CAR {car} WINS!"
        )),
        MoveOutcome::NoMove | MoveOutcome::Advanced { .. } => None,
    }
}

/// Explains to a player why their requested move was refused.
#[must_use]
pub fn explain_rejection(car: CarId, reason: &InvalidMoveRequest) -> String {
    let limits = reason.limits;
    format!(
        "\n❌ INVALID MOVE!\n\
         Your attempted move: ({}, {})\n\
         Rules for User Car {car}:\n \
         - Vertical movement allowed:  -{rows} to +{rows}\n \
         - Horizontal movement allowed: -{columns} to +{columns}\n \
         - |vertical| + |horizontal| must be ≤ {speed}\n\
         This move was rejected. Your turn is skipped.\n",
        reason.row_delta,
        reason.column_delta,
        rows = limits.max_row_delta,
        columns = limits.max_column_delta,
        speed = limits.max_speed,
    )
}

fn base_grid(track: &Track) -> Vec<Vec<char>> {
    let rows = usize::try_from(track.height()).unwrap_or_default();
    let columns = usize::try_from(track.width()).unwrap_or_default();
    let mut grid = vec![vec![' '; columns]; rows];

    for position in track.positions() {
        if let Some(marker) = track.display_char(position) {
            mark(&mut grid, position, marker);
        }
    }

    grid
}

fn overlay_cars(grid: &mut [Vec<char>], cars: &CarView) {
    for car in cars.iter() {
        mark(grid, car.position, car.id.get());
    }
}

fn mark(grid: &mut [Vec<char>], position: Position, marker: char) {
    let (Ok(row), Ok(column)) = (
        usize::try_from(position.row()),
        usize::try_from(position.column()),
    ) else {
        return;
    };

    if let Some(cell) = grid.get_mut(row).and_then(|line| line.get_mut(column)) {
        *cell = marker;
    }
}

fn format_grid(grid: &[Vec<char>]) -> String {
    let mut text = String::new();
    for line in grid {
        for cell in line {
            text.push(*cell);
            text.push(' ');
        }
        text.push('\n');
    }
    text
}
