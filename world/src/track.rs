//! Racetrack grid loaded from a textual map.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use racetrack_core::{CellKind, Position};
use thiserror::Error;

use crate::weights::{WeightField, UNREACHABLE_WEIGHT};

/// Character marking an impassable wall cell.
pub const WALL_MARKER: char = 'X';
/// Character marking a finish cell.
pub const FINISH_MARKER: char = 'F';
/// Character marking plain open track; rendered as a blank.
pub const TRACK_MARKER: char = 'T';

const DEFAULT_LAYOUT: [&str; 10] = [
    "XXXXXXXXXX",
    "XTTTTTTTFX",
    "XTXXXTXTTX",
    "XTTTTTXTTX",
    "XTXXXTTTTX",
    "XTTTTTXTTX",
    "XTXTXTTTTX",
    "XTTTTTTTFX",
    "XTTTTTTTTX",
    "XXXXXXXXXX",
];

/// Reasons a track source may be rejected.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The track file could not be read.
    #[error("could not read track file {}", path.display())]
    Unreadable {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The source contained no non-blank lines.
    #[error("track source is empty")]
    Empty,
    /// A row's length differs from the first row's.
    #[error("track row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row among the retained lines.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
}

/// Immutable racetrack grid with its precomputed weight field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    width: u32,
    height: u32,
    markers: Vec<char>,
    kinds: Vec<CellKind>,
    weights: WeightField,
}

impl Track {
    /// Builds a track from raw text lines.
    ///
    /// Lines are trimmed and blank lines skipped; every retained line must
    /// have the same length. Any character other than the wall and finish
    /// markers is treated as open track.
    pub fn load<I, S>(lines: I) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows: Vec<Vec<char>> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().chars().collect::<Vec<char>>())
            .filter(|row| !row.is_empty())
            .collect();

        let Some(first) = rows.first() else {
            return Err(FormatError::Empty);
        };
        let expected = first.len();

        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(FormatError::RaggedRow {
                row,
                expected,
                found,
            });
        }

        let width = u32::try_from(expected).unwrap_or(u32::MAX);
        let height = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let markers: Vec<char> = rows.into_iter().flatten().collect();
        let kinds: Vec<CellKind> = markers.iter().map(|&marker| classify(marker)).collect();
        let weights = WeightField::compute(width, height, &kinds);

        Ok(Self {
            width,
            height,
            markers,
            kinds,
            weights,
        })
    }

    /// Reads and parses the track file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| FormatError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(contents.lines())
    }

    /// Reads the track at `path`, falling back to [`Track::default_layout`].
    ///
    /// The rejection is returned alongside the fallback track so callers can
    /// report it.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<FormatError>) {
        match Self::from_path(path) {
            Ok(track) => (track, None),
            Err(err) => (Self::default_layout(), Some(err)),
        }
    }

    /// Built-in 10×10 track with a wall border and two finish cells.
    #[must_use]
    pub fn default_layout() -> Self {
        let mut markers = Vec::with_capacity(100);
        for line in DEFAULT_LAYOUT {
            markers.extend(line.chars());
        }
        let kinds: Vec<CellKind> = markers.iter().map(|&marker| classify(marker)).collect();
        let weights = WeightField::compute(10, 10, &kinds);

        Self {
            width: 10,
            height: 10,
            markers,
            kinds,
            weights,
        }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Reports whether the position lies outside the grid.
    #[must_use]
    pub fn is_out_of_bounds(&self, position: Position) -> bool {
        self.index(position).is_none()
    }

    /// Reports whether the position is a wall. Out-of-bounds counts as wall.
    #[must_use]
    pub fn is_wall(&self, position: Position) -> bool {
        self.cell(position).map_or(true, |kind| kind == CellKind::Wall)
    }

    /// Reports whether the position is a finish cell.
    #[must_use]
    pub fn is_finish(&self, position: Position) -> bool {
        self.cell(position) == Some(CellKind::Finish)
    }

    /// Classification of the cell at `position`, if it lies within the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<CellKind> {
        self.index(position)
            .and_then(|index| self.kinds.get(index).copied())
    }

    /// Weight of the cell at the provided row and column.
    #[must_use]
    pub fn weight_at(&self, row: i32, column: i32) -> u32 {
        self.weight(Position::new(row, column))
    }

    /// Weight of the cell at `position`; out-of-bounds cells are unreachable.
    #[must_use]
    pub fn weight(&self, position: Position) -> u32 {
        self.index(position)
            .map_or(UNREACHABLE_WEIGHT, |index| self.weights.get(index))
    }

    /// Read-only access to the weight field.
    #[must_use]
    pub fn weights(&self) -> &WeightField {
        &self.weights
    }

    /// Character used to display the cell; open track is shown as a blank.
    #[must_use]
    pub fn display_char(&self, position: Position) -> Option<char> {
        let marker = self.index(position).and_then(|index| self.markers.get(index))?;
        Some(if *marker == TRACK_MARKER { ' ' } else { *marker })
    }

    /// Every finish cell in row-major order.
    #[must_use]
    pub fn finish_cells(&self) -> Vec<Position> {
        self.positions()
            .filter(|&position| self.is_finish(position))
            .collect()
    }

    /// Every cell of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).map(move |column| Position::from_grid(row, column))
        })
    }

    /// Open cell with the strictly largest reachable weight not in `excluding`.
    ///
    /// Cells are scanned row-major, so ties go to the first cell encountered.
    /// Finish cells and unreachable cells are never selected.
    #[must_use]
    pub fn find_highest_weight_open_cell(
        &self,
        excluding: &HashSet<Position>,
    ) -> Option<Position> {
        let mut best: Option<(u32, Position)> = None;

        for position in self.positions() {
            if self.cell(position) != Some(CellKind::Open) || excluding.contains(&position) {
                continue;
            }

            let weight = self.weight(position);
            if weight == UNREACHABLE_WEIGHT {
                continue;
            }

            if best.map_or(true, |(best_weight, _)| weight > best_weight) {
                best = Some((weight, position));
            }
        }

        best.map(|(_, position)| position)
    }

    fn index(&self, position: Position) -> Option<usize> {
        let row = u32::try_from(position.row()).ok()?;
        let column = u32::try_from(position.column()).ok()?;
        if row >= self.height || column >= self.width {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn classify(marker: char) -> CellKind {
    match marker {
        WALL_MARKER => CellKind::Wall,
        FINISH_MARKER => CellKind::Finish,
        _ => CellKind::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_skips_blank_lines_and_trims_rows() {
        let track = Track::load(["  XXX  ", "", "XTF", "   ", "XXX"]).expect("valid track");

        assert_eq!(track.height(), 3);
        assert_eq!(track.width(), 3);
        assert!(track.is_finish(Position::new(1, 2)));
        assert_eq!(track.weight_at(1, 1), 1);
    }

    #[test]
    fn load_rejects_empty_sources() {
        assert!(matches!(
            Track::load(Vec::<String>::new()),
            Err(FormatError::Empty)
        ));
        assert!(matches!(Track::load(["", "  "]), Err(FormatError::Empty)));
    }

    #[test]
    fn load_rejects_ragged_rows() {
        let err = Track::load(["XXXX", "XTF", "XXXX"]).expect_err("ragged");
        match err {
            FormatError::RaggedRow {
                row,
                expected,
                found,
            } => {
                assert_eq!((row, expected, found), (1, 4, 3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_markers_are_open_track() {
        let track = Track::load(["X.F"]).expect("valid track");
        assert_eq!(track.cell(Position::new(0, 1)), Some(CellKind::Open));
        assert_eq!(track.display_char(Position::new(0, 1)), Some('.'));
        assert_eq!(track.weight_at(0, 1), 1);
        assert_eq!(
            track.find_highest_weight_open_cell(&HashSet::new()),
            Some(Position::new(0, 1))
        );
    }

    #[test]
    fn missing_file_falls_back_to_default_layout() {
        let (track, err) = Track::load_or_default("definitely/not/a/track.txt");
        assert!(matches!(err, Some(FormatError::Unreadable { .. })));
        assert_eq!(track, Track::default_layout());
    }

    #[test]
    fn bounds_and_walls() {
        let track = Track::default_layout();
        assert!(track.is_out_of_bounds(Position::new(-1, 3)));
        assert!(track.is_out_of_bounds(Position::new(3, 10)));
        assert!(track.is_wall(Position::new(-1, 3)));
        assert!(track.is_wall(Position::new(0, 0)));
        assert!(!track.is_wall(Position::new(1, 1)));
        assert!(!track.is_finish(Position::new(40, 40)));
        assert_eq!(track.cell(Position::new(40, 40)), None);
    }

    #[test]
    fn default_layout_has_two_finish_cells() {
        let track = Track::default_layout();
        assert_eq!(
            track.finish_cells(),
            vec![Position::new(1, 8), Position::new(7, 8)]
        );
        assert_eq!(track.weight_at(1, 8), 0);
        assert_eq!(track.weight_at(0, 0), UNREACHABLE_WEIGHT);
    }

    #[test]
    fn weight_field_matches_the_grid_and_settles_quickly() {
        let row = format!("F{}", "T".repeat(29));
        let track = Track::load(vec![row; 30]).expect("valid track");
        let field = track.weights();

        assert_eq!((field.width(), field.height()), (30, 30));
        assert_eq!(field.cells().len(), 900);
        assert_eq!(track.weight_at(29, 29), 29);
        assert!(field.relaxation_passes() <= field.width() + field.height() + 1);
    }

    #[test]
    fn display_hides_track_marker() {
        let track = Track::default_layout();
        assert_eq!(track.display_char(Position::new(0, 0)), Some('X'));
        assert_eq!(track.display_char(Position::new(1, 1)), Some(' '));
        assert_eq!(track.display_char(Position::new(1, 8)), Some('F'));
        assert_eq!(track.display_char(Position::new(10, 0)), None);
    }

    #[test]
    fn highest_weight_cells_are_handed_out_in_descending_order() {
        let track = Track::default_layout();
        let mut used = HashSet::new();

        let first = track.find_highest_weight_open_cell(&used).expect("start");
        assert_eq!(first, Position::new(1, 1));
        assert_eq!(track.weight(first), 7);
        let _ = used.insert(first);

        let second = track.find_highest_weight_open_cell(&used).expect("start");
        assert_eq!(second, Position::new(2, 1));
        assert!(track.weight(second) <= track.weight(first));
    }

    #[test]
    fn highest_weight_cell_is_none_when_everything_is_used() {
        let track = Track::load(["XTF"]).expect("valid track");
        let used: HashSet<Position> = [Position::new(0, 1)].into_iter().collect();
        assert_eq!(track.find_highest_weight_open_cell(&used), None);
    }
}
