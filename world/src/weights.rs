//! Static distance-to-finish field used as the steering heuristic.

use racetrack_core::CellKind;

/// Weight carried by walls and by cells no finish can reach.
pub const UNREACHABLE_WEIGHT: u32 = u32::MAX;

/// Dense 8-neighbor hop-count grid seeded from the finish cells.
///
/// Finish cells weigh zero, walls stay at [`UNREACHABLE_WEIGHT`], and every
/// other cell holds the fewest king-move hops to the nearest finish. The field
/// is computed once when the track loads and never changes afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeightField {
    width: u32,
    height: u32,
    weights: Vec<u32>,
    passes: u32,
}

impl WeightField {
    /// Computes the field by full-grid relaxation until a pass changes nothing.
    ///
    /// Each pass lowers a non-wall cell to `min(own, neighbor + 1)` over its
    /// in-bounds neighbors, updating in place in row-major order. Weights only
    /// ever decrease and are bounded below by zero, so the loop reaches a fixed
    /// point without an iteration cap. Walls never improve, which keeps them
    /// from acting as stepping stones.
    pub(crate) fn compute(width: u32, height: u32, kinds: &[CellKind]) -> Self {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        if cell_count == 0 || kinds.len() != cell_count {
            return Self {
                width,
                height,
                weights: Vec::new(),
                passes: 0,
            };
        }

        let mut weights: Vec<u32> = kinds
            .iter()
            .map(|kind| match kind {
                CellKind::Finish => 0,
                CellKind::Open | CellKind::Wall => UNREACHABLE_WEIGHT,
            })
            .collect();

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;

            for row in 0..height_usize {
                for column in 0..width_usize {
                    let index = row * width_usize + column;
                    if kinds[index] == CellKind::Wall {
                        continue;
                    }

                    let current = weights[index];
                    let best = neighbors(row, column, width_usize, height_usize)
                        .map(|neighbor| weights[neighbor].saturating_add(1))
                        .fold(current, u32::min);

                    if best < current {
                        weights[index] = best;
                        changed = true;
                    }
                }
            }
        }

        Self {
            width,
            height,
            weights,
            passes,
        }
    }

    /// Width of the field in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dense weights stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[u32] {
        &self.weights
    }

    /// Number of full passes the relaxation needed, including the final
    /// pass that observed no change.
    #[must_use]
    pub fn relaxation_passes(&self) -> u32 {
        self.passes
    }

    pub(crate) fn get(&self, index: usize) -> u32 {
        self.weights
            .get(index)
            .copied()
            .unwrap_or(UNREACHABLE_WEIGHT)
    }
}

fn neighbors(
    row: usize,
    column: usize,
    width: usize,
    height: usize,
) -> impl Iterator<Item = usize> {
    let rows = row.saturating_sub(1)..=(row + 1).min(height - 1);
    rows.flat_map(move |r| {
        let columns = column.saturating_sub(1)..=(column + 1).min(width - 1);
        columns
            .filter(move |&c| (r, c) != (row, column))
            .map(move |c| r * width + c)
    })
}
