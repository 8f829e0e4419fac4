//! Straight-line rasterization across the track grid.

use crate::Position;

/// Produces the ordered cells visited when travelling from `start` to `end`.
///
/// The walk uses integer Bresenham stepping: the error accumulator starts at
/// `|Δrow| - |Δcol|` and every step advances the row, the column, or both, so
/// consecutive cells are always 8-connected. The first element is `start` and
/// the last is `end`. Identical coordinates yield a single-cell path.
#[must_use]
pub fn rasterize(start: Position, end: Position) -> Vec<Position> {
    let row_span = end.row().abs_diff(start.row());
    let column_span = end.column().abs_diff(start.column());
    let row_step = if start.row() < end.row() { 1 } else { -1 };
    let column_step = if start.column() < end.column() { 1 } else { -1 };

    let row_span = i64::from(row_span);
    let column_span = i64::from(column_span);
    let capacity = usize::try_from(row_span.max(column_span) + 1).unwrap_or(1);
    let mut path = Vec::with_capacity(capacity);

    let mut error = row_span - column_span;
    let mut current = start;

    loop {
        path.push(current);
        if current == end {
            break;
        }

        let doubled = error * 2;
        let mut row = current.row();
        let mut column = current.column();
        if doubled > -column_span {
            error -= column_span;
            row += row_step;
        }
        if doubled < row_span {
            error += row_span;
            column += column_step;
        }
        current = Position::new(row, column);
    }

    path
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;

    fn small(value: i8) -> i32 {
        i32::from(value % 24)
    }

    quickcheck! {
        fn path_spans_start_to_end(r0: i8, c0: i8, r1: i8, c1: i8) -> bool {
            let start = Position::new(small(r0), small(c0));
            let end = Position::new(small(r1), small(c1));
            let path = rasterize(start, end);
            path.first() == Some(&start) && path.last() == Some(&end)
        }

        fn path_is_eight_connected(r0: i8, c0: i8, r1: i8, c1: i8) -> bool {
            let start = Position::new(small(r0), small(c0));
            let end = Position::new(small(r1), small(c1));
            rasterize(start, end).windows(2).all(|pair| {
                let (row_delta, column_delta) = pair[0].delta_to(pair[1]);
                row_delta.abs() <= 1 && column_delta.abs() <= 1 && (row_delta, column_delta) != (0, 0)
            })
        }

        fn swapped_endpoints_mirror_the_steps(r0: i8, c0: i8, r1: i8, c1: i8) -> bool {
            let a = Position::new(small(r0), small(c0));
            let b = Position::new(small(r1), small(c1));
            let forward = rasterize(a, b);
            let backward = rasterize(b, a);
            forward.len() == backward.len()
                && forward.iter().zip(&backward).all(|(f, r)| {
                    let (fr, fc) = a.delta_to(*f);
                    let (rr, rc) = b.delta_to(*r);
                    fr == -rr && fc == -rc
                })
        }
    }

    #[test]
    fn single_cell_path_for_identical_endpoints() {
        let cell = Position::new(4, 4);
        assert_eq!(rasterize(cell, cell), vec![cell]);
    }

    #[test]
    fn horizontal_path_visits_every_column() {
        let path = rasterize(Position::new(2, 1), Position::new(2, 5));
        let columns: Vec<i32> = path.iter().map(|cell| cell.column()).collect();
        assert_eq!(columns, vec![1, 2, 3, 4, 5]);
        assert!(path.iter().all(|cell| cell.row() == 2));
    }

    #[test]
    fn diagonal_path_steps_both_axes() {
        let path = rasterize(Position::new(8, 1), Position::new(5, 4));
        assert_eq!(
            path,
            vec![
                Position::new(8, 1),
                Position::new(7, 2),
                Position::new(6, 3),
                Position::new(5, 4),
            ]
        );
    }

    #[test]
    fn shallow_path_advances_column_first_on_ties() {
        let path = rasterize(Position::new(0, 0), Position::new(1, 2));
        assert_eq!(
            path,
            vec![Position::new(0, 0), Position::new(0, 1), Position::new(1, 2)]
        );
    }

    #[test]
    fn path_may_leave_the_grid() {
        let path = rasterize(Position::new(1, 1), Position::new(-2, 1));
        assert_eq!(path.last(), Some(&Position::new(-2, 1)));
        assert_eq!(path.len(), 4);
    }
}
