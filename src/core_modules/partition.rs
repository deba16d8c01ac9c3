// THEORY:
// Row partitioning is what lets the convolution run on many workers without a
// single lock. The rows `[0, H)` of a result grid are cut into contiguous ranges,
// one per worker, and the result buffer itself is split along the same cut
// points into disjoint mutable slices (`RowBand`s). Each worker receives its band
// by value; it has no way to reach a cell outside it, so write-disjointness is a
// property of the types rather than of runtime discipline.
//
// Sizing rule: every range gets `H / N` rows (integer division) and the last
// range absorbs the remainder, so rows are never skipped or duplicated. The
// worker count is clamped into `1..=H` first, so there are no empty ranges.

use crate::core_modules::grid::grid::Grid;
use std::ops::Range;

/// A contiguous range of result rows owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub worker: usize,
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Worker count actually used for `height` rows when `requested` were asked for.
pub fn effective_workers(height: usize, requested: usize) -> usize {
    requested.min(height).max(1)
}

/// Splits `[0, height)` into contiguous, non-overlapping ranges.
pub fn partition_rows(height: usize, requested_workers: usize) -> Vec<RowRange> {
    let workers = effective_workers(height, requested_workers);
    let rows_per_worker = height / workers;

    (0..workers)
        .map(|worker| {
            let start = worker * rows_per_worker;
            let end = if worker == workers - 1 {
                height
            } else {
                start + rows_per_worker
            };
            RowRange { worker, start, end }
        })
        .collect()
}

/// One worker's exclusive view of its rows in a row-major buffer. Cells are
/// `f64` grid samples unless the buffer holds something else (e.g. gray bytes).
#[derive(Debug)]
pub struct RowBand<'a, T = f64> {
    range: RowRange,
    width: usize,
    cells: &'a mut [T],
}

impl<'a, T> RowBand<'a, T> {
    pub fn worker(&self) -> usize {
        self.range.worker
    }

    pub fn range(&self) -> RowRange {
        self.range
    }

    /// Row-major cells of this band only.
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut *self.cells
    }

    /// Yields `(global_row, cells_of_that_row)` for every row in the band.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut [T])> {
        let start = self.range.start;
        self.cells
            .chunks_exact_mut(self.width)
            .enumerate()
            .map(move |(offset, row)| (start + offset, row))
    }
}

/// Splits `grid`'s buffer into one `RowBand` per range.
///
/// `ranges` must be contiguous, in order and cover `[0, grid.height())`, which is
/// what `partition_rows` produces.
pub fn split_bands<'a>(grid: &'a mut Grid, ranges: &[RowRange]) -> Vec<RowBand<'a>> {
    let width = grid.width();
    split_rows(grid.as_mut_slice(), width, ranges)
}

/// Same as [`split_bands`] for any row-major buffer `width` cells wide.
pub fn split_rows<'a, T>(
    cells: &'a mut [T],
    width: usize,
    ranges: &[RowRange],
) -> Vec<RowBand<'a, T>> {
    debug_assert_eq!(ranges.first().map(|r| r.start), Some(0));
    debug_assert_eq!(ranges.last().map(|r| r.end * width), Some(cells.len()));

    let mut rest = cells;
    let mut bands = Vec::with_capacity(ranges.len());
    for &range in ranges {
        let (cells, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * width);
        bands.push(RowBand {
            range,
            width,
            cells,
        });
        rest = tail;
    }
    bands
}
