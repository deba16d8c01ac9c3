// THEORY:
// Kernel convolution is the heart of the engine. Given a zero-padded grid `P`
// and a kernel `K` of size `kH × kW`, every result cell is
//
//     R(i, j) = Σ_{a < kH, b < kW} P(i + a, j + b) · K(a, b)
//
// i.e. cross-correlation (the kernel is not flipped), accumulated in `f64` with
// no clamping. Results may be negative or exceed 1.0.
//
// Key architectural principles:
// 1.  **One Cell Function**: Both strategies evaluate cells through
//     `correlate_row`, which performs the same floating-point operations in the
//     same order. Partitioning only changes which thread evaluates a row, so
//     sequential and parallel results are bit-identical.
// 2.  **Disjoint Writes**: The parallel strategy never shares the result buffer.
//     It is cut into `RowBand`s (see `partition`), each handed to exactly one
//     worker. The padded source and the kernel are shared read-only.
// 3.  **Fail Before Work**: A kernel whose half-extents disagree with the
//     padding is rejected before the result grid is even allocated.

use crate::core_modules::error::Result;
use crate::core_modules::grid::grid::Grid;
use crate::core_modules::kernel::kernel::Kernel;
use crate::core_modules::padding::PaddedGrid;
use crate::core_modules::worker_pool::WorkerPool;
use log::debug;

/// How a convolution is executed.
#[derive(Debug)]
pub enum Convolver {
    /// Row-major, on the calling thread.
    Sequential,
    /// Row-partitioned across the pool's workers.
    Parallel(WorkerPool),
}

impl Convolver {
    pub fn sequential() -> Self {
        Convolver::Sequential
    }

    pub fn parallel(workers: usize) -> Result<Self> {
        Ok(Convolver::Parallel(WorkerPool::new(workers)?))
    }

    /// The pool backing a parallel convolver.
    pub fn pool(&self) -> Option<&WorkerPool> {
        match self {
            Convolver::Sequential => None,
            Convolver::Parallel(pool) => Some(pool),
        }
    }

    /// Pads `grid` for `kernel` and convolves.
    pub fn convolve(&self, grid: &Grid, kernel: &Kernel) -> Result<Grid> {
        let padded = PaddedGrid::for_kernel(grid, kernel)?;
        self.convolve_padded(&padded, kernel)
    }

    /// Convolves an already padded grid. The padding must match `kernel`.
    pub fn convolve_padded(&self, padded: &PaddedGrid, kernel: &Kernel) -> Result<Grid> {
        match self {
            Convolver::Sequential => convolve_padded_sequential(padded, kernel),
            Convolver::Parallel(pool) => convolve_padded_parallel(padded, kernel, pool),
        }
    }
}

/// Sequential convolution of an unpadded grid.
pub fn convolve_sequential(grid: &Grid, kernel: &Kernel) -> Result<Grid> {
    let padded = PaddedGrid::for_kernel(grid, kernel)?;
    convolve_padded_sequential(&padded, kernel)
}

/// Row-parallel convolution of an unpadded grid on `pool`.
pub fn convolve_parallel(grid: &Grid, kernel: &Kernel, pool: &WorkerPool) -> Result<Grid> {
    let padded = PaddedGrid::for_kernel(grid, kernel)?;
    convolve_padded_parallel(&padded, kernel, pool)
}

pub fn convolve_padded_sequential(padded: &PaddedGrid, kernel: &Kernel) -> Result<Grid> {
    padded.check_kernel(kernel)?;
    let (height, width) = padded.inner_shape();
    let mut result = Grid::new(height, width)?;

    let source = padded.as_grid();
    for row in 0..height {
        correlate_row(source, kernel, row, result.row_mut(row));
    }
    Ok(result)
}

pub fn convolve_padded_parallel(
    padded: &PaddedGrid,
    kernel: &Kernel,
    pool: &WorkerPool,
) -> Result<Grid> {
    padded.check_kernel(kernel)?;
    let (height, width) = padded.inner_shape();
    let mut result = Grid::new(height, width)?;

    debug!(
        "convolving {height}x{width} with a {}x{} kernel on {} workers",
        kernel.height(),
        kernel.width(),
        pool.workers().min(height)
    );

    let source = padded.as_grid();
    pool.run_bands(&mut result, |mut band| {
        for (row, cells) in band.rows_mut() {
            correlate_row(source, kernel, row, cells);
        }
    });
    Ok(result)
}

/// Writes result row `row` into `out`. `source` is the padded grid, so the
/// kernel window for output `(row, col)` starts at padded `(row, col)`.
#[inline]
fn correlate_row(source: &Grid, kernel: &Kernel, row: usize, out: &mut [f64]) {
    let k_width = kernel.width();
    for (col, cell) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for a in 0..kernel.height() {
            let window = &source.row(row + a)[col..col + k_width];
            for (&sample, &weight) in window.iter().zip(kernel.row(a)) {
                sum += sample * weight;
            }
        }
        *cell = sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::kernel::kernel::Operator;

    /// Deterministic, irregular test data without pulling in an RNG.
    fn scrambled(height: usize, width: usize, seed: u64) -> Grid {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let data = (0..height * width)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 11) as f64 / (1u64 << 53) as f64
            })
            .collect();
        Grid::from_vec(height, width, data).unwrap()
    }

    #[test]
    fn parallel_matches_sequential_bit_for_bit() {
        let kernels = [
            Kernel::sobel_x(),
            Kernel::sobel_y(),
            Kernel::scharr_x(),
            Kernel::from_rows(&[[0.1, -0.7, 0.3, 0.25, -1.5]]).unwrap(),
            Kernel::new(5, 3, (0..15).map(|v| v as f64 * 0.37 - 2.0).collect()).unwrap(),
        ];

        for (height, width) in [(1, 1), (1, 9), (7, 1), (9, 13), (16, 5)] {
            let grid = scrambled(height, width, (height * 31 + width) as u64);
            for kernel in &kernels {
                let expected = convolve_sequential(&grid, kernel).unwrap();
                for workers in 1..=height + 5 {
                    let pool = WorkerPool::new(workers).unwrap();
                    let actual = convolve_parallel(&grid, kernel, &pool).unwrap();
                    let same_bits = expected
                        .as_slice()
                        .iter()
                        .zip(actual.as_slice())
                        .all(|(a, b)| a.to_bits() == b.to_bits());
                    assert!(same_bits, "{height}x{width}, {workers} workers");
                }
            }
        }
    }

    #[test]
    fn impulse_golden_fixture() {
        let impulse =
            Grid::from_rows(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]).unwrap();

        let gx = convolve_sequential(&impulse, &Kernel::sobel_x()).unwrap();
        let gy = convolve_sequential(&impulse, &Kernel::sobel_y()).unwrap();

        // An impulse at (1, 1) gives R(i, j) = K(2 - i, 2 - j): the kernel
        // rotated by 180 degrees.
        let expected_x =
            Grid::from_rows(&[[1.0, 0.0, -1.0], [2.0, 0.0, -2.0], [1.0, 0.0, -1.0]]).unwrap();
        let expected_y =
            Grid::from_rows(&[[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]]).unwrap();

        assert_eq!(gx[(1, 1)], 0.0);
        assert_eq!(gy[(1, 1)], 0.0);
        assert_eq!(gx, expected_x);
        assert_eq!(gy, expected_y);
    }

    #[test]
    fn uniform_input_has_zero_interior_gradient() {
        let grid = Grid::filled(6, 8, 0.75).unwrap();
        for op in [Operator::Sobel, Operator::Scharr] {
            let (kx, ky) = op.kernels();
            for kernel in [kx, ky] {
                let out = convolve_sequential(&grid, &kernel).unwrap();
                for i in 1..5 {
                    for j in 1..7 {
                        assert_eq!(out[(i, j)], 0.0, "{op:?} at ({i}, {j})");
                    }
                }
                // The zero border makes the frame non-zero.
                assert_ne!(out[(0, 0)], 0.0);
            }
        }
    }

    #[test]
    fn unit_kernel_is_identity() {
        let grid = scrambled(4, 6, 9);
        let unit = Kernel::new(1, 1, vec![1.0]).unwrap();
        assert_eq!(convolve_sequential(&grid, &unit).unwrap(), grid);
    }

    #[test]
    fn one_padding_serves_both_axes() {
        let grid = scrambled(5, 7, 3);
        let padded = PaddedGrid::for_kernel(&grid, &Kernel::sobel_x()).unwrap();
        let convolver = Convolver::parallel(3).unwrap();

        let gy_shared = convolver.convolve_padded(&padded, &Kernel::sobel_y()).unwrap();
        let gy_fresh = convolver.convolve(&grid, &Kernel::sobel_y()).unwrap();
        assert_eq!(gy_shared, gy_fresh);
    }

    #[test]
    fn mismatched_padding_fails_fast() {
        let grid = scrambled(3, 3, 1);
        let padded = PaddedGrid::new(&grid, 0, 0).unwrap();
        let pool = WorkerPool::new(2).unwrap();
        assert!(convolve_padded_sequential(&padded, &Kernel::sobel_x()).is_err());
        assert!(convolve_padded_parallel(&padded, &Kernel::sobel_x(), &pool).is_err());
    }
}
