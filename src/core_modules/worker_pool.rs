// THEORY:
// The `WorkerPool` owns a fixed set of OS threads and knows how to run one job
// per row band. It does not know what the job computes: the
// convolution, the parallel luminance extraction and the ownership
// instrumentation in the tests all go through the same `run_bands` entry point.
//
// Key architectural principles:
// 1.  **Fixed Size**: The pool is built with exactly `workers` threads, and
//     `run_bands` partitions the target into (at most) that many bands. The
//     worker count is decided once, at construction.
// 2.  **Join Is the Barrier**: Every band is spawned into a single rayon scope.
//     The scope does not return until every job has finished, so by the time
//     `run_bands` returns the target grid is complete. There is no result
//     channel and nothing is copied back.
// 3.  **Borrowed Inputs**: Because the scope outlives none of its borrows, jobs
//     can read the caller's padded grid and kernel by plain reference.

use crate::core_modules::error::Result;
use crate::core_modules::grid::grid::Grid;
use crate::core_modules::partition::{RowBand, partition_rows, split_rows};
use log::trace;

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Builds a pool with `workers` threads. Zero is treated as one.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("sobel-worker-{index}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// A pool sized to the host's logical CPU count.
    pub fn with_available_parallelism() -> Result<Self> {
        Self::new(num_cpus::get())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Partitions `target` into row bands and runs `job` once per band, each on
    /// its own pool task. Returns after every job has completed.
    pub fn run_bands<F>(&self, target: &mut Grid, job: F)
    where
        F: Fn(RowBand<'_>) + Sync,
    {
        let (height, width) = target.shape();
        self.run_row_bands(target.as_mut_slice(), height, width, job);
    }

    /// [`run_bands`](Self::run_bands) over any row-major buffer of
    /// `height × width` cells.
    pub fn run_row_bands<T, F>(&self, cells: &mut [T], height: usize, width: usize, job: F)
    where
        T: Send,
        F: Fn(RowBand<'_, T>) + Sync,
    {
        let ranges = partition_rows(height, self.workers);
        let bands = split_rows(cells, width, &ranges);
        let job = &job;

        self.pool.scope(move |scope| {
            for band in bands {
                trace!(
                    "dispatching rows {:?} to worker {}",
                    band.range().rows(),
                    band.worker()
                );
                scope.spawn(move |_| job(band));
            }
        });
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish()
    }
}
