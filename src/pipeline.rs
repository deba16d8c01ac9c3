// THEORY:
// The `pipeline` module is the top-level, synchronous API for the edge engine.
// It strings the core stages together in their fixed order
//
//     luminance -> pad (once) -> convolve X -> convolve Y -> combine + normalize
//
// and owns the long-lived resources those stages need: the worker pool and the
// pair of axis kernels. Building an `EdgePipeline` is the only place a thread
// pool is created; every subsequent `detect` call reuses it.
//
// Padding happens once per run and is shared by both axis passes, since padding
// only depends on the kernel's half-extents and both kernels of an operator have
// the same shape.

use crate::core_modules::convolution::Convolver;
use crate::core_modules::error::Result;
use crate::core_modules::gradient;
use crate::core_modules::grid::grid::Grid;
use crate::core_modules::kernel::kernel::{Kernel, Operator};
use crate::core_modules::marshal;
use crate::core_modules::padding::PaddedGrid;
use image::{DynamicImage, GrayImage};
use log::debug;
use std::path::Path;
use std::time::{Duration, Instant};

/// How the row work is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded, row-major.
    Sequential,
    /// Row-partitioned across `EdgeConfig::workers` threads.
    #[default]
    Parallel,
}

/// Configuration for the edge pipelines.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Worker threads for the parallel mode. Clamped to at least one, and per
    /// convolution to at most the image height.
    pub workers: usize,
    pub mode: ProcessingMode,
    pub operator: Operator,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            mode: ProcessingMode::default(),
            operator: Operator::default(),
        }
    }
}

impl EdgeConfig {
    pub fn sequential() -> Self {
        Self {
            mode: ProcessingMode::Sequential,
            ..Self::default()
        }
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub(crate) fn build_convolver(&self) -> Result<Convolver> {
        match self.mode {
            ProcessingMode::Sequential => Ok(Convolver::sequential()),
            ProcessingMode::Parallel => Convolver::parallel(self.workers),
        }
    }
}

/// Wall-clock time spent in each stage of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub pad: Duration,
    pub convolve_x: Duration,
    pub convolve_y: Duration,
    pub combine: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.pad + self.convolve_x + self.convolve_y + self.combine
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub gradient_x: Grid,
    pub gradient_y: Grid,
    /// Gradient magnitude normalized into `[0, 255]`.
    pub edges: Grid,
    pub timings: StageTimings,
}

impl EdgeMap {
    pub fn into_edges(self) -> Grid {
        self.edges
    }

    /// Quantizes the normalized edges into an 8-bit image.
    pub fn to_image(&self) -> Result<GrayImage> {
        marshal::quantize(&self.edges)
    }
}

/// Synchronous edge detector.
#[derive(Debug)]
pub struct EdgePipeline {
    config: EdgeConfig,
    convolver: Convolver,
    kernel_x: Kernel,
    kernel_y: Kernel,
}

impl EdgePipeline {
    pub fn new(config: EdgeConfig) -> Result<Self> {
        let convolver = config.build_convolver()?;
        let (kernel_x, kernel_y) = config.operator.kernels();
        Ok(Self {
            config,
            convolver,
            kernel_x,
            kernel_y,
        })
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Runs both axis passes and the combiner over a luminance grid.
    pub fn detect(&self, luminance: &Grid) -> Result<EdgeMap> {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let padded = PaddedGrid::for_kernel(luminance, &self.kernel_x)?;
        timings.pad = started.elapsed();

        let started = Instant::now();
        let gradient_x = self.convolver.convolve_padded(&padded, &self.kernel_x)?;
        timings.convolve_x = started.elapsed();

        let started = Instant::now();
        let gradient_y = self.convolver.convolve_padded(&padded, &self.kernel_y)?;
        timings.convolve_y = started.elapsed();

        let started = Instant::now();
        let edges = gradient::combine_and_normalize(&gradient_x, &gradient_y)?;
        timings.combine = started.elapsed();

        debug!("edge detection on {:?} finished: {timings:?}", luminance.shape());

        Ok(EdgeMap {
            gradient_x,
            gradient_y,
            edges,
            timings,
        })
    }

    fn luminance(&self, image: &DynamicImage) -> Result<Grid> {
        match self.convolver.pool() {
            Some(pool) => marshal::luminance_parallel(image, pool),
            None => marshal::luminance(image),
        }
    }

    fn quantize(&self, edges: &Grid) -> Result<GrayImage> {
        match self.convolver.pool() {
            Some(pool) => marshal::quantize_parallel(edges, pool),
            None => marshal::quantize(edges),
        }
    }

    /// Luminance extraction, detection and quantization for a decoded image.
    pub fn detect_image(&self, image: &DynamicImage) -> Result<GrayImage> {
        let luminance = self.luminance(image)?;
        self.quantize(&self.detect(&luminance)?.edges)
    }

    /// Reads `input`, detects edges and writes the 8-bit edge map to `output`.
    pub fn detect_file(&self, input: &Path, output: &Path) -> Result<EdgeMap> {
        let image = marshal::open(input)?;
        let edge_map = self.detect(&self.luminance(&image)?)?;
        marshal::encode(&self.quantize(&edge_map.edges)?, output)?;
        Ok(edge_map)
    }
}
