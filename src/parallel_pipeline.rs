// THEORY:
// The `ParallelEdgePipeline` is the async face of the engine, for callers that
// already live on a tokio runtime. It adds a second level of concurrency on top
// of the row partitioning: the X and Y convolutions do not depend on each other,
// so they run at the same time on two blocking tasks.
//
// Key architectural principles:
// 1.  **Blocking Work Off the Reactor**: Every CPU-bound stage (decode,
//     luminance, both convolutions, combine, quantize, encode) runs under
//     `spawn_blocking`. Only file reads and the joins happen on async threads.
// 2.  **Shared, Immutable Inputs**: The padded grid, the kernels and the
//     convolver (with its worker pool) are wrapped in `Arc`s and cloned into the
//     two axis tasks. Nothing they share is ever mutated.
// 3.  **Two Independent Outputs**: Each axis task allocates and returns its own
//     gradient grid, so the concurrent passes never touch the same buffer.

use crate::core_modules::convolution::Convolver;
use crate::core_modules::error::Result;
use crate::core_modules::gradient;
use crate::core_modules::grid::grid::Grid;
use crate::core_modules::kernel::kernel::Kernel;
use crate::core_modules::marshal;
use crate::core_modules::padding::PaddedGrid;
use crate::pipeline::{EdgeConfig, EdgeMap, StageTimings};
use futures::future::try_join;
use image::{DynamicImage, GrayImage};
use log::debug;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

pub struct ParallelEdgePipeline {
    config: EdgeConfig,
    convolver: Arc<Convolver>,
    kernel_x: Arc<Kernel>,
    kernel_y: Arc<Kernel>,
}

impl ParallelEdgePipeline {
    pub fn new(config: EdgeConfig) -> Result<Self> {
        let convolver = Arc::new(config.build_convolver()?);
        let (kernel_x, kernel_y) = config.operator.kernels();
        Ok(Self {
            config,
            convolver,
            kernel_x: Arc::new(kernel_x),
            kernel_y: Arc::new(kernel_y),
        })
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    fn spawn_axis(
        &self,
        padded: Arc<PaddedGrid>,
        kernel: Arc<Kernel>,
    ) -> task::JoinHandle<Result<(Grid, Duration)>> {
        let convolver = Arc::clone(&self.convolver);
        task::spawn_blocking(move || {
            let started = Instant::now();
            let gradient = convolver.convolve_padded(&padded, &kernel)?;
            Ok((gradient, started.elapsed()))
        })
    }

    /// Detects edges in a luminance grid, running both axis passes concurrently.
    pub async fn detect(&self, luminance: Grid) -> Result<EdgeMap> {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let kernel_x = Arc::clone(&self.kernel_x);
        let padded = task::spawn_blocking(move || PaddedGrid::for_kernel(&luminance, &kernel_x))
            .await??;
        let padded = Arc::new(padded);
        timings.pad = started.elapsed();

        let x_pass = self.spawn_axis(Arc::clone(&padded), Arc::clone(&self.kernel_x));
        let y_pass = self.spawn_axis(Arc::clone(&padded), Arc::clone(&self.kernel_y));
        let (x_result, y_result) = try_join(x_pass, y_pass).await?;
        let (gradient_x, x_elapsed) = x_result?;
        let (gradient_y, y_elapsed) = y_result?;
        timings.convolve_x = x_elapsed;
        timings.convolve_y = y_elapsed;

        let started = Instant::now();
        let (gradient_x, gradient_y, edges) = task::spawn_blocking(move || {
            gradient::combine_and_normalize(&gradient_x, &gradient_y)
                .map(|edges| (gradient_x, gradient_y, edges))
        })
        .await??;
        timings.combine = started.elapsed();

        debug!("async edge detection on {:?} finished: {timings:?}", edges.shape());

        Ok(EdgeMap {
            gradient_x,
            gradient_y,
            edges,
            timings,
        })
    }

    async fn luminance_of(&self, image: Arc<DynamicImage>) -> Result<Grid> {
        let convolver = Arc::clone(&self.convolver);
        task::spawn_blocking(move || match convolver.pool() {
            Some(pool) => marshal::luminance_parallel(&image, pool),
            None => marshal::luminance(&image),
        })
        .await?
    }

    async fn quantize_of(&self, edges: Arc<Grid>) -> Result<GrayImage> {
        let convolver = Arc::clone(&self.convolver);
        task::spawn_blocking(move || match convolver.pool() {
            Some(pool) => marshal::quantize_parallel(&edges, pool),
            None => marshal::quantize(&edges),
        })
        .await?
    }

    /// Luminance extraction, detection and quantization for a decoded image.
    pub async fn detect_image(&self, image: DynamicImage) -> Result<GrayImage> {
        let luminance = self.luminance_of(Arc::new(image)).await?;
        let edge_map = self.detect(luminance).await?;
        self.quantize_of(Arc::new(edge_map.into_edges())).await
    }

    /// Reads `input`, detects edges and writes the 8-bit edge map to `output`.
    pub async fn detect_file(&self, input: &Path, output: &Path) -> Result<EdgeMap> {
        let bytes = tokio::fs::read(input).await?;
        let image = task::spawn_blocking(move || marshal::decode(&bytes)).await??;
        debug!(
            "decoded {} ({}x{})",
            input.display(),
            image.width(),
            image.height()
        );

        let luminance = self.luminance_of(Arc::new(image)).await?;
        let edge_map = self.detect(luminance).await?;

        let edges = self.quantize_of(Arc::new(edge_map.edges.clone())).await?;
        let output = output.to_path_buf();
        task::spawn_blocking(move || marshal::encode(&edges, &output)).await??;
        Ok(edge_map)
    }
}
