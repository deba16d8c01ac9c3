// THEORY:
// This file is the entry point for the `sobel_vision` library crate.
//
// The public surface is the two pipelines (`EdgePipeline` for synchronous
// callers, `ParallelEdgePipeline` for code already running on tokio) and their
// configuration. The numeric building blocks in `core_modules` stay public so
// the grid, kernels, padding and convolution strategies can be used on their
// own, e.g. to convolve with a custom kernel or to benchmark one stage.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::convolution::Convolver;
pub use core_modules::error::{EdgeError, Result};
pub use core_modules::grid::grid::Grid;
pub use core_modules::kernel::kernel::{Kernel, Operator};
pub use core_modules::padding::PaddedGrid;
pub use core_modules::worker_pool::WorkerPool;
pub use parallel_pipeline::ParallelEdgePipeline;
pub use pipeline::{EdgeConfig, EdgeMap, EdgePipeline, ProcessingMode, StageTimings};
