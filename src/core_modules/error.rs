// Every failure the engine can report. Precondition violations (the first group)
// are raised before any partitioning or result allocation happens, so a caller
// never receives a partially written grid.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdgeError {
    /// A grid, kernel or image with a zero (or, for kernels, even) dimension.
    #[error("invalid dimensions for {subject}: {height}x{width}")]
    InvalidDimensions {
        subject: &'static str,
        height: usize,
        width: usize,
    },

    #[error("buffer length mismatch: expected {expected} samples, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    #[error("row {row} has {actual} samples, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The two gradient grids handed to the combiner disagree in shape.
    #[error("gradient shape mismatch: x is {x_height}x{x_width}, y is {y_height}x{y_width}")]
    ShapeMismatch {
        x_height: usize,
        x_width: usize,
        y_height: usize,
        y_width: usize,
    },

    #[error(
        "padding of {pad_height}x{pad_width} does not match a {kernel_height}x{kernel_width} kernel"
    )]
    PaddingMismatch {
        pad_height: usize,
        pad_width: usize,
        kernel_height: usize,
        kernel_width: usize,
    },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EdgeError>;
