pub mod convolution;
pub mod error;
pub mod gradient;
pub mod grid;
pub mod kernel;
pub mod marshal;
pub mod padding;
pub mod partition;
pub mod worker_pool;
