// THEORY:
// The `Grid` is the one data structure every other stage of the engine speaks.
// Luminance comes in as a grid, both gradient passes produce grids, and the
// combiner hands a grid to the quantizer. Keeping a single representation means
// no stage has to know how its neighbours store their samples.
//
// Key architectural principles:
// 1.  **Dense, Row-Major Storage**: All samples live in one flat `Vec<f64>`.
//     Row `r` occupies `data[r * width..(r + 1) * width]`. This is what makes
//     row partitioning cheap: a run of whole rows is a single contiguous slice.
// 2.  **Never Empty**: A grid always has at least one row and one column. Every
//     constructor checks this, so downstream code (padding math, partitioning,
//     min/max scans) never has to handle the empty case.
// 3.  **Owned, Not Shared**: A grid has exactly one owner. Stages take grids by
//     reference when they only read and return fresh grids for their results;
//     ownership moves at every stage boundary.

pub mod grid {
    use crate::core_modules::error::{EdgeError, Result};
    use std::ops::{Index, IndexMut};

    /// A dense `height × width` buffer of `f64` samples in row-major order.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Grid {
        height: usize,
        width: usize,
        data: Vec<f64>,
    }

    fn checked_len(subject: &'static str, height: usize, width: usize) -> Result<usize> {
        let invalid = EdgeError::InvalidDimensions {
            subject,
            height,
            width,
        };
        if height == 0 || width == 0 {
            return Err(invalid);
        }
        height.checked_mul(width).ok_or(invalid)
    }

    impl Grid {
        /// Creates a grid of zeros.
        pub fn new(height: usize, width: usize) -> Result<Self> {
            Self::filled(height, width, 0.0)
        }

        /// Creates a grid with every cell set to `value`.
        pub fn filled(height: usize, width: usize, value: f64) -> Result<Self> {
            let len = checked_len("grid", height, width)?;
            Ok(Self {
                height,
                width,
                data: vec![value; len],
            })
        }

        /// Wraps a row-major buffer. The buffer length must be `height * width`.
        pub fn from_vec(height: usize, width: usize, data: Vec<f64>) -> Result<Self> {
            let expected = checked_len("grid", height, width)?;
            if data.len() != expected {
                return Err(EdgeError::BufferLength {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self {
                height,
                width,
                data,
            })
        }

        /// Builds a grid from nested rows, rejecting ragged input.
        pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
            let height = rows.len();
            let width = rows.first().map_or(0, |row| row.as_ref().len());
            let len = checked_len("grid", height, width)?;

            let mut data = Vec::with_capacity(len);
            for (row, samples) in rows.iter().enumerate() {
                let samples = samples.as_ref();
                if samples.len() != width {
                    return Err(EdgeError::RaggedRows {
                        row,
                        expected: width,
                        actual: samples.len(),
                    });
                }
                data.extend_from_slice(samples);
            }

            Ok(Self {
                height,
                width,
                data,
            })
        }

        pub fn height(&self) -> usize {
            self.height
        }

        pub fn width(&self) -> usize {
            self.width
        }

        /// `(height, width)`
        pub fn shape(&self) -> (usize, usize) {
            (self.height, self.width)
        }

        pub fn len(&self) -> usize {
            self.data.len()
        }

        /// Always `false`; grids are never empty. Present for API symmetry with `len`.
        pub fn is_empty(&self) -> bool {
            self.data.is_empty()
        }

        pub fn get(&self, row: usize, col: usize) -> Option<f64> {
            if row >= self.height || col >= self.width {
                return None;
            }
            Some(self.data[row * self.width + col])
        }

        pub fn set(&mut self, row: usize, col: usize, value: f64) {
            self[(row, col)] = value;
        }

        pub fn row(&self, row: usize) -> &[f64] {
            let start = row * self.width;
            &self.data[start..start + self.width]
        }

        pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
            let start = row * self.width;
            &mut self.data[start..start + self.width]
        }

        pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
            self.data.chunks_exact(self.width)
        }

        pub fn as_slice(&self) -> &[f64] {
            &self.data
        }

        pub fn as_mut_slice(&mut self) -> &mut [f64] {
            &mut self.data
        }

        pub fn into_vec(self) -> Vec<f64> {
            self.data
        }

        /// Smallest and largest sample. NaN samples are ignored unless every
        /// sample is NaN.
        pub fn min_max(&self) -> (f64, f64) {
            let first = self.data[0];
            self.data[1..]
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        }

        /// Applies `f` to every sample, producing a grid of the same shape.
        pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Grid {
            Grid {
                height: self.height,
                width: self.width,
                data: self.data.iter().map(|&v| f(v)).collect(),
            }
        }

        pub fn same_shape(&self, other: &Grid) -> bool {
            self.shape() == other.shape()
        }
    }

    impl Index<(usize, usize)> for Grid {
        type Output = f64;

        fn index(&self, (row, col): (usize, usize)) -> &f64 {
            assert!(
                row < self.height && col < self.width,
                "grid index ({row}, {col}) out of bounds for {}x{}",
                self.height,
                self.width
            );
            &self.data[row * self.width + col]
        }
    }

    impl IndexMut<(usize, usize)> for Grid {
        fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
            assert!(
                row < self.height && col < self.width,
                "grid index ({row}, {col}) out of bounds for {}x{}",
                self.height,
                self.width
            );
            &mut self.data[row * self.width + col]
        }
    }
}
