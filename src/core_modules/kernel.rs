// THEORY:
// A `Kernel` is a small, immutable matrix of signed weights. It is built once,
// validated once, and then only ever read: every row worker of a parallel
// convolution borrows the same kernel at the same time without any locking.
//
// The fixed gradient operators are exposed as constants and constructors rather
// than as process-wide mutable state, so the convolution always receives its
// kernel as an explicit argument.

pub mod kernel {
    use crate::core_modules::error::{EdgeError, Result};

    pub type Kernel3 = [[f64; 3]; 3];

    pub const SOBEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    pub const SOBEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

    pub const SCHARR_X: Kernel3 = [[-3.0, 0.0, 3.0], [-10.0, 0.0, 10.0], [-3.0, 0.0, 3.0]];
    pub const SCHARR_Y: Kernel3 = [[-3.0, -10.0, -3.0], [0.0, 0.0, 0.0], [3.0, 10.0, 3.0]];

    /// An odd-dimensioned, row-major weight matrix.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Kernel {
        height: usize,
        width: usize,
        weights: Vec<f64>,
    }

    impl Kernel {
        /// Validates and wraps a row-major weight buffer. Both dimensions must be
        /// odd (and therefore non-zero).
        pub fn new(height: usize, width: usize, weights: Vec<f64>) -> Result<Self> {
            if height % 2 == 0 || width % 2 == 0 {
                return Err(EdgeError::InvalidDimensions {
                    subject: "kernel",
                    height,
                    width,
                });
            }
            let expected = height
                .checked_mul(width)
                .ok_or(EdgeError::InvalidDimensions {
                    subject: "kernel",
                    height,
                    width,
                })?;
            if weights.len() != expected {
                return Err(EdgeError::BufferLength {
                    expected,
                    actual: weights.len(),
                });
            }
            Ok(Self {
                height,
                width,
                weights,
            })
        }

        pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
            let height = rows.len();
            let width = rows.first().map_or(0, |row| row.as_ref().len());
            let mut weights = Vec::with_capacity(height * width);
            for (row, samples) in rows.iter().enumerate() {
                let samples = samples.as_ref();
                if samples.len() != width {
                    return Err(EdgeError::RaggedRows {
                        row,
                        expected: width,
                        actual: samples.len(),
                    });
                }
                weights.extend_from_slice(samples);
            }
            Self::new(height, width, weights)
        }

        fn from_fixed(rows: Kernel3) -> Self {
            Self {
                height: 3,
                width: 3,
                weights: rows.iter().flatten().copied().collect(),
            }
        }

        /// Horizontal Sobel derivative.
        pub fn sobel_x() -> Self {
            Self::from_fixed(SOBEL_X)
        }

        /// Vertical Sobel derivative.
        pub fn sobel_y() -> Self {
            Self::from_fixed(SOBEL_Y)
        }

        pub fn scharr_x() -> Self {
            Self::from_fixed(SCHARR_X)
        }

        pub fn scharr_y() -> Self {
            Self::from_fixed(SCHARR_Y)
        }

        pub fn height(&self) -> usize {
            self.height
        }

        pub fn width(&self) -> usize {
            self.width
        }

        /// `(height / 2, width / 2)`: how far the kernel reaches past its centre.
        pub fn half_extents(&self) -> (usize, usize) {
            (self.height / 2, self.width / 2)
        }

        pub fn weight(&self, row: usize, col: usize) -> f64 {
            self.weights[row * self.width + col]
        }

        pub fn row(&self, row: usize) -> &[f64] {
            let start = row * self.width;
            &self.weights[start..start + self.width]
        }

        pub fn weight_sum(&self) -> f64 {
            self.weights.iter().sum()
        }
    }

    /// The gradient operator used for the two axis passes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum Operator {
        #[default]
        Sobel,
        /// Better rotational symmetry than Sobel at the same cost.
        Scharr,
    }

    impl Operator {
        /// `(x kernel, y kernel)`
        pub fn kernels(self) -> (Kernel, Kernel) {
            match self {
                Operator::Sobel => (Kernel::sobel_x(), Kernel::sobel_y()),
                Operator::Scharr => (Kernel::scharr_x(), Kernel::scharr_y()),
            }
        }
    }
}
