// Zero padding. The convolution never branches on borders: it reads a grid that
// has been extended by the kernel's half-extent on every side, with zeros in the
// extension. Because padding depends only on the half-extents, one padded grid
// serves both axis passes of a 3x3 operator.

use crate::core_modules::error::{EdgeError, Result};
use crate::core_modules::grid::grid::Grid;
use crate::core_modules::kernel::kernel::Kernel;

/// A zero-bordered copy of a source grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedGrid {
    grid: Grid,
    pad_height: usize,
    pad_width: usize,
    inner_height: usize,
    inner_width: usize,
}

impl PaddedGrid {
    /// Copies `source` into the centre of a `(H + 2·pad_height) × (W + 2·pad_width)`
    /// grid of zeros. `source` is left untouched.
    pub fn new(source: &Grid, pad_height: usize, pad_width: usize) -> Result<Self> {
        let (inner_height, inner_width) = source.shape();
        let height = pad_height
            .checked_mul(2)
            .and_then(|p| p.checked_add(inner_height));
        let width = pad_width
            .checked_mul(2)
            .and_then(|p| p.checked_add(inner_width));
        let (Some(height), Some(width)) = (height, width) else {
            return Err(EdgeError::InvalidDimensions {
                subject: "padded grid",
                height: inner_height,
                width: inner_width,
            });
        };

        let mut grid = Grid::new(height, width)?;
        for (i, row) in source.rows().enumerate() {
            grid.row_mut(i + pad_height)[pad_width..pad_width + inner_width].copy_from_slice(row);
        }

        Ok(Self {
            grid,
            pad_height,
            pad_width,
            inner_height,
            inner_width,
        })
    }

    /// Pads `source` by `kernel`'s half-extents.
    pub fn for_kernel(source: &Grid, kernel: &Kernel) -> Result<Self> {
        let (pad_height, pad_width) = kernel.half_extents();
        Self::new(source, pad_height, pad_width)
    }

    /// `(pad_height, pad_width)`
    pub fn pad_extents(&self) -> (usize, usize) {
        (self.pad_height, self.pad_width)
    }

    /// Shape of the grid that was padded, which is also the shape of any
    /// convolution result computed from this padding.
    pub fn inner_shape(&self) -> (usize, usize) {
        (self.inner_height, self.inner_width)
    }

    pub fn as_grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub fn fits(&self, kernel: &Kernel) -> bool {
        kernel.half_extents() == self.pad_extents()
    }

    pub(crate) fn check_kernel(&self, kernel: &Kernel) -> Result<()> {
        if self.fits(kernel) {
            return Ok(());
        }
        Err(EdgeError::PaddingMismatch {
            pad_height: self.pad_height,
            pad_width: self.pad_width,
            kernel_height: kernel.height(),
            kernel_width: kernel.width(),
        })
    }
}

/// Convenience wrapper returning the padded grid alone.
pub fn pad(source: &Grid, pad_height: usize, pad_width: usize) -> Result<Grid> {
    PaddedGrid::new(source, pad_height, pad_width).map(PaddedGrid::into_grid)
}

#[cfg(test)]
mod tests {
    use super::{PaddedGrid, pad};
    use crate::core_modules::error::EdgeError;
    use crate::core_modules::grid::grid::Grid;
    use crate::core_modules::kernel::kernel::Kernel;

    fn ramp(height: usize, width: usize) -> Grid {
        let data = (0..height * width).map(|v| v as f64 + 1.0).collect();
        Grid::from_vec(height, width, data).unwrap()
    }

    #[test]
    fn image_region_is_copied_and_border_is_zero() {
        let source = ramp(4, 5);
        for (pad_h, pad_w) in [(1, 1), (2, 1), (0, 3)] {
            let padded = pad(&source, pad_h, pad_w).unwrap();
            assert_eq!(padded.shape(), (4 + 2 * pad_h, 5 + 2 * pad_w));

            for i in 0..padded.height() {
                for j in 0..padded.width() {
                    let inside = (pad_h..pad_h + 4).contains(&i) && (pad_w..pad_w + 5).contains(&j);
                    if inside {
                        assert_eq!(padded[(i, j)], source[(i - pad_h, j - pad_w)]);
                    } else {
                        assert_eq!(padded[(i, j)], 0.0, "border cell ({i}, {j})");
                    }
                }
            }
        }
    }

    #[test]
    fn unit_kernel_padding_is_a_copy() {
        let source = ramp(3, 2);
        let unit = Kernel::new(1, 1, vec![1.0]).unwrap();
        let padded = PaddedGrid::for_kernel(&source, &unit).unwrap();
        assert_eq!(padded.pad_extents(), (0, 0));
        assert_eq!(padded.as_grid(), &source);
    }

    #[test]
    fn source_is_not_mutated() {
        let source = ramp(2, 2);
        let before = source.clone();
        let _ = pad(&source, 1, 1).unwrap();
        assert_eq!(source, before);
    }

    #[test]
    fn mismatched_kernel_is_reported() {
        let padded = PaddedGrid::for_kernel(&ramp(3, 3), &Kernel::sobel_x()).unwrap();
        assert!(padded.check_kernel(&Kernel::sobel_y()).is_ok());

        let wide = Kernel::new(1, 5, vec![1.0; 5]).unwrap();
        assert!(!padded.fits(&wide));
        assert!(matches!(
            padded.check_kernel(&wide),
            Err(EdgeError::PaddingMismatch {
                kernel_height: 1,
                kernel_width: 5,
                ..
            })
        ));
    }
}
