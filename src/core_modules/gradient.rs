// THEORY:
// The gradient combiner turns the two axis derivatives into a single edge
// strength map and rescales it for display.
//
// 1.  **Magnitude**: `M = sqrt(Gx² + Gy²)`, elementwise, computed with `hypot`
//     so huge finite gradients do not overflow to infinity. Both inputs must
//     have the same shape; anything else is rejected before allocating.
// 2.  **Normalization**: `255 · (M − min) / (max − min)`. A flat magnitude field
//     (`min == max`, e.g. a uniform source image) has no range to stretch, so it
//     maps to all zeros instead of dividing by zero.
//
// Output stays floating point; truncation to bytes is the adapter's job.

use crate::core_modules::error::{EdgeError, Result};
use crate::core_modules::grid::grid::Grid;

/// Upper bound of the normalized output range.
pub const OUTPUT_MAX: f64 = 255.0;

/// Elementwise Euclidean magnitude of two gradient grids.
pub fn magnitude(gradient_x: &Grid, gradient_y: &Grid) -> Result<Grid> {
    if !gradient_x.same_shape(gradient_y) {
        let (x_height, x_width) = gradient_x.shape();
        let (y_height, y_width) = gradient_y.shape();
        return Err(EdgeError::ShapeMismatch {
            x_height,
            x_width,
            y_height,
            y_width,
        });
    }

    let (height, width) = gradient_x.shape();
    let data = gradient_x
        .as_slice()
        .iter()
        .zip(gradient_y.as_slice())
        .map(|(&gx, &gy)| gx.hypot(gy))
        .collect();
    Grid::from_vec(height, width, data)
}

/// Linearly rescales `grid` in place into `[0, OUTPUT_MAX]`.
pub fn normalize(mut grid: Grid) -> Grid {
    let (min, max) = grid.min_max();
    let range = max - min;

    if range == 0.0 {
        grid.as_mut_slice().fill(0.0);
        return grid;
    }

    for value in grid.as_mut_slice() {
        *value = (*value - min) / range * OUTPUT_MAX;
    }
    grid
}

/// Magnitude followed by normalization.
pub fn combine_and_normalize(gradient_x: &Grid, gradient_y: &Grid) -> Result<Grid> {
    magnitude(gradient_x, gradient_y).map(normalize)
}
