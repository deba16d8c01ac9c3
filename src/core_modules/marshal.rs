// THEORY:
// Pixel marshalling is the boundary between the numeric engine and real image
// files. Everything format-specific stays here, on top of the `image` crate:
//
// - `decode` / `open`: bytes or a path into a `DynamicImage`.
// - `luminance`: any colour model into a single-channel `Grid` in `[0, 1]`.
//   Colour sources go through the `image` crate's 8-bit luma conversion first,
//   then each byte `v` maps to `v / 255`.
// - `quantize`: a normalized `Grid` (expected in `[0, 255]`) into 8-bit gray,
//   truncating fractions and clamping out-of-range values. Like `luminance`, it
//   has a row-banded twin for the parallel mode.
// - `encode`: write a gray image, format chosen from the file extension.

use crate::core_modules::error::{EdgeError, Result};
use crate::core_modules::grid::grid::Grid;
use crate::core_modules::worker_pool::WorkerPool;
use image::{DynamicImage, GrayImage, ImageBuffer, ImageError, Luma};
use std::path::Path;

const LUMA_SCALE: f64 = 255.0;

fn decode_error(err: ImageError) -> EdgeError {
    match err {
        ImageError::IoError(io) => EdgeError::Io(io),
        other => EdgeError::Decode(other),
    }
}

fn encode_error(err: ImageError) -> EdgeError {
    match err {
        ImageError::IoError(io) => EdgeError::Io(io),
        other => EdgeError::Encode(other),
    }
}

/// Decodes an in-memory image, guessing the format from its magic bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(decode_error)
}

/// Reads and decodes an image file.
pub fn open(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(decode_error)
}

fn to_gray(image: &DynamicImage) -> Result<GrayImage> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(EdgeError::InvalidDimensions {
            subject: "image",
            height: height as usize,
            width: width as usize,
        });
    }
    Ok(gray)
}

/// Extracts a `[0, 1]` luminance grid from `image`.
pub fn luminance(image: &DynamicImage) -> Result<Grid> {
    let gray = to_gray(image)?;
    let (width, height) = gray.dimensions();
    let data = gray
        .as_raw()
        .iter()
        .map(|&v| f64::from(v) / LUMA_SCALE)
        .collect();
    Grid::from_vec(height as usize, width as usize, data)
}

/// Same as [`luminance`], with the byte-to-float conversion split into row bands
/// on `pool`.
pub fn luminance_parallel(image: &DynamicImage, pool: &WorkerPool) -> Result<Grid> {
    let gray = to_gray(image)?;
    let (width, height) = gray.dimensions();
    let width = width as usize;
    let mut grid = Grid::new(height as usize, width)?;

    let raw = gray.as_raw();
    pool.run_bands(&mut grid, |mut band| {
        for (row, cells) in band.rows_mut() {
            let src = &raw[row * width..(row + 1) * width];
            for (cell, &v) in cells.iter_mut().zip(src) {
                *cell = f64::from(v) / LUMA_SCALE;
            }
        }
    });
    Ok(grid)
}

/// Truncates one normalized sample into a gray byte.
#[inline]
pub fn quantize_sample(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as u8
}

fn too_large(height: usize, width: usize) -> EdgeError {
    EdgeError::InvalidDimensions {
        subject: "output image",
        height,
        width,
    }
}

fn gray_from_bytes(height: usize, width: usize, bytes: Vec<u8>) -> Result<GrayImage> {
    let w = u32::try_from(width).map_err(|_| too_large(height, width))?;
    let h = u32::try_from(height).map_err(|_| too_large(height, width))?;
    ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w, h, bytes).ok_or_else(|| too_large(height, width))
}

/// Converts a normalized grid into an 8-bit grayscale image.
pub fn quantize(grid: &Grid) -> Result<GrayImage> {
    let (height, width) = grid.shape();
    let bytes = grid.as_slice().iter().map(|&v| quantize_sample(v)).collect();
    gray_from_bytes(height, width, bytes)
}

/// Same as [`quantize`], with the output bytes filled in row bands on `pool`.
pub fn quantize_parallel(grid: &Grid, pool: &WorkerPool) -> Result<GrayImage> {
    let (height, width) = grid.shape();
    let mut bytes = vec![0u8; grid.len()];
    pool.run_row_bands(&mut bytes, height, width, |mut band| {
        for (row, out) in band.rows_mut() {
            for (byte, &v) in out.iter_mut().zip(grid.row(row)) {
                *byte = quantize_sample(v);
            }
        }
    });
    gray_from_bytes(height, width, bytes)
}

/// Writes `image` to `path`; the extension picks the format.
pub fn encode(image: &GrayImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save(path).map_err(encode_error)
}
