//! Raster processing module
//!
//! Turns an RGBA raster into single-channel intensity buffers ready for
//! point extraction:
//! 1. Place the source image onto a white working canvas (scale, offset, rotation)
//! 2. Optionally adjust brightness, blur or sharpen the RGBA pixels
//! 3. Reduce to grayscale
//! 4. Apply the edge or dither filter selected by the processing mode
//! 5. Skeletonize for contour extraction

mod adjust;
mod filters;
mod placement;
mod skeleton;

use crate::error::{EngraveError, Result};
use image::{Rgba, RgbaImage};

pub use adjust::{adjust_brightness, gaussian_blur, sharpen};
pub use filters::{Comparator, ProcessingMode, floyd_steinberg_dither, sobel_edges};
pub use placement::{
    ImagePlacement, contour_canvas_side, fit_factor, lattice_canvas_side, render_placed,
};
pub use skeleton::{Skeleton, skeletonize};

/// Rectangular single-channel buffer of 0..=255 intensities
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityBuffer {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<u8>,
}

impl IntensityBuffer {
    /// Buffer of the given size with every sample set to `fill`
    pub fn new(width: usize, height: usize, fill: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![fill; width * height],
        }
    }

    /// Wrap existing samples, checking that the shape matches
    pub fn from_samples(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        if samples.len() != width * height {
            return Err(EngraveError::InvalidInput(format!(
                "buffer of {} samples does not match {}x{}",
                samples.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.samples[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        let idx = self.index(x, y);
        self.samples[idx] = value;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples equal to `value`
    pub fn count(&self, value: u8) -> usize {
        self.samples.iter().filter(|&&v| v == value).count()
    }
}

/// Luma of one RGB triple, alpha ignored
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let gray = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    gray.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Reduce an RGBA image to a grayscale intensity buffer
pub fn to_grayscale(img: &RgbaImage) -> IntensityBuffer {
    let (width, height) = img.dimensions();
    let samples = img
        .pixels()
        .map(|&Rgba([r, g, b, _])| luma(r, g, b))
        .collect();

    IntensityBuffer {
        width: width as usize,
        height: height as usize,
        samples,
    }
}

/// Reduce a raw RGBA byte buffer (4 bytes per pixel) to grayscale
pub fn grayscale_from_rgba(data: &[u8], width: usize, height: usize) -> Result<IntensityBuffer> {
    if data.len() != width * height * 4 {
        return Err(EngraveError::InvalidInput(format!(
            "RGBA buffer of {} bytes does not match {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let samples = data
        .chunks_exact(4)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect();

    IntensityBuffer::from_samples(width, height, samples)
}
