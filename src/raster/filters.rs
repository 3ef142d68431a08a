//! Binarization filters and the point-selection comparator
//!
//! Both filters consume a grayscale buffer. The edge filter produces a new
//! gradient-magnitude buffer; the ditherer rewrites its buffer in place.

use super::IntensityBuffer;

const SOBEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const SOBEL_Y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

/// How the grayscale buffer is processed before sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Plain threshold on grayscale intensity
    #[default]
    Standard,
    /// Sobel gradient magnitude, then threshold
    Edge,
    /// Floyd-Steinberg error diffusion to pure black/white
    Dither,
}

impl ProcessingMode {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingMode::Standard => "standard",
            ProcessingMode::Edge => "edge",
            ProcessingMode::Dither => "dither",
        }
    }
}

/// Decides whether a processed sample becomes a burn point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `< threshold`, or `>= threshold` when inverted
    Standard { threshold: u8, invert: bool },
    /// `== 0`, or `== 255` when inverted; `threshold` is the one the buffer was dithered at
    Dither { threshold: u8, invert: bool },
}

impl Comparator {
    /// Comparator matching a processing mode; edge output is thresholded like standard
    pub fn for_mode(mode: ProcessingMode, threshold: u8, invert: bool) -> Self {
        match mode {
            ProcessingMode::Standard | ProcessingMode::Edge => {
                Comparator::Standard { threshold, invert }
            }
            ProcessingMode::Dither => Comparator::Dither { threshold, invert },
        }
    }

    #[inline]
    pub fn accepts(&self, intensity: u8) -> bool {
        match *self {
            Comparator::Standard {
                threshold,
                invert: false,
            } => intensity < threshold,
            Comparator::Standard {
                threshold,
                invert: true,
            } => intensity >= threshold,
            Comparator::Dither { invert: false, .. } => intensity == 0,
            Comparator::Dither { invert: true, .. } => intensity == 255,
        }
    }

    /// Binarization threshold used when skeletonizing
    pub fn threshold(&self) -> u8 {
        match *self {
            Comparator::Standard { threshold, .. } | Comparator::Dither { threshold, .. } => {
                threshold
            }
        }
    }
}

/// Sobel gradient magnitude clamped to 0..=255; the 1-pixel border stays 0
pub fn sobel_edges(gray: &IntensityBuffer) -> IntensityBuffer {
    let (width, height) = (gray.width, gray.height);
    let mut edges = IntensityBuffer::new(width, height, 0);

    if width < 3 || height < 3 {
        return edges;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx = 0i32;
            let mut gy = 0i32;
            for ky in 0..3 {
                for kx in 0..3 {
                    let v = gray.get(x + kx - 1, y + ky - 1) as i32;
                    gx += v * SOBEL_X[ky * 3 + kx];
                    gy += v * SOBEL_Y[ky * 3 + kx];
                }
            }
            let magnitude = ((gx * gx + gy * gy) as f64).sqrt();
            edges.set(x, y, magnitude.round_ties_even().min(255.0) as u8);
        }
    }

    edges
}

/// Add a diffused error share to a sample, saturating at the 0..=255 range
#[inline]
fn diffuse(sample: &mut u8, share: f64) {
    *sample = (*sample as f64 + share).round_ties_even().clamp(0.0, 255.0) as u8;
}

/// Floyd-Steinberg dithering, in place, strict row-major order.
///
/// Each sample stores the saturated running value, so error that pushes a
/// neighbour past 0 or 255 is lost exactly as an 8-bit clamped buffer would.
pub fn floyd_steinberg_dither(buffer: &mut IntensityBuffer, threshold: u8) {
    let (width, height) = (buffer.width, buffer.height);
    let samples = &mut buffer.samples;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = samples[idx];
            let new = if old < threshold { 0 } else { 255 };
            samples[idx] = new;
            let error = old as f64 - new as f64;

            if x + 1 < width {
                diffuse(&mut samples[idx + 1], error * 7.0 / 16.0);
            }
            if y + 1 < height {
                if x > 0 {
                    diffuse(&mut samples[idx + width - 1], error * 3.0 / 16.0);
                }
                diffuse(&mut samples[idx + width], error * 5.0 / 16.0);
                if x + 1 < width {
                    diffuse(&mut samples[idx + width + 1], error / 16.0);
                }
            }
        }
    }
}
