//! Image to burn-point pipeline
//!
//! The conversion process:
//! 1. Load the raster and apply the optional pre-filters
//! 2. Place it on the working canvas (scale, offset, rotation)
//! 3. Reduce to grayscale and run the edge or dither filter
//! 4. Extract grid-space points with the selected pattern

use crate::error::{EngraveError, Result};
use crate::points::{CONTOUR_SCALE, PointPattern, extract_points};
use crate::raster::{
    Comparator, ImagePlacement, IntensityBuffer, ProcessingMode, adjust_brightness,
    contour_canvas_side, floyd_steinberg_dither, gaussian_blur, lattice_canvas_side,
    render_placed, sharpen, sobel_edges, to_grayscale,
};
use crate::types::{BedDimensions, Point};
use image::{ImageError, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Options for image processing
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    pub pattern: PointPattern,
    pub mode: ProcessingMode,
    /// Intensities below this are burned (default: 128)
    pub threshold: u8,
    /// Burn light areas instead of dark ones
    pub invert: bool,
    /// Lattice spacing in bed units (default: 2)
    pub step: f64,
    /// Added to every RGB channel before processing
    pub brightness: i16,
    pub blur: bool,
    pub sharpen: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            pattern: PointPattern::Square,
            mode: ProcessingMode::Standard,
            threshold: 128,
            invert: false,
            step: 2.0,
            brightness: 0,
            blur: false,
            sharpen: false,
        }
    }
}

/// Unknown formats are an input problem, not a decoder failure
fn decode_error(err: ImageError) -> EngraveError {
    match err {
        ImageError::Unsupported(e) => {
            EngraveError::InvalidInput(format!("unsupported raster: {e}"))
        }
        other => other.into(),
    }
}

/// Decode an image from bytes, guessing the format
pub fn load_image_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .map_err(decode_error)?;
    Ok(img.to_rgba8())
}

/// Decode an image file
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(decode_error)?;
    Ok(img.to_rgba8())
}

fn prefilter(img: &RgbaImage, options: &ProcessingOptions) -> RgbaImage {
    let mut out = img.clone();
    if options.brightness != 0 {
        adjust_brightness(&mut out, options.brightness);
    }
    if options.blur {
        out = gaussian_blur(&out);
    }
    if options.sharpen {
        out = sharpen(&out);
    }
    out
}

fn apply_mode(gray: IntensityBuffer, options: &ProcessingOptions) -> IntensityBuffer {
    match options.mode {
        ProcessingMode::Standard => gray,
        ProcessingMode::Edge => sobel_edges(&gray),
        ProcessingMode::Dither => {
            let mut dithered = gray;
            floyd_steinberg_dither(&mut dithered, options.threshold);
            dithered
        }
    }
}

/// Run the whole pipeline and return grid-space points tagged `Image`
pub fn process_image(
    img: &RgbaImage,
    placement: &ImagePlacement,
    options: &ProcessingOptions,
    bed: BedDimensions,
) -> Result<Vec<Point>> {
    if !(options.step > 0.0 && options.step.is_finite()) {
        return Err(EngraveError::InvalidInput(format!(
            "step must be positive, got {}",
            options.step
        )));
    }
    if !(bed.width > 0.0 && bed.height > 0.0) {
        return Err(EngraveError::InvalidInput(format!(
            "bed must be non-empty, got {}x{}",
            bed.width, bed.height
        )));
    }

    let source = prefilter(img, options);
    let comparator = Comparator::for_mode(options.mode, options.threshold, options.invert);

    let points = if options.pattern == PointPattern::Contour {
        let (w, h) = source.dimensions();
        let side = contour_canvas_side(w, h, placement, bed);
        let canvas = render_placed(&source, placement, bed, side, CONTOUR_SCALE);
        let gray = to_grayscale(&canvas);
        debug!(side, "rendered contour canvas");
        extract_points(&gray, options.pattern, options.step, comparator, bed)
    } else {
        let side = lattice_canvas_side(bed);
        let canvas = render_placed(&source, placement, bed, side, 1.0);
        let gray = apply_mode(to_grayscale(&canvas), options);
        debug!(side, mode = options.mode.label(), "rendered lattice canvas");
        extract_points(&gray, options.pattern, options.step, comparator, bed)
    };

    info!(
        pattern = options.pattern.label(),
        points = points.len(),
        "processed image"
    );
    Ok(points)
}
