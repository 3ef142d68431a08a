//! QR code burn patterns
//!
//! Each dark module of the QR matrix becomes a `density x density` cluster
//! of points spaced one pitch apart. The matrix itself comes from a
//! [`MatrixEncoder`], so tests can inject fixed matrices.

use crate::bounds::Bounds;
use crate::error::{EngraveError, Result};
use crate::types::{BedDimensions, Point, PointSource};
use fast_qr::{ECL, QRBuilder};
use tracing::debug;

pub const DEFAULT_DENSITY: u32 = 3;
pub const MIN_DENSITY: u32 = 1;
pub const MAX_DENSITY: u32 = 10;

/// Square boolean module grid, row-major, `true` = dark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    size: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    pub fn new(size: usize, modules: Vec<bool>) -> Result<Self> {
        if modules.len() != size * size {
            return Err(EngraveError::InvalidInput(format!(
                "module matrix of {} cells is not {}x{}",
                modules.len(),
                size,
                size
            )));
        }
        Ok(Self { size, modules })
    }

    /// Build from rows of `'#'` (dark) and anything else (light)
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let size = rows.len();
        let modules = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| c == '#'))
            .collect();
        Self::new(size, modules)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.modules[row * self.size + col]
    }
}

/// Produces a QR module matrix for some text
pub trait MatrixEncoder {
    fn encode(&self, text: &str) -> Result<ModuleMatrix>;
}

/// `fast_qr` encoder at error-correction level M, auto-sized.
///
/// The encoder is linked in, so a build failure always means the text does
/// not fit any QR version and is reported as `InvalidInput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastQrEncoder;

impl MatrixEncoder for FastQrEncoder {
    fn encode(&self, text: &str) -> Result<ModuleMatrix> {
        let qr = QRBuilder::new(text)
            .ecl(ECL::M)
            .build()
            .map_err(|e| {
                EngraveError::InvalidInput(format!("{} bytes of QR text: {e}", text.len()))
            })?;

        let size = qr.size;
        let mut modules = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                modules.push(qr[row][col].value());
            }
        }
        ModuleMatrix::new(size, modules)
    }
}

/// Parameters for a QR pattern
#[derive(Debug, Clone, PartialEq)]
pub struct QrOptions {
    pub text: String,
    pub step: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Dots per module edge; `None` uses [`DEFAULT_DENSITY`]
    pub density: Option<u32>,
}

impl QrOptions {
    pub fn new(text: impl Into<String>, step: f64) -> Self {
        Self {
            text: text.into(),
            step,
            offset_x: 0.0,
            offset_y: 0.0,
            density: None,
        }
    }
}

/// Generated QR points plus the geometry needed to adjust them later
#[derive(Debug, Clone)]
pub struct QrPattern {
    pub points: Vec<Point>,
    pub module_count: usize,
    pub physical_size: f64,
    pub density: u32,
    pub bounds: Bounds,
}

impl QrPattern {
    /// Hit test against the pattern's square footprint
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bounds.contains(x, y)
    }
}

/// Step a density up or down by one, staying in `MIN_DENSITY..=MAX_DENSITY`
pub fn adjust_density(current: u32, increase: bool) -> u32 {
    let current = current.max(MIN_DENSITY);
    if increase {
        (current + 1).min(MAX_DENSITY)
    } else {
        current.saturating_sub(1).max(MIN_DENSITY)
    }
}

/// Generate clustered QR points centred on the bed plus the offset.
///
/// Row 0 of the matrix is placed at the top (largest Y) so the burned code
/// reads the right way round on the bed.
pub fn generate_qr_points(
    encoder: &dyn MatrixEncoder,
    options: &QrOptions,
    bed: BedDimensions,
) -> Result<QrPattern> {
    if options.text.trim().is_empty() {
        return Err(EngraveError::InvalidInput("text cannot be empty".into()));
    }
    if options.step <= 0.0 || !options.step.is_finite() {
        return Err(EngraveError::InvalidInput(format!(
            "step must be positive, got {}",
            options.step
        )));
    }

    let density = options.density.unwrap_or(DEFAULT_DENSITY);
    if !(MIN_DENSITY..=MAX_DENSITY).contains(&density) {
        return Err(EngraveError::InvalidInput(format!(
            "density must be between {} and {}, got {}",
            MIN_DENSITY, MAX_DENSITY, density
        )));
    }

    let matrix = encoder.encode(&options.text)?;
    let module_count = matrix.size();

    let module_size = density as f64 * options.step;
    let physical_size = module_count as f64 * module_size;
    let start_x = (bed.width - physical_size) / 2.0 + options.offset_x;
    let start_y = (bed.height - physical_size) / 2.0 + options.offset_y;

    let mut points = Vec::new();
    for row in 0..module_count {
        for col in 0..module_count {
            if !matrix.is_dark(row, col) {
                continue;
            }
            let module_x = start_x + col as f64 * module_size;
            let module_y = start_y + (module_count - 1 - row) as f64 * module_size;

            for dy in 0..density {
                for dx in 0..density {
                    points.push(Point::new(
                        module_x + dx as f64 * options.step,
                        module_y + dy as f64 * options.step,
                        PointSource::QrCode,
                    ));
                }
            }
        }
    }

    debug!(
        module_count,
        density,
        count = points.len(),
        "generated QR points"
    );

    Ok(QrPattern {
        points,
        module_count,
        physical_size,
        density,
        bounds: Bounds::new(
            start_x,
            start_y,
            start_x + physical_size,
            start_y + physical_size,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEncoder(ModuleMatrix);

    impl MatrixEncoder for FixedEncoder {
        fn encode(&self, _text: &str) -> Result<ModuleMatrix> {
            Ok(self.0.clone())
        }
    }

    struct BrokenEncoder;

    impl MatrixEncoder for BrokenEncoder {
        fn encode(&self, _text: &str) -> Result<ModuleMatrix> {
            Err(EngraveError::EncoderUnavailable("not loaded".into()))
        }
    }

    fn diagonal() -> FixedEncoder {
        FixedEncoder(ModuleMatrix::from_rows(&["#.", ".#"]).unwrap())
    }

    #[test]
    fn test_blank_text_rejected() {
        let options = QrOptions::new("   ", 1.0);
        let err = generate_qr_points(&diagonal(), &options, BedDimensions::default()).unwrap_err();
        assert!(matches!(err, EngraveError::InvalidInput(_)));
    }

    #[test]
    fn test_encoder_failure_propagates() {
        let options = QrOptions::new("hi", 1.0);
        let err =
            generate_qr_points(&BrokenEncoder, &options, BedDimensions::default()).unwrap_err();
        assert!(matches!(err, EngraveError::EncoderUnavailable(_)));
    }

    #[test]
    fn test_cluster_layout() {
        let bed = BedDimensions::new(100.0, 100.0);
        let mut options = QrOptions::new("x", 1.0);
        options.density = Some(2);
        let pattern = generate_qr_points(&diagonal(), &options, bed).unwrap();

        assert_eq!(pattern.module_count, 2);
        assert_eq!(pattern.density, 2);
        assert_eq!(pattern.physical_size, 4.0);
        assert_eq!(pattern.bounds, Bounds::new(48.0, 48.0, 52.0, 52.0));
        assert_eq!(pattern.points.len(), 8);
        assert!(pattern.points.iter().all(|p| p.source == PointSource::QrCode));

        let coords: Vec<(f64, f64)> = pattern.points.iter().map(|p| (p.x, p.y)).collect();
        // Row 0 (top-left module) sits in the upper half
        assert_eq!(
            coords,
            vec![
                (48.0, 50.0),
                (49.0, 50.0),
                (48.0, 51.0),
                (49.0, 51.0),
                (50.0, 48.0),
                (51.0, 48.0),
                (50.0, 49.0),
                (51.0, 49.0),
            ]
        );
    }

    #[test]
    fn test_default_density_and_offset() {
        let bed = BedDimensions::new(100.0, 100.0);
        let mut options = QrOptions::new("x", 0.5);
        options.offset_x = 10.0;
        options.offset_y = -5.0;
        let pattern = generate_qr_points(&diagonal(), &options, bed).unwrap();

        assert_eq!(pattern.density, DEFAULT_DENSITY);
        assert_eq!(pattern.points.len(), 18);
        assert_eq!(pattern.bounds.min_x, 58.5);
        assert_eq!(pattern.bounds.min_y, 43.5);
        assert!(pattern.contains(60.0, 45.0));
        assert!(!pattern.contains(50.0, 50.0));
    }

    #[test]
    fn test_density_bounds() {
        let mut options = QrOptions::new("x", 1.0);
        options.density = Some(0);
        assert!(generate_qr_points(&diagonal(), &options, BedDimensions::default()).is_err());

        assert_eq!(adjust_density(3, true), 4);
        assert_eq!(adjust_density(10, true), 10);
        assert_eq!(adjust_density(1, false), 1);
        assert_eq!(adjust_density(0, true), 2);
    }

    #[test]
    fn test_fast_qr_matrix_is_square() {
        let matrix = FastQrEncoder.encode("https://example.com").unwrap();
        assert!(matrix.size() >= 21);
        assert_eq!((matrix.size() - 17) % 4, 0);
        // Finder pattern corner is dark
        assert!(matrix.is_dark(0, 0));
    }
}
