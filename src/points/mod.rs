//! Point generation and point-set operations
//!
//! Extraction, QR clusters, grid/bed transforms and tour ordering. Point
//! lists from different sources are concatenated, never de-duplicated
//! against each other.

mod extract;
mod qr;
mod tour;
mod transform;

use crate::types::{BedDimensions, GridTransform, Point, PointSource};

pub use extract::{
    CONTOUR_SCALE, PointPattern, SpatialIndex, extract_contour, extract_points, extract_square,
    extract_triangle,
};
pub use qr::{
    DEFAULT_DENSITY, FastQrEncoder, MAX_DENSITY, MIN_DENSITY, MatrixEncoder, ModuleMatrix,
    QrOptions, QrPattern, adjust_density, generate_qr_points,
};
pub use tour::optimize_tour;
pub use transform::{bed_to_grid, grid_to_bed};

/// Drop every point tagged `source` and append `replacement`
pub fn replace_source(points: &mut Vec<Point>, source: PointSource, replacement: Vec<Point>) {
    points.retain(|p| p.source != source);
    points.extend(replacement);
}

/// Map points onto the bed and keep those inside `[0, W] x [0, H]`
pub fn to_bed_within(
    points: &[Point],
    transform: &GridTransform,
    bed: BedDimensions,
) -> Vec<Point> {
    points
        .iter()
        .map(|p| grid_to_bed(p, transform, bed))
        .filter(|p| bed.contains(p))
        .collect()
}

/// Count points per source, in `Image`, `Manual`, `QrCode` order
pub fn count_by_source(points: &[Point]) -> [usize; 3] {
    let mut counts = [0; 3];
    for p in points {
        let slot = match p.source {
            PointSource::Image => 0,
            PointSource::Manual => 1,
            PointSource::QrCode => 2,
        };
        counts[slot] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_source_only_touches_tag() {
        let mut points = vec![
            Point::image(1.0, 1.0),
            Point::new(2.0, 2.0, PointSource::QrCode),
            Point::manual(3.0, 3.0),
            Point::new(4.0, 4.0, PointSource::QrCode),
        ];
        replace_source(
            &mut points,
            PointSource::QrCode,
            vec![Point::new(9.0, 9.0, PointSource::QrCode)],
        );

        assert_eq!(
            points,
            vec![
                Point::image(1.0, 1.0),
                Point::manual(3.0, 3.0),
                Point::new(9.0, 9.0, PointSource::QrCode),
            ]
        );
    }

    #[test]
    fn test_cross_source_duplicates_are_kept() {
        let mut points = vec![Point::image(5.0, 5.0)];
        let qr = vec![Point::new(5.0, 5.0, PointSource::QrCode)];
        replace_source(&mut points, PointSource::QrCode, qr);
        assert_eq!(points.len(), 2);
        assert_eq!(count_by_source(&points), [1, 0, 1]);
    }

    #[test]
    fn test_to_bed_within_filters_outside() {
        let bed = BedDimensions::new(100.0, 100.0);
        let transform = GridTransform::new(20.0, 0.0, 0.0);
        let points = vec![Point::image(10.0, 10.0), Point::image(85.0, 50.0)];

        let on_bed = to_bed_within(&points, &transform, bed);
        assert_eq!(on_bed, vec![Point::image(30.0, 10.0)]);
    }
}
