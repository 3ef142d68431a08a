//! Sampling processed buffers into burn points
//!
//! Buffer pixels are one bed unit each (contour mode: `CONTOUR_SCALE`
//! pixels per unit), with the buffer centre at the bed centre. Grid Y
//! grows upwards while buffer rows grow downwards.

use crate::raster::{Comparator, IntensityBuffer, skeletonize};
use crate::types::{BedDimensions, Point, round_tenth};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Linear scale of the working buffer used by contour extraction
pub const CONTOUR_SCALE: f64 = 3.0;

/// Minimum spacing between contour points, as a fraction of the pitch
const CONTOUR_SPACING: f64 = 0.9;

/// Lattice or tracing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointPattern {
    /// Regular grid aligned to the bed centre
    #[default]
    Square,
    /// Hexagonal packing: alternate rows shifted by half a pitch
    Triangle,
    /// Points along the skeleton of dark shapes
    Contour,
}

impl PointPattern {
    pub fn label(&self) -> &'static str {
        match self {
            PointPattern::Square => "square",
            PointPattern::Triangle => "triangle",
            PointPattern::Contour => "contour",
        }
    }
}

/// Uniform bucket grid answering "is any accepted point closer than `min_dist`?"
#[derive(Debug)]
pub struct SpatialIndex {
    min_dist: f64,
    bucket_size: f64,
    buckets: HashMap<(i64, i64), Vec<(f64, f64)>>,
}

impl SpatialIndex {
    pub fn new(min_dist: f64) -> Self {
        Self {
            min_dist,
            bucket_size: min_dist.max(1.0),
            buckets: HashMap::new(),
        }
    }

    #[inline]
    fn bucket(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.bucket_size).floor() as i64,
            (y / self.bucket_size).floor() as i64,
        )
    }

    /// Checks the 3x3 block of buckets around the candidate
    pub fn is_near(&self, x: f64, y: f64) -> bool {
        let (bx, by) = self.bucket(x, y);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(bucket) = self.buckets.get(&(bx + dx, by + dy)) else {
                    continue;
                };
                if bucket
                    .iter()
                    .any(|&(px, py)| ((px - x).powi(2) + (py - y).powi(2)).sqrt() < self.min_dist)
                {
                    return true;
                }
            }
        }
        false
    }

    pub fn insert(&mut self, x: f64, y: f64) {
        let key = self.bucket(x, y);
        self.buckets.entry(key).or_default().push((x, y));
    }

    /// Insert unless a neighbour is too close; returns whether it was accepted
    pub fn try_insert(&mut self, x: f64, y: f64) -> bool {
        if self.is_near(x, y) {
            return false;
        }
        self.insert(x, y);
        true
    }
}

/// Sample lookup shared by the lattice strategies
struct LatticeSampler<'a> {
    buffer: &'a IntensityBuffer,
    comparator: Comparator,
    half_w: f64,
    half_h: f64,
    half_bed_x: f64,
    half_bed_y: f64,
}

impl<'a> LatticeSampler<'a> {
    fn new(buffer: &'a IntensityBuffer, comparator: Comparator, bed: BedDimensions) -> Self {
        Self {
            buffer,
            comparator,
            half_w: buffer.width as f64 / 2.0,
            half_h: buffer.height as f64 / 2.0,
            half_bed_x: bed.width / 2.0,
            half_bed_y: bed.height / 2.0,
        }
    }

    /// Grid range covered by the buffer along X
    fn grid_x_range(&self) -> (f64, f64) {
        let min = -self.half_w + self.half_bed_x;
        (min, min + self.buffer.width as f64)
    }

    fn grid_y_range(&self) -> (f64, f64) {
        let min = -self.half_h + self.half_bed_y;
        (min, min + self.buffer.height as f64)
    }

    /// Buffer row for a grid Y, if inside the buffer
    fn row(&self, gy: f64) -> Option<usize> {
        let cy = self.buffer.height as f64 - (gy + self.half_h - self.half_bed_y);
        (cy >= 0.0 && cy < self.buffer.height as f64).then(|| cy.floor() as usize)
    }

    fn column(&self, gx: f64) -> Option<usize> {
        let cx = gx + self.half_w - self.half_bed_x;
        (cx >= 0.0 && cx < self.buffer.width as f64).then(|| cx.floor() as usize)
    }

    fn accepts(&self, column: usize, row: usize) -> bool {
        self.comparator.accepts(self.buffer.get(column, row))
    }
}

/// Regular lattice aligned to multiples of `step`
pub fn extract_square(
    buffer: &IntensityBuffer,
    step: f64,
    comparator: Comparator,
    bed: BedDimensions,
) -> Vec<Point> {
    let sampler = LatticeSampler::new(buffer, comparator, bed);
    let (min_gx, max_gx) = sampler.grid_x_range();
    let (min_gy, max_gy) = sampler.grid_y_range();

    let start_col = (min_gx / step).floor() as i64;
    let end_col = ((max_gx + step) / step).floor() as i64;
    let start_row = (min_gy / step).floor() as i64;
    let end_row = ((max_gy + step) / step).floor() as i64;

    let mut points = Vec::new();
    for r in start_row..=end_row {
        let gy = r as f64 * step;
        let Some(row) = sampler.row(gy) else {
            continue;
        };
        for c in start_col..=end_col {
            let gx = c as f64 * step;
            if let Some(column) = sampler.column(gx)
                && sampler.accepts(column, row)
            {
                points.push(Point::image(gx, gy));
            }
        }
    }
    points
}

/// Hexagonal lattice: row spacing `step * sqrt(3) / 2`, odd rows shifted by `step / 2`
pub fn extract_triangle(
    buffer: &IntensityBuffer,
    step: f64,
    comparator: Comparator,
    bed: BedDimensions,
) -> Vec<Point> {
    let sampler = LatticeSampler::new(buffer, comparator, bed);
    let row_height = step * 3f64.sqrt() / 2.0;
    let (min_gx, max_gx) = sampler.grid_x_range();
    let (min_gy, max_gy) = sampler.grid_y_range();

    let min_row = (min_gy / row_height).floor() as i64 - 1;
    let max_row = (max_gy / row_height).ceil() as i64 + 1;

    let mut points = Vec::new();
    for r in min_row..=max_row {
        let gy = r as f64 * row_height;
        let Some(row) = sampler.row(gy) else {
            continue;
        };

        let row_offset = if r.rem_euclid(2) == 1 { step / 2.0 } else { 0.0 };
        let min_col = ((min_gx - row_offset) / step).floor() as i64 - 1;
        let max_col = ((max_gx - row_offset) / step).ceil() as i64 + 1;

        for c in min_col..=max_col {
            let gx = c as f64 * step + row_offset;
            if let Some(column) = sampler.column(gx)
                && sampler.accepts(column, row)
            {
                points.push(Point::image(gx, gy));
            }
        }
    }
    points
}

/// Skeleton tracing over a buffer rendered at `CONTOUR_SCALE` pixels per unit.
///
/// Every skeleton pixel is a candidate; a candidate is kept only when no
/// kept point lies within `0.9 * step`.
pub fn extract_contour(
    buffer: &IntensityBuffer,
    step: f64,
    threshold: u8,
    bed: BedDimensions,
) -> Vec<Point> {
    let skeleton = skeletonize(buffer, threshold).buffer;
    let half_w = buffer.width as f64 / 2.0;
    let half_h = buffer.height as f64 / 2.0;
    let (half_bed_x, half_bed_y) = bed.center();

    let mut index = SpatialIndex::new(step * CONTOUR_SPACING);
    let mut points = Vec::new();
    let mut candidates = 0usize;

    for y in 0..skeleton.height {
        for x in 0..skeleton.width {
            if skeleton.get(x, y) >= 128 {
                continue;
            }
            candidates += 1;

            let gx = round_tenth((x as f64 - half_w) / CONTOUR_SCALE + half_bed_x);
            let gy = round_tenth(
                ((skeleton.height - y) as f64 - half_h) / CONTOUR_SCALE + half_bed_y,
            );

            if index.try_insert(gx, gy) {
                points.push(Point::image(gx, gy));
            }
        }
    }

    debug!(candidates, kept = points.len(), "traced skeleton");
    points
}

/// Dispatch to the strategy selected by `pattern`
pub fn extract_points(
    buffer: &IntensityBuffer,
    pattern: PointPattern,
    step: f64,
    comparator: Comparator,
    bed: BedDimensions,
) -> Vec<Point> {
    if step <= 0.0 || !step.is_finite() {
        warn!(step, "non-positive step, nothing extracted");
        return Vec::new();
    }

    let points = match pattern {
        PointPattern::Square => extract_square(buffer, step, comparator, bed),
        PointPattern::Triangle => extract_triangle(buffer, step, comparator, bed),
        PointPattern::Contour => extract_contour(buffer, step, comparator.threshold(), bed),
    };

    debug!(
        pattern = pattern.label(),
        step,
        count = points.len(),
        "extracted points"
    );
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: Comparator = Comparator::Standard {
        threshold: 128,
        invert: false,
    };

    #[test]
    fn test_square_lattice_small_region() {
        let buffer = IntensityBuffer::new(10, 10, 0);
        let bed = BedDimensions::new(10.0, 10.0);
        let points = extract_square(&buffer, 5.0, DARK, bed);

        let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0.0, 5.0), (5.0, 5.0), (0.0, 10.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_square_lattice_respects_comparator() {
        let buffer = IntensityBuffer::new(10, 10, 200);
        let bed = BedDimensions::new(10.0, 10.0);
        assert!(extract_square(&buffer, 5.0, DARK, bed).is_empty());

        let inverted = Comparator::Standard {
            threshold: 128,
            invert: true,
        };
        assert_eq!(extract_square(&buffer, 5.0, inverted, bed).len(), 4);
    }

    #[test]
    fn test_square_lattice_samples_correct_pixel() {
        // Only the top-left quadrant is dark
        let mut buffer = IntensityBuffer::new(10, 10, 255);
        for y in 0..5 {
            for x in 0..5 {
                buffer.set(x, y, 0);
            }
        }
        let bed = BedDimensions::new(10.0, 10.0);
        let points = extract_square(&buffer, 5.0, DARK, bed);

        // Grid (0, 10) is buffer row 0, column 0
        let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0.0, 10.0)]);
    }

    #[test]
    fn test_triangle_rows_are_offset() {
        let buffer = IntensityBuffer::new(20, 20, 0);
        let bed = BedDimensions::new(20.0, 20.0);
        let points = extract_triangle(&buffer, 4.0, DARK, bed);

        let row_height = 4.0 * 3f64.sqrt() / 2.0;
        let first_row: Vec<f64> = points
            .iter()
            .filter(|p| p.y == round_tenth(row_height))
            .map(|p| p.x)
            .collect();
        let second_row: Vec<f64> = points
            .iter()
            .filter(|p| p.y == round_tenth(2.0 * row_height))
            .map(|p| p.x)
            .collect();

        assert_eq!(first_row, vec![2.0, 6.0, 10.0, 14.0, 18.0]);
        assert_eq!(second_row, vec![0.0, 4.0, 8.0, 12.0, 16.0]);
    }

    #[test]
    fn test_triangle_denser_than_square() {
        let buffer = IntensityBuffer::new(60, 60, 0);
        let bed = BedDimensions::new(60.0, 60.0);
        for step in [2.0, 3.0, 5.0] {
            let square = extract_square(&buffer, step, DARK, bed).len();
            let triangle = extract_triangle(&buffer, step, DARK, bed).len();
            assert!(
                triangle > square,
                "step {}: triangle {} <= square {}",
                step,
                triangle,
                square
            );
        }
    }

    #[test]
    fn test_spatial_index() {
        let mut index = SpatialIndex::new(1.8);
        assert!(index.try_insert(0.0, 0.0));
        assert!(!index.try_insert(1.0, 1.0));
        assert!(index.try_insert(1.8, 0.0));
        assert!(index.is_near(2.5, 0.5));
        assert!(!index.is_near(10.0, 10.0));
    }

    #[test]
    fn test_contour_spacing() {
        // Ring-like outline at 3x scale
        let mut buffer = IntensityBuffer::new(90, 90, 255);
        for i in 10..80 {
            buffer.set(i, 10, 0);
            buffer.set(i, 79, 0);
            buffer.set(10, i, 0);
            buffer.set(79, i, 0);
        }
        let bed = BedDimensions::new(30.0, 30.0);
        let step = 2.0;
        let points = extract_contour(&buffer, step, 128, bed);

        assert!(points.len() > 10);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance(b) >= 0.9 * step, "{:?} too close to {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_contour_coordinates_are_bed_centered() {
        // Single dark pixel at the buffer centre
        let mut buffer = IntensityBuffer::new(9, 9, 255);
        buffer.set(4, 4, 0);
        let bed = BedDimensions::new(100.0, 50.0);
        let points = extract_contour(&buffer, 1.0, 128, bed);

        assert_eq!(points.len(), 1);
        assert_eq!((points[0].x, points[0].y), (49.8, 25.2));
    }

    #[test]
    fn test_extract_points_rejects_bad_step() {
        let buffer = IntensityBuffer::new(10, 10, 0);
        let bed = BedDimensions::new(10.0, 10.0);
        assert!(extract_points(&buffer, PointPattern::Square, 0.0, DARK, bed).is_empty());
    }
}
