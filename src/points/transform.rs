//! Grid space <-> bed space mapping
//!
//! Rotation pivots on the bed centre; the offset is applied after rotation.
//! Both directions round their output to 0.1 units.

use crate::types::{BedDimensions, GridTransform, Point, round_tenth};

#[inline]
fn rotate(x: f64, y: f64, degrees: f64) -> (f64, f64) {
    if degrees == 0.0 {
        return (x, y);
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Map an authored point onto the bed
pub fn grid_to_bed(point: &Point, transform: &GridTransform, bed: BedDimensions) -> Point {
    let (cx, cy) = bed.center();

    let x = point.x - cx;
    let y = (bed.height - point.y) - cy;

    let (x, y) = rotate(x, y, transform.rotation_degrees);

    let x = x + transform.offset_x + cx;
    let y = y - transform.offset_y + cy;

    Point {
        x: round_tenth(x),
        y: round_tenth(bed.height - y),
        source: point.source,
    }
}

/// Map a bed position back into grid space
pub fn bed_to_grid(point: &Point, transform: &GridTransform, bed: BedDimensions) -> Point {
    let (cx, cy) = bed.center();

    let x = point.x - cx - transform.offset_x;
    let y = (bed.height - point.y) - cy + transform.offset_y;

    let (x, y) = rotate(x, y, -transform.rotation_degrees);

    Point {
        x: round_tenth(x + cx),
        y: round_tenth(bed.height - (y + cy)),
        source: point.source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointSource;

    fn bed() -> BedDimensions {
        BedDimensions::new(200.0, 100.0)
    }

    #[test]
    fn test_identity_is_noop() {
        let p = Point::manual(12.3, 45.6);
        let t = GridTransform::default();
        assert_eq!(grid_to_bed(&p, &t, bed()), p);
        assert_eq!(bed_to_grid(&p, &t, bed()), p);
    }

    #[test]
    fn test_offset_direction() {
        // Offsets move points right and up on the bed
        let p = Point::manual(100.0, 50.0);
        let t = GridTransform::new(10.0, 5.0, 0.0);
        let moved = grid_to_bed(&p, &t, bed());
        assert_eq!((moved.x, moved.y), (110.0, 55.0));
    }

    #[test]
    fn test_rotation_about_center() {
        let p = Point::new(150.0, 50.0, PointSource::QrCode);
        let t = GridTransform::new(0.0, 0.0, 90.0);
        let rotated = grid_to_bed(&p, &t, bed());
        assert_eq!((rotated.x, rotated.y), (100.0, 0.0));
        assert_eq!(rotated.source, PointSource::QrCode);
    }

    #[test]
    fn test_round_trip_with_rotation() {
        let t = GridTransform::new(-7.5, 3.2, 33.0);
        for &(x, y) in &[(0.0, 0.0), (12.3, 45.6), (199.9, 0.1), (87.4, 99.0)] {
            let p = Point::manual(x, y);
            let back = bed_to_grid(&grid_to_bed(&p, &t, bed()), &t, bed());
            assert!((back.x - p.x).abs() <= 0.15, "{:?} -> {:?}", p, back);
            assert!((back.y - p.y).abs() <= 0.15, "{:?} -> {:?}", p, back);
        }
    }
}
