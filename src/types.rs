/// Round a coordinate to the 0.1 unit grid every point lives on
pub fn round_tenth(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid emitting "-0.0" for values that round to zero
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Where a burn point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointSource {
    /// Extracted from a raster image
    #[default]
    Image,
    /// Placed by hand or recovered from an imported script
    Manual,
    /// Generated from a QR module matrix
    QrCode,
}

impl PointSource {
    pub fn label(&self) -> &'static str {
        match self {
            PointSource::Image => "image",
            PointSource::Manual => "manual",
            PointSource::QrCode => "qr",
        }
    }
}

/// A single burn point, always snapped to 0.1 units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub source: PointSource,
}

impl Point {
    /// Create a point, rounding both coordinates to one decimal place
    pub fn new(x: f64, y: f64, source: PointSource) -> Self {
        Self {
            x: round_tenth(x),
            y: round_tenth(y),
            source,
        }
    }

    pub fn image(x: f64, y: f64) -> Self {
        Self::new(x, y, PointSource::Image)
    }

    pub fn manual(x: f64, y: f64) -> Self {
        Self::new(x, y, PointSource::Manual)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Integer key in tenths, usable for exact de-duplication
    pub fn key(&self) -> (i64, i64) {
        (
            (self.x * 10.0).round() as i64,
            (self.y * 10.0).round() as i64,
        )
    }
}

/// Physical bed size; valid output region is `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedDimensions {
    pub width: f64,
    pub height: f64,
}

impl BedDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }
}

impl Default for BedDimensions {
    fn default() -> Self {
        Self {
            width: 256.0,
            height: 256.0,
        }
    }
}

/// Placement of authored points onto the bed, pivoting around the bed center
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Counter-clockwise rotation in degrees
    pub rotation_degrees: f64,
}

impl GridTransform {
    pub fn new(offset_x: f64, offset_y: f64, rotation_degrees: f64) -> Self {
        Self {
            offset_x,
            offset_y,
            rotation_degrees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(12.34), 12.3);
        assert_eq!(round_tenth(12.35000001), 12.4);
        assert_eq!(round_tenth(-0.04), 0.0);
        assert!(round_tenth(-0.04).is_sign_positive());
    }

    #[test]
    fn test_point_new_rounds() {
        let p = Point::image(1.234, 5.678);
        assert_eq!(p.x, 1.2);
        assert_eq!(p.y, 5.7);
        assert_eq!(p.source, PointSource::Image);
    }

    #[test]
    fn test_point_key() {
        assert_eq!(Point::manual(12.3, -4.5).key(), (123, -45));
    }

    #[test]
    fn test_bed_contains_is_inclusive() {
        let bed = BedDimensions::new(10.0, 20.0);
        assert!(bed.contains(&Point::manual(0.0, 0.0)));
        assert!(bed.contains(&Point::manual(10.0, 20.0)));
        assert!(!bed.contains(&Point::manual(10.1, 5.0)));
        assert!(!bed.contains(&Point::manual(5.0, -0.1)));
    }
}
