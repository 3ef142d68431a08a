//! SVG preview of a bed-space point set

use crate::types::{BedDimensions, Point, PointSource};

const POINT_RADIUS: f64 = 0.5;

/// Format a number with 3 decimal places, treating -0 as 0
fn f(n: f64) -> String {
    let n = if n == 0.0 { 0.0 } else { n };
    format!("{:.3}", n)
}

fn fill(source: PointSource) -> &'static str {
    match source {
        PointSource::Image => "#5d3a1a",
        PointSource::Manual => "#1e6fd9",
        PointSource::QrCode => "#2e7d32",
    }
}

/// Render the bed outline and one dot per point.
///
/// Bed coordinates have their origin bottom-left, so Y is flipped.
pub fn points_to_svg(points: &[Point], bed: BedDimensions) -> String {
    let circles: Vec<String> = points
        .iter()
        .map(|p| {
            format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
                f(p.x),
                f(bed.height - p.y),
                f(POINT_RADIUS),
                fill(p.source)
            )
        })
        .collect();

    format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}">
    <rect x="0" y="0" width="{w}" height="{h}" fill="#f5deb3" stroke="#000000" stroke-width="0.5"/>
    {}
</svg>"##,
        circles.join("\n    "),
        w = f(bed.width),
        h = f(bed.height),
    )
}
