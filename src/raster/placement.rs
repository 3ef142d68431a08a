//! Placing the source image onto a square working canvas
//!
//! The canvas centre corresponds to the bed centre. With `pixels_per_unit`
//! of 1 a canvas pixel is one bed unit; contour extraction renders at 3 to
//! keep thin lines from collapsing.

use crate::types::BedDimensions;
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// User placement of the image relative to the bed centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    /// Multiplier on top of the fit-to-bed size
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Clockwise rotation in degrees, as seen on screen
    pub rotation: f64,
}

impl Default for ImagePlacement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
        }
    }
}

/// Bed units per image pixel so the image fits the bed, times `scale`
pub fn fit_factor(image_width: u32, image_height: u32, bed: BedDimensions, scale: f64) -> f64 {
    let fx = bed.width / image_width.max(1) as f64;
    let fy = bed.height / image_height.max(1) as f64;
    fx.min(fy) * scale
}

/// Canvas side for the lattice patterns: one pixel per bed unit, three beds wide
pub fn lattice_canvas_side(bed: BedDimensions) -> u32 {
    (bed.width.max(bed.height) * 3.0).ceil() as u32
}

/// Canvas side for contour extraction, large enough for any rotation and offset
pub fn contour_canvas_side(
    image_width: u32,
    image_height: u32,
    placement: &ImagePlacement,
    bed: BedDimensions,
) -> u32 {
    let factor = fit_factor(image_width, image_height, bed, placement.scale);
    let diagonal = (image_width as f64 * factor).hypot(image_height as f64 * factor);
    let max_offset = placement.offset_x.abs().max(placement.offset_y.abs()) * 2.0;
    ((diagonal + max_offset + bed.width.max(bed.height)) * 3.0).ceil() as u32
}

/// Composite a pixel over white
#[inline]
fn over_white(Rgba([r, g, b, a]): Rgba<u8>) -> Rgba<u8> {
    if a == 255 {
        return Rgba([r, g, b, 255]);
    }
    let alpha = a as u32;
    let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
    Rgba([blend(r), blend(g), blend(b), 255])
}

/// Render `img` onto a white `canvas_side` x `canvas_side` canvas.
///
/// Each canvas pixel is inverse-mapped into the source image and sampled
/// nearest-neighbour; pixels that land outside the image stay white.
pub fn render_placed(
    img: &RgbaImage,
    placement: &ImagePlacement,
    bed: BedDimensions,
    canvas_side: u32,
    pixels_per_unit: f64,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(canvas_side, canvas_side, WHITE);
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 || canvas_side == 0 {
        return canvas;
    }

    let units_per_pixel = fit_factor(img_w, img_h, bed, placement.scale) * pixels_per_unit;
    if units_per_pixel <= 0.0 || !units_per_pixel.is_finite() {
        return canvas;
    }

    let drawn_w = img_w as f64 * units_per_pixel;
    let drawn_h = img_h as f64 * units_per_pixel;
    let half_side = canvas_side as f64 / 2.0;
    let center_x = half_side + placement.offset_x * pixels_per_unit;
    let center_y = half_side - placement.offset_y * pixels_per_unit;

    let angle = placement.rotation.to_radians();
    let (sin, cos) = if placement.rotation == 0.0 {
        (0.0, 1.0)
    } else {
        angle.sin_cos()
    };

    for (px, py, out) in canvas.enumerate_pixels_mut() {
        let dx = px as f64 + 0.5 - center_x;
        let dy = py as f64 + 0.5 - center_y;

        // Undo the rotation to land in the unrotated image frame
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;

        let ix = ((u + drawn_w / 2.0) / units_per_pixel).floor();
        let iy = ((v + drawn_h / 2.0) / units_per_pixel).floor();
        if ix >= 0.0 && iy >= 0.0 && ix < img_w as f64 && iy < img_h as f64 {
            *out = over_white(*img.get_pixel(ix as u32, iy as u32));
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_fit_factor() {
        let bed = BedDimensions::new(100.0, 50.0);
        assert_eq!(fit_factor(200, 50, bed, 1.0), 0.5);
        assert_eq!(fit_factor(10, 10, bed, 2.0), 10.0);
    }

    #[test]
    fn test_canvas_sides() {
        let bed = BedDimensions::new(100.0, 50.0);
        assert_eq!(lattice_canvas_side(bed), 300);

        // 40x20 image fills the bed: 100x50, diagonal ~111.8
        let placement = ImagePlacement {
            offset_x: -4.0,
            offset_y: 1.0,
            ..Default::default()
        };
        assert_eq!(contour_canvas_side(40, 20, &placement, bed), 660);
    }

    #[test]
    fn test_render_centered() {
        let img = RgbaImage::from_pixel(2, 2, BLACK);
        let bed = BedDimensions::new(10.0, 10.0);
        let canvas = render_placed(&img, &ImagePlacement::default(), bed, 30, 1.0);

        assert_eq!(*canvas.get_pixel(9, 9), WHITE);
        assert_eq!(*canvas.get_pixel(10, 10), BLACK);
        assert_eq!(*canvas.get_pixel(19, 19), BLACK);
        assert_eq!(*canvas.get_pixel(20, 20), WHITE);
    }

    #[test]
    fn test_render_offset_moves_up_and_right() {
        let img = RgbaImage::from_pixel(2, 2, BLACK);
        let bed = BedDimensions::new(10.0, 10.0);
        let placement = ImagePlacement {
            offset_x: 5.0,
            offset_y: 5.0,
            ..Default::default()
        };
        let canvas = render_placed(&img, &placement, bed, 30, 1.0);

        assert_eq!(*canvas.get_pixel(10, 10), WHITE);
        assert_eq!(*canvas.get_pixel(15, 5), BLACK);
        assert_eq!(*canvas.get_pixel(24, 14), BLACK);
    }

    #[test]
    fn test_render_rotation_quarter_turn() {
        // Left pixel black, right pixel white
        let mut img = RgbaImage::from_pixel(2, 1, WHITE);
        img.put_pixel(0, 0, BLACK);
        let bed = BedDimensions::new(10.0, 10.0);
        let placement = ImagePlacement {
            rotation: 90.0,
            ..Default::default()
        };
        let canvas = render_placed(&img, &placement, bed, 30, 1.0);

        // Clockwise quarter turn puts the left half on top
        assert_eq!(*canvas.get_pixel(15, 12), BLACK);
        assert_eq!(*canvas.get_pixel(15, 17), WHITE);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        assert_eq!(over_white(Rgba([0, 0, 0, 0])), WHITE);
        assert_eq!(over_white(Rgba([10, 20, 30, 255])), Rgba([10, 20, 30, 255]));
    }
}
