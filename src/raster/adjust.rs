//! RGBA pre-filters applied before grayscale reduction
//!
//! Alpha is never touched. The 3x3 kernels leave the 1-pixel border as-is.

use image::{Rgba, RgbaImage};

const GAUSSIAN: [i32; 9] = [1, 2, 1, 2, 4, 2, 1, 2, 1];
const GAUSSIAN_SUM: i32 = 16;
const SHARPEN: [i32; 9] = [0, -1, 0, -1, 5, -1, 0, -1, 0];

/// Shift every color channel by `amount`, saturating at 0 and 255
pub fn adjust_brightness(img: &mut RgbaImage, amount: i16) {
    if amount == 0 {
        return;
    }
    for pixel in img.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let shift = |c: u8| (c as i16).saturating_add(amount).clamp(0, 255) as u8;
        *pixel = Rgba([shift(r), shift(g), shift(b), a]);
    }
}

/// Convolve the RGB channels with a 3x3 kernel, dividing by `divisor`
fn convolve3(img: &RgbaImage, kernel: &[i32; 9], divisor: i32) -> RgbaImage {
    let (width, height) = img.dimensions();
    let mut result = img.clone();

    if width < 3 || height < 3 {
        return result;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0i32; 3];
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let px = img.get_pixel(x + kx - 1, y + ky - 1);
                    let k = kernel[(ky * 3 + kx) as usize];
                    for (c, sum) in sums.iter_mut().enumerate() {
                        *sum += px[c] as i32 * k;
                    }
                }
            }
            let out = result.get_pixel_mut(x, y);
            for (c, sum) in sums.iter().enumerate() {
                let value = *sum as f64 / divisor as f64;
                out[c] = value.round_ties_even().clamp(0.0, 255.0) as u8;
            }
        }
    }

    result
}

/// 3x3 Gaussian blur
pub fn gaussian_blur(img: &RgbaImage) -> RgbaImage {
    convolve3(img, &GAUSSIAN, GAUSSIAN_SUM)
}

/// 3x3 Laplacian sharpen
pub fn sharpen(img: &RgbaImage) -> RgbaImage {
    convolve3(img, &SHARPEN, 1)
}
