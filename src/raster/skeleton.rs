//! Zhang-Suen topological thinning
//!
//! Reduces dark shapes to 1-pixel-wide skeletons that keep their
//! connectivity. Each round runs two sub-passes; deletions found in a
//! sub-pass are applied only after the whole scan.

use super::IntensityBuffer;
use tracing::debug;

/// Thinning result: skeleton pixels are 0, background 255
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub buffer: IntensityBuffer,
    /// Rounds that deleted at least one pixel
    pub iterations: usize,
}

#[derive(Clone, Copy)]
enum SubPass {
    First,
    Second,
}

/// Neighbours p2..p9, clockwise starting directly above
#[inline]
fn neighbours(binary: &[u8], width: usize, x: usize, y: usize) -> [u8; 8] {
    let up = (y - 1) * width;
    let row = y * width;
    let down = (y + 1) * width;
    [
        binary[up + x],
        binary[up + x + 1],
        binary[row + x + 1],
        binary[down + x + 1],
        binary[down + x],
        binary[down + x - 1],
        binary[row + x - 1],
        binary[up + x - 1],
    ]
}

#[inline]
fn is_deletable(p: &[u8; 8], pass: SubPass) -> bool {
    let b: u8 = p.iter().sum();
    if !(2..=6).contains(&b) {
        return false;
    }

    let a = (0..8).filter(|&i| p[i] == 0 && p[(i + 1) % 8] == 1).count();
    if a != 1 {
        return false;
    }

    let [p2, _, p4, _, p6, _, p8, _] = *p;
    match pass {
        SubPass::First => p2 * p4 * p6 == 0 && p4 * p6 * p8 == 0,
        SubPass::Second => p2 * p4 * p8 == 0 && p2 * p6 * p8 == 0,
    }
}

/// Collect every interior foreground pixel the sub-pass would delete
fn scan(binary: &[u8], width: usize, height: usize, pass: SubPass, to_delete: &mut Vec<usize>) {
    to_delete.clear();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            if binary[idx] == 1 && is_deletable(&neighbours(binary, width, x, y), pass) {
                to_delete.push(idx);
            }
        }
    }
}

/// Binarize at `threshold` (dark = foreground) and thin until stable
pub fn skeletonize(gray: &IntensityBuffer, threshold: u8) -> Skeleton {
    let (width, height) = (gray.width, gray.height);
    let mut binary: Vec<u8> = gray
        .samples
        .iter()
        .map(|&v| u8::from(v < threshold))
        .collect();

    let mut iterations = 0;
    let has_foreground = binary.contains(&1);

    if has_foreground && width >= 3 && height >= 3 {
        let mut to_delete = Vec::new();
        loop {
            let mut changed = false;
            for pass in [SubPass::First, SubPass::Second] {
                scan(&binary, width, height, pass, &mut to_delete);
                for &idx in &to_delete {
                    binary[idx] = 0;
                }
                changed |= !to_delete.is_empty();
            }
            if !changed {
                break;
            }
            iterations += 1;
        }
    }

    debug!(width, height, iterations, "skeletonized mask");

    let samples = binary
        .into_iter()
        .map(|v| if v == 1 { 0 } else { 255 })
        .collect();

    Skeleton {
        buffer: IntensityBuffer {
            width,
            height,
            samples,
        },
        iterations,
    }
}
