//! Gradient orientation histograms.
//!
//! Cell `i` covers pixels `[r * i, r * i + r)`. Gradients are central
//! differences, so only cells whose pixels all have both neighbours inside
//! the image are emitted; the first and last partial cells are dropped.
//! This keeps the inset contract exact for any crop that is a multiple of
//! the cell size.

use std::f64::consts::PI;

use crate::image::MultiImage;
use crate::util::{SlideDetError, SlideDetResult};

/// Number of complete interior cells along an axis of `n` pixels.
pub fn interior_cells(n: usize, cell: usize) -> usize {
    if n == 0 {
        return 0;
    }
    ((n - 1) / cell).saturating_sub(1)
}

/// Gradient of the channel with the largest magnitude at `(x, y)`.
fn gradient(image: &MultiImage, x: usize, y: usize) -> (f64, f64) {
    let mut best = (0.0, 0.0);
    let mut best_mag = -1.0;
    for k in 0..image.channels() {
        let dx = image.at(x + 1, y, k) - image.at(x - 1, y, k);
        let dy = image.at(x, y + 1, k) - image.at(x, y - 1, k);
        let mag = dx * dx + dy * dy;
        if mag > best_mag {
            best_mag = mag;
            best = (dx, dy);
        }
    }
    best
}

fn orientation_bin(dx: f64, dy: f64, bins: usize) -> usize {
    let mut theta = dy.atan2(dx);
    if theta < 0.0 {
        theta += PI;
    }
    if theta >= PI {
        theta -= PI;
    }
    let bin = (theta / PI * bins as f64).floor() as usize;
    bin.min(bins - 1)
}

/// Per-cell histogram of unsigned gradient orientation weighted by magnitude.
pub fn grad_hist(image: &MultiImage, cell: usize, bins: usize) -> SlideDetResult<MultiImage> {
    if cell == 0 {
        return Err(SlideDetError::InvalidInput("grad_hist cell must be positive"));
    }
    if bins == 0 {
        return Err(SlideDetError::InvalidInput("grad_hist bins must be positive"));
    }
    let w = interior_cells(image.width(), cell);
    let h = interior_cells(image.height(), cell);
    let mut out = MultiImage::new(w, h, bins);
    for j in 0..h {
        for i in 0..w {
            let (x0, y0) = ((i + 1) * cell, (j + 1) * cell);
            for y in y0..y0 + cell {
                for x in x0..x0 + cell {
                    let (dx, dy) = gradient(image, x, y);
                    let mag = (dx * dx + dy * dy).sqrt();
                    if mag == 0.0 {
                        continue;
                    }
                    let bin = orientation_bin(dx, dy, bins);
                    let v = out.at(i, j, bin);
                    out.set(i, j, bin, v + mag);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{grad_hist, interior_cells, orientation_bin};
    use crate::image::MultiImage;

    #[test]
    fn interior_cell_counts() {
        assert_eq!(interior_cells(0, 4), 0);
        assert_eq!(interior_cells(8, 4), 0);
        assert_eq!(interior_cells(9, 4), 1);
        assert_eq!(interior_cells(16, 4), 2);
        assert_eq!(interior_cells(17, 4), 3);
    }

    #[test]
    fn horizontal_ramp_fills_first_bin() {
        let image = MultiImage::from_fn(20, 20, 1, |x, _, _| x as f64);
        let out = grad_hist(&image, 4, 6).unwrap();
        assert_eq!(out.size(), (3, 3));
        for j in 0..3 {
            for i in 0..3 {
                assert!((out.at(i, j, 0) - 32.0).abs() < 1e-12);
                for b in 1..6 {
                    assert_eq!(out.at(i, j, b), 0.0);
                }
            }
        }
    }

    #[test]
    fn opposite_directions_share_a_bin() {
        assert_eq!(orientation_bin(1.0, 1.0, 4), orientation_bin(-1.0, -1.0, 4));
        assert_eq!(orientation_bin(0.0, 1.0, 4), 2);
        assert_eq!(orientation_bin(-1.0, 0.0, 4), 0);
    }
}
