//! Cosine similarity between the filter and every window.
//!
//! This is normalized cross-correlation without mean subtraction. Window
//! norms come from a summed-area table of the squared image.

use crate::image::table::SumTable;
use crate::image::{Image, MultiImage};
use crate::kernel::{corr_multi, Algo};
use crate::util::SlideDetResult;

/// Relative error of a summed-area lookup below which a window counts as zero.
const REL_EPS: f64 = 1e-9;

fn inv_norm(values: &[f64]) -> f64 {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        0.0
    } else {
        1.0 / norm
    }
}

fn window_inv_norm(table: &SumTable, x: usize, y: usize, w: usize, h: usize) -> f64 {
    let sum = table.rect_sum(x, y, x + w, y + h);
    let err = REL_EPS * table.rect_abs_sum(x, y, x + w, y + h);
    if sum.abs() <= err {
        return 0.0;
    }
    debug_assert!(sum > 0.0, "window energy {sum} is negative beyond rounding");
    if sum <= 0.0 {
        return 0.0;
    }
    1.0 / sum.sqrt()
}

/// Cosine of the angle between `g` and each window of `f`, summed over
/// channels. Windows or filters with zero energy score 0.
pub fn cos_corr_multi(f: &MultiImage, g: &MultiImage, algo: Algo) -> SlideDetResult<Image> {
    let mut h = corr_multi(f, g, algo)?;
    if h.is_empty() {
        return Ok(h);
    }
    let g_inv = inv_norm(g.data());
    let table = SumTable::new(&f.sum_squares());
    let (gw, gh) = g.size();
    for v in 0..h.height() {
        for u in 0..h.width() {
            let scale = g_inv * window_inv_norm(&table, u, v, gw, gh);
            h.set(u, v, h.at(u, v) * scale);
        }
    }
    Ok(h)
}

/// Single-channel [`cos_corr_multi`].
pub fn cos_corr(f: &Image, g: &Image, algo: Algo) -> SlideDetResult<Image> {
    cos_corr_multi(&MultiImage::from(f.clone()), &MultiImage::from(g.clone()), algo)
}
