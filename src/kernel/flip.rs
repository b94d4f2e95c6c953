//! Kernel flipping and output decimation.

use crate::image::{Image, MultiImage};
use crate::util::math::ceil_div;

/// Mirrors an image in both axes.
pub fn flip(f: &Image) -> Image {
    let (w, h) = f.size();
    Image::from_fn(w, h, |x, y| f.at(w - 1 - x, h - 1 - y))
}

/// Mirrors every channel in both axes.
pub fn flip_multi(f: &MultiImage) -> MultiImage {
    let (w, h) = f.size();
    MultiImage::from_fn(w, h, f.channels(), |x, y, k| f.at(w - 1 - x, h - 1 - y, k))
}

/// Keeps every `k`-th sample in each dimension, starting at the origin.
///
/// # Panics
///
/// Panics if `k == 0`.
pub fn decimate(f: &Image, k: usize) -> Image {
    assert!(k > 0, "decimation factor must be positive");
    let w = ceil_div(f.width(), k);
    let h = ceil_div(f.height(), k);
    Image::from_fn(w, h, |x, y| f.at(k * x, k * y))
}

/// Multi-channel version of [`decimate`].
///
/// # Panics
///
/// Panics if `k == 0`.
pub fn decimate_multi(f: &MultiImage, k: usize) -> MultiImage {
    assert!(k > 0, "decimation factor must be positive");
    let w = ceil_div(f.width(), k);
    let h = ceil_div(f.height(), k);
    MultiImage::from_fn(w, h, f.channels(), |x, y, c| f.at(k * x, k * y, c))
}
