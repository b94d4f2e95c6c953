//! Rayon-parallel kernels (feature-gated).
//!
//! The naive kernel parallelizes over output rows; each worker computes all
//! filter responses for its rows and the rows are stitched in order, so the
//! result is bit-identical to the sequential kernel.

use crate::image::MultiImage;
use crate::kernel::bank::MultiBank;
use crate::kernel::naive::corr_row;
use crate::kernel::size::valid_size_stride;
use crate::kernel::{check_multi_bank, Algo};
use crate::util::SlideDetResult;
use rayon::prelude::*;

/// Row-parallel naive strided correlation with a filter bank.
pub fn corr_multi_bank_stride_naive_par(
    f: &MultiImage,
    g: &MultiBank,
    stride: usize,
) -> SlideDetResult<MultiImage> {
    check_multi_bank(f, g, stride)?;
    let (out_w, out_h) = valid_size_stride(f.size(), g.size(), stride);
    if out_w == 0 || out_h == 0 {
        return Ok(MultiImage::new(0, 0, g.len()));
    }

    let rows: Vec<Vec<f64>> = (0..out_h)
        .into_par_iter()
        .map(|v| corr_row(f, g, stride, v, out_w))
        .collect();

    let data = rows.into_iter().flatten().collect();
    Ok(MultiImage::from_raw(data, out_w, out_h, g.len()))
}

/// Evaluates one bank against many inputs in parallel.
///
/// Each worker runs its own correlation, so FFT plans and scratch buffers
/// are never shared.
pub fn corr_multi_bank_batch(
    inputs: &[MultiImage],
    g: &MultiBank,
    algo: Algo,
) -> SlideDetResult<Vec<MultiImage>> {
    inputs
        .par_iter()
        .map(|f| crate::kernel::corr_multi_bank(f, g, algo))
        .collect()
}
