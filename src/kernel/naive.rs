//! Direct spatial-domain evaluation.

use crate::image::MultiImage;
use crate::kernel::bank::MultiBank;
use crate::kernel::size::{valid_size, valid_size_stride};

/// Responses of all filters for one output row, interleaved per position.
pub(crate) fn corr_row(
    f: &MultiImage,
    g: &MultiBank,
    stride: usize,
    v: usize,
    out_w: usize,
) -> Vec<f64> {
    let (gw, gh) = g.size();
    let p = g.len();
    let mut row = vec![0.0; out_w * p];
    for u in 0..out_w {
        let (x0, y0) = (stride * u, stride * v);
        for (pi, filter) in g.filters().iter().enumerate() {
            let mut total = 0.0;
            for ty in 0..gh {
                for tx in 0..gw {
                    let a = f.pixel(x0 + tx, y0 + ty);
                    let b = filter.pixel(tx, ty);
                    total += a.iter().zip(b).map(|(a, b)| a * b).sum::<f64>();
                }
            }
            row[u * p + pi] = total;
        }
    }
    row
}

/// Strided correlation of `f` with every filter of `g`.
///
/// The caller guarantees matching channel counts and a non-empty output.
pub(crate) fn corr_multi_bank_stride(f: &MultiImage, g: &MultiBank, stride: usize) -> MultiImage {
    let (out_w, out_h) = valid_size_stride(f.size(), g.size(), stride);
    let mut data = Vec::with_capacity(out_w * out_h * g.len());
    for v in 0..out_h {
        data.extend(corr_row(f, g, stride, v, out_w));
    }
    MultiImage::from_raw(data, out_w, out_h, g.len())
}

/// Convolution `h(t) = sum_tau f(t - tau) g(tau)` over the valid region.
pub(crate) fn conv_multi(f: &MultiImage, g: &MultiImage) -> MultiImage {
    let (gw, gh) = g.size();
    let (out_w, out_h) = valid_size(f.size(), g.size());
    MultiImage::from_fn(out_w, out_h, 1, |u, v, _| {
        let mut total = 0.0;
        for ty in 0..gh {
            for tx in 0..gw {
                let a = f.pixel(u + gw - 1 - tx, v + gh - 1 - ty);
                let b = g.pixel(tx, ty);
                total += a.iter().zip(b).map(|(a, b)| a * b).sum::<f64>();
            }
        }
        total
    })
}
