//! Correlation as one dense matrix product.
//!
//! Every output position becomes a row of the unrolled image matrix (one
//! column per filter tap and channel) and every filter becomes a column of
//! the weight matrix. The product is computed by `ndarray`.

use crate::image::MultiImage;
use crate::kernel::bank::MultiBank;
use crate::kernel::size::valid_size_stride;
use ndarray::Array2;

pub(crate) fn corr_multi_bank_stride(f: &MultiImage, g: &MultiBank, stride: usize) -> MultiImage {
    let (out_w, out_h) = valid_size_stride(f.size(), g.size(), stride);
    let (gw, gh) = g.size();
    let channels = g.channels();
    let taps = gw * gh * channels;

    let unrolled = Array2::from_shape_fn((out_w * out_h, taps), |(r, c)| {
        let (u, v) = (r % out_w, r / out_w);
        let (t, k) = (c / channels, c % channels);
        let (tx, ty) = (t % gw, t / gw);
        f.at(stride * u + tx, stride * v + ty, k)
    });
    let weights = Array2::from_shape_fn((taps, g.len()), |(c, p)| {
        let (t, k) = (c / channels, c % channels);
        g.filters()[p].at(t % gw, t / gw, k)
    });
    let product = unrolled.dot(&weights);

    MultiImage::from_fn(out_w, out_h, g.len(), |u, v, p| product[[v * out_w + u, p]])
}
