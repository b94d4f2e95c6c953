//! Learned filter banks, pooling and cross-channel normalization.

use crate::image::MultiImage;
use crate::kernel::{corr_bank, corr_multi_bank_stride, valid_size, Algo, Bank, MultiBank};
use crate::util::{SlideDetError, SlideDetResult};

/// Strided correlation with a bank of multi-channel filters, one output
/// channel per filter.
pub(crate) fn conv_multi(image: &MultiImage, filters: &MultiBank, stride: usize) -> SlideDetResult<MultiImage> {
    corr_multi_bank_stride(image, filters, stride, Algo::Auto)
}

/// Correlates every input channel with every single-channel filter.
///
/// Output channel `i * filters.len() + j` holds channel `i` against filter `j`.
pub(crate) fn conv_each(image: &MultiImage, filters: &Bank) -> SlideDetResult<MultiImage> {
    let (w, h) = valid_size(image.size(), filters.size());
    let per = filters.len();
    let mut out = MultiImage::new(w, h, image.channels() * per);
    if w == 0 || h == 0 {
        return Ok(out);
    }
    for i in 0..image.channels() {
        let resp = corr_bank(&image.channel(i)?, filters, Algo::Auto)?;
        for y in 0..h {
            for x in 0..w {
                let dst = &mut out.pixel_mut(x, y)[i * per..(i + 1) * per];
                dst.copy_from_slice(resp.pixel(x, y));
            }
        }
    }
    Ok(out)
}

/// Maximum over each `field` window, sampled every `stride` pixels.
///
/// Only windows that lie entirely inside the image are kept, so the output
/// is `(size - field + 1) / stride` cells along each axis.
pub(crate) fn max_pool(image: &MultiImage, field: (usize, usize), stride: usize) -> SlideDetResult<MultiImage> {
    if field.0 == 0 || field.1 == 0 || stride == 0 {
        return Err(SlideDetError::InvalidInput("max_pool field and stride must be positive"));
    }
    let w = (image.width() + 1).saturating_sub(field.0) / stride;
    let h = (image.height() + 1).saturating_sub(field.1) / stride;
    let mut out = MultiImage::new(w, h, image.channels());
    for j in 0..h {
        for i in 0..w {
            let acc = out.pixel_mut(i, j);
            acc.fill(f64::NEG_INFINITY);
            for y in j * stride..j * stride + field.1 {
                for x in i * stride..i * stride + field.0 {
                    for (a, &v) in acc.iter_mut().zip(image.pixel(x, y)) {
                        *a = a.max(v);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Divides each value by `(k + alpha * s)^beta`, where `s` is the sum of
/// squares over the `num` channels centred on it (clipped at the ends).
pub(crate) fn adj_chan_norm(
    image: &MultiImage,
    num: usize,
    k: f64,
    alpha: f64,
    beta: f64,
) -> SlideDetResult<MultiImage> {
    if num % 2 == 0 {
        return Err(SlideDetError::InvalidInput("adj_chan_norm window must be odd"));
    }
    let r = num / 2;
    let c = image.channels();
    let mut out = MultiImage::new(image.width(), image.height(), c);
    for y in 0..image.height() {
        for x in 0..image.width() {
            let src = image.pixel(x, y);
            let dst = out.pixel_mut(x, y);
            for (ch, d) in dst.iter_mut().enumerate() {
                let lo = ch.saturating_sub(r);
                let hi = (ch + r + 1).min(c);
                let s: f64 = src[lo..hi].iter().map(|v| v * v).sum();
                *d = src[ch] / (k + alpha * s).powf(beta);
            }
        }
    }
    Ok(out)
}
