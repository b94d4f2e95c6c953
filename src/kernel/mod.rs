//! Sliding-window correlation engine.
//!
//! Every entry point computes, for each placement `(u, v)` of the filter
//! that lies entirely inside the image, the inner product
//! `sum_{i,j,k} f(u + i, v + j, k) * g(i, j, k)`. Placements are sampled
//! every `stride` positions for the strided variants. When no placement fits,
//! the result is an empty image rather than an error.
//!
//! Three interchangeable algorithms are available ([`Algo`]). `Auto` picks
//! between the naive and FFT algorithms by estimated multiply count; the
//! BLAS path is only used when asked for explicitly.

pub mod bank;
pub(crate) mod blas;
pub mod cos;
pub(crate) mod fft;
pub mod flip;
pub(crate) mod naive;
pub mod scorer;
pub mod size;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use bank::{Bank, MultiBank};
pub use flip::{decimate, decimate_multi, flip, flip_multi};
pub use size::{fft2_size, fft_len, valid_size, valid_size_stride};

use crate::image::{Image, MultiImage};
use crate::trace::{trace_debug, trace_span};
use crate::util::math::ceil_div;
use crate::util::{SlideDetError, SlideDetResult};

/// Correlation algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Algo {
    /// Naive or FFT, whichever needs fewer multiplies.
    #[default]
    Auto,
    Naive,
    Fft,
    Blas,
}

impl Algo {
    pub fn name(self) -> &'static str {
        match self {
            Algo::Auto => "auto",
            Algo::Naive => "naive",
            Algo::Fft => "fft",
            Algo::Blas => "blas",
        }
    }
}

/// Estimated multiplies of the naive and FFT algorithms for a strided
/// filter-bank correlation with a non-empty output.
pub fn estimate_costs(
    f: (usize, usize),
    g: (usize, usize),
    channels: usize,
    filters: usize,
    stride: usize,
) -> (usize, usize) {
    let out = valid_size_stride(f, g, stride);
    let naive = out.0 * out.1 * g.0 * g.1 * channels * filters;
    let groups = stride.min(g.0) * stride.min(g.1);
    let sub = (ceil_div(g.0, stride), ceil_div(g.1, stride));
    let (_, per_transform) = fft2_size((out.0 + sub.0 - 1, out.1 + sub.1 - 1));
    // Forward transforms of every input channel and every filter channel per
    // group, then one inverse per filter.
    let transforms = channels * groups + channels * filters * groups + filters;
    (naive, transforms * per_transform)
}

fn resolve(
    algo: Algo,
    f: (usize, usize),
    g: (usize, usize),
    channels: usize,
    filters: usize,
    stride: usize,
) -> Algo {
    match algo {
        Algo::Auto => {
            let (naive, fft) = estimate_costs(f, g, channels, filters, stride);
            if fft < naive {
                Algo::Fft
            } else {
                Algo::Naive
            }
        }
        other => other,
    }
}

pub(crate) fn check_multi_bank(
    f: &MultiImage,
    g: &MultiBank,
    stride: usize,
) -> SlideDetResult<()> {
    if stride == 0 {
        return Err(SlideDetError::InvalidInput("stride must be positive"));
    }
    if f.channels() != g.channels() {
        return Err(SlideDetError::ChannelMismatch {
            image: f.channels(),
            filter: g.channels(),
        });
    }
    Ok(())
}

fn single_filter(g: &Image) -> SlideDetResult<MultiBank> {
    MultiBank::single(MultiImage::from(g.clone()))
}

/// Strided correlation of a multi-channel image with a bank of
/// multi-channel filters. Output channel `p` is the response of filter `p`.
pub fn corr_multi_bank_stride(
    f: &MultiImage,
    g: &MultiBank,
    stride: usize,
    algo: Algo,
) -> SlideDetResult<MultiImage> {
    check_multi_bank(f, g, stride)?;
    let (out_w, out_h) = valid_size_stride(f.size(), g.size(), stride);
    if out_w == 0 || out_h == 0 {
        return Ok(MultiImage::new(0, 0, g.len()));
    }
    let algo = resolve(algo, f.size(), g.size(), f.channels(), g.len(), stride);
    let _span = trace_span!(
        "corr_multi_bank",
        algo = algo.name(),
        filters = g.len(),
        channels = f.channels(),
        stride = stride
    )
    .entered();
    trace_debug!("corr_algo", algo = algo.name(), out_w = out_w, out_h = out_h);
    Ok(match algo {
        Algo::Fft => fft::corr_multi_bank_stride(f, g, stride),
        Algo::Blas => blas::corr_multi_bank_stride(f, g, stride),
        Algo::Naive | Algo::Auto => naive::corr_multi_bank_stride(f, g, stride),
    })
}

/// Correlation of a multi-channel image with a bank of filters.
pub fn corr_multi_bank(f: &MultiImage, g: &MultiBank, algo: Algo) -> SlideDetResult<MultiImage> {
    corr_multi_bank_stride(f, g, 1, algo)
}

/// Strided correlation of a single-channel image with a bank of filters.
pub fn corr_bank_stride(
    f: &Image,
    g: &Bank,
    stride: usize,
    algo: Algo,
) -> SlideDetResult<MultiImage> {
    corr_multi_bank_stride(&MultiImage::from(f.clone()), &g.to_multi(), stride, algo)
}

/// Correlation of a single-channel image with a bank of filters.
pub fn corr_bank(f: &Image, g: &Bank, algo: Algo) -> SlideDetResult<MultiImage> {
    corr_bank_stride(f, g, 1, algo)
}

/// Strided correlation summed over channels.
pub fn corr_multi_stride(
    f: &MultiImage,
    g: &MultiImage,
    stride: usize,
    algo: Algo,
) -> SlideDetResult<Image> {
    let bank = MultiBank::single(g.clone())?;
    let out = corr_multi_bank_stride(f, &bank, stride, algo)?;
    if out.is_empty() {
        return Ok(Image::empty());
    }
    Ok(out.into_image())
}

/// Correlation summed over channels.
pub fn corr_multi(f: &MultiImage, g: &MultiImage, algo: Algo) -> SlideDetResult<Image> {
    corr_multi_stride(f, g, 1, algo)
}

/// Strided single-channel correlation.
pub fn corr_stride(f: &Image, g: &Image, stride: usize, algo: Algo) -> SlideDetResult<Image> {
    let bank = single_filter(g)?;
    let out = corr_multi_bank_stride(&MultiImage::from(f.clone()), &bank, stride, algo)?;
    if out.is_empty() {
        return Ok(Image::empty());
    }
    Ok(out.into_image())
}

/// Single-channel correlation, `h(u, v) = sum_{i,j} f(u + i, v + j) g(i, j)`.
pub fn corr(f: &Image, g: &Image, algo: Algo) -> SlideDetResult<Image> {
    corr_stride(f, g, 1, algo)
}

/// Convolution summed over channels, `h(t) = sum_tau f(t - tau) g(tau)`,
/// over the placements where the filter fits. Equal to correlation with
/// the filter mirrored in both axes.
pub fn conv_multi(f: &MultiImage, g: &MultiImage, algo: Algo) -> SlideDetResult<Image> {
    let bank = MultiBank::single(g.clone())?;
    check_multi_bank(f, &bank, 1)?;
    let (out_w, out_h) = valid_size(f.size(), g.size());
    if out_w == 0 || out_h == 0 {
        return Ok(Image::empty());
    }
    let algo = resolve(algo, f.size(), g.size(), f.channels(), 1, 1);
    let out = match algo {
        Algo::Fft => fft::conv_multi(f, g),
        Algo::Blas => {
            let flipped = MultiBank::single(flip_multi(g))?;
            blas::corr_multi_bank_stride(f, &flipped, 1)
        }
        Algo::Naive | Algo::Auto => naive::conv_multi(f, g),
    };
    Ok(out.into_image())
}

/// Single-channel convolution.
pub fn conv(f: &Image, g: &Image, algo: Algo) -> SlideDetResult<Image> {
    conv_multi(&MultiImage::from(f.clone()), &MultiImage::from(g.clone()), algo)
}
