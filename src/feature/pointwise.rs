//! Per-element maps and channel selection.

use crate::image::MultiImage;
use crate::util::{SlideDetError, SlideDetResult};

fn map(image: &MultiImage, f: impl Fn(f64) -> f64) -> MultiImage {
    let data = image.data().iter().map(|&v| f(v)).collect();
    MultiImage::from_raw(data, image.width(), image.height(), image.channels())
}

/// Adds `offsets[k]` to every value of channel `k`.
pub(crate) fn add_const(image: &MultiImage, offsets: &[f64]) -> SlideDetResult<MultiImage> {
    if offsets.len() != image.channels() {
        return Err(SlideDetError::ChannelMismatch {
            image: image.channels(),
            filter: offsets.len(),
        });
    }
    let mut out = image.clone();
    for px in out.data_mut().chunks_exact_mut(offsets.len().max(1)) {
        for (v, o) in px.iter_mut().zip(offsets) {
            *v += o;
        }
    }
    Ok(out)
}

pub(crate) fn scale(image: &MultiImage, factor: f64) -> MultiImage {
    map(image, |v| v * factor)
}

/// `max(v, 0)`.
pub(crate) fn pos_part(image: &MultiImage) -> MultiImage {
    map(image, |v| v.max(0.0))
}

/// Channel `k` becomes channels `2k` (positive part) and `2k + 1`
/// (negated negative part).
pub(crate) fn pos_neg_part(image: &MultiImage) -> SlideDetResult<MultiImage> {
    if image.data().iter().any(|v| v.is_nan()) {
        return Err(SlideDetError::InvalidInput("pos_neg_part input contains NaN"));
    }
    let mut data = Vec::with_capacity(image.data().len() * 2);
    for &v in image.data() {
        if v < 0.0 {
            data.extend([0.0, -v]);
        } else {
            data.extend([v, 0.0]);
        }
    }
    Ok(MultiImage::from_raw(data, image.width(), image.height(), image.channels() * 2))
}

pub(crate) fn is_pos(image: &MultiImage) -> MultiImage {
    map(image, |v| if v > 0.0 { 1.0 } else { 0.0 })
}

/// `1` for positive values, `-1` for negative ones; zero and NaN pass through.
pub(crate) fn sign(image: &MultiImage) -> MultiImage {
    map(image, |v| {
        if v > 0.0 {
            1.0
        } else if v < 0.0 {
            -1.0
        } else {
            v
        }
    })
}

/// Channels `order[0], order[1], ...` of `image`, in that order.
pub(crate) fn select_channels(image: &MultiImage, order: &[usize]) -> SlideDetResult<MultiImage> {
    let c = image.channels();
    if let Some(&bad) = order.iter().find(|&&k| k >= c) {
        return Err(SlideDetError::IndexOutOfBounds {
            index: bad,
            len: c,
            context: "selected channel",
        });
    }
    Ok(MultiImage::from_fn(image.width(), image.height(), order.len(), |x, y, k| {
        image.at(x, y, order[k])
    }))
}

/// Channels `start..end`.
pub(crate) fn channel_interval(image: &MultiImage, start: usize, end: usize) -> SlideDetResult<MultiImage> {
    if start > end {
        return Err(SlideDetError::InvalidInput("channel interval start exceeds end"));
    }
    if end > image.channels() {
        return Err(SlideDetError::IndexOutOfBounds {
            index: end,
            len: image.channels(),
            context: "channel interval",
        });
    }
    let order: Vec<usize> = (start..end).collect();
    select_channels(image, &order)
}

/// Stacks the channels of equally sized images in order.
pub(crate) fn concat(parts: &[MultiImage]) -> SlideDetResult<MultiImage> {
    let first = parts
        .first()
        .ok_or(SlideDetError::InvalidInput("concat needs at least one part"))?;
    let (w, h) = first.size();
    if let Some(bad) = parts.iter().find(|p| p.size() != (w, h)) {
        return Err(SlideDetError::InvalidDimensions {
            width: bad.width(),
            height: bad.height(),
        });
    }
    let channels: usize = parts.iter().map(MultiImage::channels).sum();
    let mut data = Vec::with_capacity(w * h * channels);
    for y in 0..h {
        for x in 0..w {
            for part in parts {
                data.extend_from_slice(part.pixel(x, y));
            }
        }
    }
    Ok(MultiImage::from_raw(data, w, h, channels))
}
