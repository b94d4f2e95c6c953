//! The closed set of built-in feature transforms.

use crate::feature::conv::{adj_chan_norm, conv_each, conv_multi, max_pool};
use crate::feature::hist::grad_hist;
use crate::feature::pointwise::{
    add_const, channel_interval, concat, is_pos, pos_neg_part, pos_part, scale, select_channels, sign,
};
use crate::feature::FeatureTransform;
use crate::image::MultiImage;
use crate::kernel::{Bank, MultiBank};
use crate::util::{SlideDetError, SlideDetResult};

/// Luma weights for red, green and blue.
const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Built-in feature transforms.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Transform {
    /// One luma channel. Single-channel input passes through.
    Gray,
    /// Three colour channels. Single-channel input is replicated.
    Rgb,
    /// Sum of each `cell x cell` block, per channel.
    SumPool { cell: usize },
    /// Histogram of unsigned gradient orientations per `cell x cell` block.
    GradHist { cell: usize, bins: usize },
    /// `outer` applied to the output of `inner`.
    Compose {
        outer: Box<Transform>,
        inner: Box<Transform>,
    },
    /// Correlation with a bank of multi-channel filters every `stride`
    /// pixels, one channel per filter.
    ConvMulti { stride: usize, filters: MultiBank },
    /// Every input channel correlated with every single-channel filter.
    ConvEach { filters: Bank },
    /// Per-channel offset.
    AddConst { offsets: Vec<f64> },
    Scale { factor: f64 },
    /// Maximum over `field` windows every `stride` pixels.
    MaxPool { field: (usize, usize), stride: usize },
    /// `max(v, 0)`.
    PosPart,
    /// Positive and negated negative part, two channels per input channel.
    PosNegPart,
    /// `1` where positive, `0` elsewhere.
    IsPos,
    Sign,
    /// Normalization by the sum of squares over `num` adjacent channels.
    AdjChanNorm { num: usize, k: f64, alpha: f64, beta: f64 },
    /// Channels of every part, in order. All parts share one rate.
    Concat { parts: Vec<Transform> },
    /// Channels `start..end`.
    ChannelInterval { start: usize, end: usize },
    /// The listed channels, in the listed order.
    SelectChannels { channels: Vec<usize> },
}

impl Transform {
    pub fn compose(outer: Transform, inner: Transform) -> Self {
        Transform::Compose {
            outer: Box::new(outer),
            inner: Box::new(inner),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Gray => "gray",
            Transform::Rgb => "rgb",
            Transform::SumPool { .. } => "sum_pool",
            Transform::GradHist { .. } => "grad_hist",
            Transform::Compose { .. } => "compose",
            Transform::ConvMulti { .. } => "conv_multi",
            Transform::ConvEach { .. } => "conv_each",
            Transform::AddConst { .. } => "add_const",
            Transform::Scale { .. } => "scale",
            Transform::MaxPool { .. } => "max_pool",
            Transform::PosPart => "pos_part",
            Transform::PosNegPart => "pos_neg_part",
            Transform::IsPos => "is_pos",
            Transform::Sign => "sign",
            Transform::AdjChanNorm { .. } => "adj_chan_norm",
            Transform::Concat { .. } => "concat",
            Transform::ChannelInterval { .. } => "channel_interval",
            Transform::SelectChannels { .. } => "select_channels",
        }
    }
}

impl FeatureTransform for Transform {
    fn rate(&self) -> usize {
        match self {
            Transform::SumPool { cell } | Transform::GradHist { cell, .. } => *cell,
            Transform::ConvMulti { stride, .. } | Transform::MaxPool { stride, .. } => *stride,
            Transform::Compose { outer, inner } => outer.rate() * inner.rate(),
            Transform::Concat { parts } => parts.first().map_or(1, Transform::rate),
            _ => 1,
        }
    }

    fn channels(&self, input: usize) -> usize {
        match self {
            Transform::Gray => 1,
            Transform::Rgb => 3,
            Transform::SumPool { .. } => input,
            Transform::GradHist { bins, .. } => *bins,
            Transform::Compose { outer, inner } => outer.channels(inner.channels(input)),
            Transform::ConvMulti { filters, .. } => filters.len(),
            Transform::ConvEach { filters } => input * filters.len(),
            Transform::AddConst { .. }
            | Transform::Scale { .. }
            | Transform::MaxPool { .. }
            | Transform::PosPart
            | Transform::IsPos
            | Transform::Sign
            | Transform::AdjChanNorm { .. } => input,
            Transform::PosNegPart => 2 * input,
            Transform::Concat { parts } => parts.iter().map(|p| p.channels(input)).sum(),
            Transform::ChannelInterval { start, end } => end.saturating_sub(*start),
            Transform::SelectChannels { channels } => channels.len(),
        }
    }

    fn apply(&self, image: &MultiImage) -> SlideDetResult<MultiImage> {
        match self {
            Transform::Gray => to_gray(image),
            Transform::Rgb => to_rgb(image),
            Transform::SumPool { cell } => sum_pool(image, *cell),
            Transform::GradHist { cell, bins } => grad_hist(image, *cell, *bins),
            Transform::Compose { outer, inner } => outer.apply(&inner.apply(image)?),
            Transform::ConvMulti { stride, filters } => conv_multi(image, filters, *stride),
            Transform::ConvEach { filters } => conv_each(image, filters),
            Transform::AddConst { offsets } => add_const(image, offsets),
            Transform::Scale { factor } => Ok(scale(image, *factor)),
            Transform::MaxPool { field, stride } => max_pool(image, *field, *stride),
            Transform::PosPart => Ok(pos_part(image)),
            Transform::PosNegPart => pos_neg_part(image),
            Transform::IsPos => Ok(is_pos(image)),
            Transform::Sign => Ok(sign(image)),
            Transform::AdjChanNorm { num, k, alpha, beta } => adj_chan_norm(image, *num, *k, *alpha, *beta),
            Transform::Concat { parts } => {
                let rate = self.rate();
                if parts.iter().any(|p| p.rate() != rate) {
                    return Err(SlideDetError::InvalidInput("concat parts must share one rate"));
                }
                let outputs = parts.iter().map(|p| p.apply(image)).collect::<SlideDetResult<Vec<_>>>()?;
                concat(&outputs)
            }
            Transform::ChannelInterval { start, end } => channel_interval(image, *start, *end),
            Transform::SelectChannels { channels } => select_channels(image, channels),
        }
    }
}

fn to_gray(image: &MultiImage) -> SlideDetResult<MultiImage> {
    match image.channels() {
        1 => Ok(image.clone()),
        3 => Ok(MultiImage::from_fn(image.width(), image.height(), 1, |x, y, _| {
            let p = image.pixel(x, y);
            LUMA[0] * p[0] + LUMA[1] * p[1] + LUMA[2] * p[2]
        })),
        got => Err(SlideDetError::ChannelMismatch {
            image: got,
            filter: 3,
        }),
    }
}

fn to_rgb(image: &MultiImage) -> SlideDetResult<MultiImage> {
    match image.channels() {
        3 => Ok(image.clone()),
        1 => Ok(MultiImage::from_fn(image.width(), image.height(), 3, |x, y, _| {
            image.at(x, y, 0)
        })),
        got => Err(SlideDetError::ChannelMismatch {
            image: got,
            filter: 3,
        }),
    }
}

fn sum_pool(image: &MultiImage, cell: usize) -> SlideDetResult<MultiImage> {
    if cell == 0 {
        return Err(SlideDetError::InvalidInput("sum_pool cell must be positive"));
    }
    let (w, h) = (image.width() / cell, image.height() / cell);
    let channels = image.channels();
    let mut out = MultiImage::new(w, h, channels);
    for j in 0..h {
        for i in 0..w {
            let acc = out.pixel_mut(i, j);
            for y in j * cell..(j + 1) * cell {
                for x in i * cell..(i + 1) * cell {
                    for (a, v) in acc.iter_mut().zip(image.pixel(x, y)) {
                        *a += v;
                    }
                }
            }
        }
    }
    Ok(out)
}
