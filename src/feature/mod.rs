//! Feature transforms and feature pyramids.
//!
//! A transform maps pixels to feature cells at an integer downsample rate
//! `r`. Every transform here satisfies the inset contract: cropping the
//! input by `r * (left, top, right, bottom)` pixels crops the output by
//! exactly `(left, top, right, bottom)` cells. Detections found in feature
//! space are mapped back to pixels by [`PyramidGeometry::to_image_rect`].

mod conv;
pub mod hist;
pub mod pad;
mod pointwise;
pub mod pyramid;
pub mod transform;

pub use pad::{Extend, Margin, Pad};
pub use pyramid::{FeatureLevel, FeaturePyramid, FeaturePyramidGenerator, PyrPoint, PyramidGeometry};
pub use transform::Transform;

use crate::image::MultiImage;
use crate::util::SlideDetResult;

/// Pixels-to-features map with an integer downsample rate.
pub trait FeatureTransform {
    /// Pixels per feature cell along each axis.
    fn rate(&self) -> usize;

    /// Output channels for an input with `input` channels.
    fn channels(&self, input: usize) -> usize;

    fn apply(&self, image: &MultiImage) -> SlideDetResult<MultiImage>;

    /// Pads `image` and then applies the transform.
    fn apply_pad(&self, image: &MultiImage, pad: &Pad) -> SlideDetResult<MultiImage> {
        if pad.margin.is_zero() {
            return self.apply(image);
        }
        self.apply(&pad.apply(image))
    }
}

impl<T: FeatureTransform + ?Sized> FeatureTransform for &T {
    fn rate(&self) -> usize {
        (**self).rate()
    }

    fn channels(&self, input: usize) -> usize {
        (**self).channels(input)
    }

    fn apply(&self, image: &MultiImage) -> SlideDetResult<MultiImage> {
        (**self).apply(image)
    }
}
