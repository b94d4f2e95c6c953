//! Templates scored in feature space with known pixel geometry.

use crate::detect::rect::{PadRect, Rect};
use crate::kernel::scorer::{AffineScorer, Scorer};

/// An affine template plus the window it was trained on.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatTemplate {
    pub scorer: AffineScorer,
    /// Pixel size of the training window and the object box inside it.
    pub pixel_shape: PadRect,
}

impl FeatTemplate {
    pub fn new(scorer: AffineScorer, pixel_shape: PadRect) -> Self {
        Self {
            scorer,
            pixel_shape,
        }
    }

    /// Template size in feature cells.
    pub fn feat_size(&self) -> (usize, usize) {
        self.scorer.size()
    }

    /// Template size in pixels.
    pub fn pixel_size(&self) -> (usize, usize) {
        let (w, h) = self.pixel_shape.size;
        (w.max(0) as usize, h.max(0) as usize)
    }

    pub fn interior(&self) -> &Rect {
        &self.pixel_shape.interior
    }
}
