//! Overlap predicates for non-maximum suppression.
//!
//! The first argument is always the higher-scoring rectangle.

use crate::detect::rect::Rect;

/// Decides whether a lower-scoring rectangle is suppressed by a higher one.
pub trait OverlapTest {
    fn overlaps(&self, higher: &Rect, lower: &Rect) -> bool;
}

impl<F> OverlapTest for F
where
    F: Fn(&Rect, &Rect) -> bool,
{
    fn overlaps(&self, higher: &Rect, lower: &Rect) -> bool {
        self(higher, lower)
    }
}

/// Built-in overlap criteria. All comparisons are strict, so rectangles
/// that only touch never overlap for a non-negative threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "threshold", rename_all = "snake_case"))]
pub enum Overlap {
    /// Intersection over union above the threshold.
    Iou(f64),
    /// Intersection covers more than the threshold of both rectangles.
    CoverBoth(f64),
    /// Intersection covers more than the threshold of either rectangle.
    CoverEither(f64),
}

impl Default for Overlap {
    fn default() -> Self {
        Overlap::Iou(0.3)
    }
}

impl Overlap {
    pub fn threshold(&self) -> f64 {
        match *self {
            Overlap::Iou(t) | Overlap::CoverBoth(t) | Overlap::CoverEither(t) => t,
        }
    }

    /// True when the predicate can only hold for a positive-area intersection.
    pub fn needs_intersection(&self) -> bool {
        self.threshold() >= 0.0
    }
}

impl OverlapTest for Overlap {
    fn overlaps(&self, higher: &Rect, lower: &Rect) -> bool {
        match *self {
            Overlap::Iou(t) => higher.iou(lower) > t,
            Overlap::CoverBoth(t) => higher.cover(lower) > t && lower.cover(higher) > t,
            Overlap::CoverEither(t) => higher.cover(lower) > t || lower.cover(higher) > t,
        }
    }
}
