//! Detection followed by validation, per image and per batch.

use crate::detect::rect::Rect;
use crate::detect::search::{detect_multi_scale, MultiScaleConfig};
use crate::detect::template::FeatTemplate;
use crate::eval::matching::{validate, ValImage};
use crate::feature::FeatureTransform;
use crate::image::MultiImage;
use crate::trace::{trace_event, trace_span};
use crate::util::SlideDetResult;

/// Thresholds for labelling detections.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidateConfig {
    /// Minimum IOU for a detection to match a reference.
    pub min_iou: f64,
    /// Unmatched detections covered beyond this by an ignore region are
    /// not counted.
    pub min_ignore_cover: f64,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            min_iou: 0.5,
            min_ignore_cover: 0.0,
        }
    }
}

/// An image with its annotations.
#[derive(Clone, Debug)]
pub struct Annotated {
    pub image: MultiImage,
    pub refs: Vec<Rect>,
    pub ignore: Vec<Rect>,
}

/// Detects in one image and validates against its annotations.
pub fn evaluate_image<T: FeatureTransform + Sync>(
    item: &Annotated,
    tmpl: &FeatTemplate,
    transform: &T,
    search: &MultiScaleConfig,
    val: &ValidateConfig,
) -> SlideDetResult<ValImage> {
    let _span = trace_span!("evaluate_image", refs = item.refs.len()).entered();
    let dets = detect_multi_scale(&item.image, tmpl, transform, search)?;
    let out = validate(&dets, &item.refs, &item.ignore, val.min_iou, val.min_ignore_cover)?;
    trace_event!(
        "validated",
        true_pos = out.num_true(),
        false_pos = out.num_false(),
        misses = out.misses.len()
    );
    Ok(out)
}

/// [`evaluate_image`] over many images, in parallel with `rayon`. Each
/// image succeeds or fails on its own.
pub fn evaluate_batch<T: FeatureTransform + Sync>(
    items: &[Annotated],
    tmpl: &FeatTemplate,
    transform: &T,
    search: &MultiScaleConfig,
    val: &ValidateConfig,
) -> Vec<SlideDetResult<ValImage>> {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        items
            .par_iter()
            .map(|item| evaluate_image(item, tmpl, transform, search, val))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        items
            .iter()
            .map(|item| evaluate_image(item, tmpl, transform, search, val))
            .collect()
    }
}
