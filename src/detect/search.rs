//! Multi-scale sliding-window detection.
//!
//! Per image: build the feature pyramid, slide the template over every level
//! it fits, extract candidates, map them to image rectangles and suppress
//! overlaps.

use crate::detect::det::{sort_desc_by, Det, TmplDet};
use crate::detect::lookup::{suppress_pyramid_exhaustive, suppress_pyramid_indexed};
use crate::detect::nms::suppress_rects_indices;
use crate::detect::overlap::Overlap;
use crate::detect::points::{eval_levels, pyramid_points, PointFilter, PyrDet};
use crate::detect::template::FeatTemplate;
use crate::feature::{FeaturePyramid, FeaturePyramidGenerator, FeatureTransform, Pad};
use crate::image::pyramid::{scales, ImagePyramidGenerator};
use crate::image::resize::Interp;
use crate::image::{Image, MultiImage};
use crate::kernel::scorer::Scorer;
use crate::trace::{trace_event, trace_span};
use crate::util::{SlideDetError, SlideDetResult};

/// Candidate filtering and suppression options.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectConfig {
    /// Keep only 4-neighbour local maxima of each response map.
    pub local_max: bool,
    /// Candidates scoring below this are dropped.
    pub min_score: f64,
    /// Maximum number of detections returned; `None` keeps all.
    pub max_num: Option<usize>,
    /// Suppression criterion.
    pub overlap: Overlap,
    /// Use the per-level lookup table instead of all pairs.
    pub indexed_nms: bool,
    /// Evaluate pyramid levels in parallel (requires `rayon`).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            local_max: true,
            min_score: f64::NEG_INFINITY,
            max_num: None,
            overlap: Overlap::default(),
            indexed_nms: true,
            parallel: false,
        }
    }
}

impl DetectConfig {
    fn point_filter(&self) -> PointFilter {
        PointFilter {
            local_max: self.local_max,
            min_score: self.min_score,
        }
    }
}

/// Pyramid construction options for [`detect_multi_scale`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MultiScaleConfig {
    /// Largest magnification searched.
    pub max_scale: f64,
    /// Ratio between consecutive scales, greater than 1.
    pub scale_step: f64,
    pub interp: Interp,
    /// Padding applied to each level before the feature transform.
    pub pad: Pad,
    pub detect: DetectConfig,
}

impl Default for MultiScaleConfig {
    fn default() -> Self {
        Self {
            max_scale: 1.0,
            scale_step: 1.2,
            interp: Interp::default(),
            pad: Pad::default(),
            detect: DetectConfig::default(),
        }
    }
}

fn responses<S: Scorer + Sync + ?Sized>(
    feats: &[MultiImage],
    scorer: &S,
    parallel: bool,
) -> SlideDetResult<Vec<Image>> {
    #[cfg(feature = "rayon")]
    if parallel {
        use rayon::prelude::*;
        let (tw, th) = scorer.size();
        let fit = feats
            .iter()
            .position(|f| f.width() < tw || f.height() < th)
            .unwrap_or(feats.len());
        return feats[..fit].par_iter().map(|f| scorer.slide(f)).collect();
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;
    eval_levels(feats, scorer)
}

/// Surviving candidates of a feature pyramid, best first, in feature space.
pub fn detect_points(
    pyr: &FeaturePyramid,
    tmpl: &FeatTemplate,
    cfg: &DetectConfig,
) -> SlideDetResult<Vec<PyrDet>> {
    let _span = trace_span!("detect_points", levels = pyr.len()).entered();
    let resps = responses(pyr.feats(), &tmpl.scorer, cfg.parallel)?;
    let mut cands = pyramid_points(&resps, &cfg.point_filter());
    sort_desc_by(&mut cands, |c| c.score)?;

    let geometry = pyr.geometry();
    let interior = tmpl.interior();
    let keep = if cfg.indexed_nms && cfg.overlap.needs_intersection() {
        let sizes: Vec<_> = resps.iter().map(|r| r.size()).collect();
        suppress_pyramid_indexed(&cands, &sizes, geometry, interior, cfg.max_num, &cfg.overlap)?
    } else {
        suppress_pyramid_exhaustive(&cands, geometry, interior, cfg.max_num, &cfg.overlap)?
    };
    trace_event!("detect_points_done", candidates = cands.len(), kept = keep.len());
    Ok(keep.into_iter().map(|i| cands[i]).collect())
}

/// Detections of a feature pyramid in image pixels, best first.
pub fn detect_pyramid(
    pyr: &FeaturePyramid,
    tmpl: &FeatTemplate,
    cfg: &DetectConfig,
) -> SlideDetResult<Vec<Det>> {
    let points = detect_points(pyr, tmpl, cfg)?;
    let geometry = pyr.geometry();
    Ok(points
        .into_iter()
        .map(|p| Det::new(p.score, geometry.to_image_rect(p.point, tmpl.interior())))
        .collect())
}

/// Builds the feature pyramid for `image` and runs [`detect_pyramid`].
///
/// Scales run from `max_scale` down until the image is smaller than the
/// template's pixel size. Returns no detections when not even the first
/// scale fits.
pub fn detect_multi_scale<T: FeatureTransform + Sync>(
    image: &MultiImage,
    tmpl: &FeatTemplate,
    transform: &T,
    cfg: &MultiScaleConfig,
) -> SlideDetResult<Vec<Det>> {
    let _span = trace_span!("detect_multi_scale", width = image.width(), height = image.height()).entered();
    let seq = scales(image.size(), tmpl.pixel_size(), cfg.max_scale, cfg.scale_step)?;
    if seq.is_empty() {
        return Ok(Vec::new());
    }
    let images = ImagePyramidGenerator::from_seq(image, seq, cfg.interp)?;
    let gen = FeaturePyramidGenerator::new(images, transform, cfg.pad);
    let pyr = build_pyramid(&gen, cfg.detect.parallel)?;
    detect_pyramid(&pyr, tmpl, &cfg.detect)
}

/// Searches one image for several templates at once.
///
/// A single pyramid is built, with scales stopping once the image is
/// smaller than the smallest template width and the smallest template
/// height. Every template is scored on the levels it fits; detections of
/// all templates are then suppressed together, so a strong response of one
/// template can remove an overlapping response of another. Each detection
/// is tagged with the index of its template.
///
/// The lookup table behind `indexed_nms` assumes one template interior, so
/// suppression here always compares all pairs.
pub fn detect_multi_scale_many<T: FeatureTransform + Sync>(
    image: &MultiImage,
    tmpls: &[FeatTemplate],
    transform: &T,
    cfg: &MultiScaleConfig,
) -> SlideDetResult<Vec<TmplDet>> {
    let _span = trace_span!(
        "detect_multi_scale_many",
        width = image.width(),
        height = image.height(),
        templates = tmpls.len()
    )
    .entered();
    let min_dims = tmpls
        .iter()
        .map(FeatTemplate::pixel_size)
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1)))
        .ok_or(SlideDetError::InvalidInput("at least one template is required"))?;
    let seq = scales(image.size(), min_dims, cfg.max_scale, cfg.scale_step)?;
    if seq.is_empty() {
        return Ok(Vec::new());
    }
    let images = ImagePyramidGenerator::from_seq(image, seq, cfg.interp)?;
    let gen = FeaturePyramidGenerator::new(images, transform, cfg.pad);
    let pyr = build_pyramid(&gen, cfg.detect.parallel)?;
    let geometry = pyr.geometry();

    let mut cands = Vec::new();
    for (t, tmpl) in tmpls.iter().enumerate() {
        let resps = responses(pyr.feats(), &tmpl.scorer, cfg.detect.parallel)?;
        cands.extend(pyramid_points(&resps, &cfg.detect.point_filter()).into_iter().map(|p| {
            let rect = geometry.to_image_rect(p.point, tmpl.interior());
            TmplDet::new(Det::new(p.score, rect), t)
        }));
    }
    sort_desc_by(&mut cands, |d| d.det.score)?;
    let keep = suppress_rects_indices(
        &cands,
        |d| d.det.rect,
        |d| d.det.score,
        cfg.detect.max_num,
        &cfg.detect.overlap,
    )?;
    trace_event!("detect_many_done", candidates = cands.len(), kept = keep.len());
    Ok(keep.into_iter().map(|i| cands[i]).collect())
}

fn build_pyramid<T: FeatureTransform + Sync>(
    gen: &FeaturePyramidGenerator<'_, T>,
    parallel: bool,
) -> SlideDetResult<FeaturePyramid> {
    #[cfg(feature = "rayon")]
    if parallel {
        return FeaturePyramid::build_par(gen);
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;
    FeaturePyramid::build(gen)
}

/// Runs [`detect_multi_scale`] on every image. Images are independent and
/// processed in parallel with `rayon`; each result is reported separately.
pub fn detect_batch<T: FeatureTransform + Sync>(
    images: &[MultiImage],
    tmpl: &FeatTemplate,
    transform: &T,
    cfg: &MultiScaleConfig,
) -> Vec<SlideDetResult<Vec<Det>>> {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        images
            .par_iter()
            .map(|im| detect_multi_scale(im, tmpl, transform, cfg))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        images
            .iter()
            .map(|im| detect_multi_scale(im, tmpl, transform, cfg))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{detect_multi_scale, detect_multi_scale_many, detect_pyramid, DetectConfig, MultiScaleConfig};
    use crate::detect::overlap::Overlap;
    use crate::detect::rect::{PadRect, Rect};
    use crate::detect::template::FeatTemplate;
    use crate::feature::{FeaturePyramid, FeaturePyramidGenerator, Pad, Transform};
    use crate::image::pyramid::ImagePyramidGenerator;
    use crate::image::resize::Interp;
    use crate::image::MultiImage;
    use crate::kernel::scorer::AffineScorer;

    fn blob_image() -> MultiImage {
        MultiImage::from_fn(32, 24, 1, |x, y, _| {
            if (12..16).contains(&x) && (8..12).contains(&y) {
                1.0
            } else {
                0.0
            }
        })
    }

    fn box_template() -> FeatTemplate {
        let weights = MultiImage::from_fn(4, 4, 1, |_, _, _| 1.0);
        FeatTemplate::new(
            AffineScorer::new(weights, -8.0),
            PadRect::new((4, 4), Rect::new(0, 0, 4, 4)),
        )
    }

    #[test]
    fn single_level_finds_the_blob() {
        let image = blob_image();
        let images = ImagePyramidGenerator::new(&image, &[1.0], Interp::Nearest).unwrap();
        let gen = FeaturePyramidGenerator::new(images, Transform::Gray, Pad::default());
        let pyr = FeaturePyramid::build(&gen).unwrap();
        let cfg = DetectConfig {
            min_score: 0.0,
            overlap: Overlap::Iou(0.0),
            ..DetectConfig::default()
        };
        let dets = detect_pyramid(&pyr, &box_template(), &cfg).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].rect, Rect::new(12, 8, 16, 12));
        assert!((dets[0].score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn indexed_and_exhaustive_agree() {
        let image = MultiImage::from_fn(48, 40, 1, |x, y, _| (((x * 7) ^ (y * 3)) % 13) as f64);
        let tmpl = box_template();
        let mut cfg = MultiScaleConfig {
            scale_step: 1.2,
            interp: Interp::Bilinear,
            ..MultiScaleConfig::default()
        };
        cfg.detect.overlap = Overlap::CoverBoth(0.5);
        let a = detect_multi_scale(&image, &tmpl, &Transform::Gray, &cfg).unwrap();
        cfg.detect.indexed_nms = false;
        let b = detect_multi_scale(&image, &tmpl, &Transform::Gray, &cfg).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn template_larger_than_image_gives_nothing() {
        let image = MultiImage::new(3, 3, 1);
        let dets = detect_multi_scale(&image, &box_template(), &Transform::Gray, &MultiScaleConfig::default()).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn one_template_matches_single_search() {
        let image = MultiImage::from_fn(48, 40, 1, |x, y, _| (((x * 5) ^ (y * 11)) % 7) as f64);
        let tmpl = box_template();
        let mut cfg = MultiScaleConfig {
            interp: Interp::Bilinear,
            ..MultiScaleConfig::default()
        };
        cfg.detect.indexed_nms = false;
        cfg.detect.max_num = Some(6);
        let single = detect_multi_scale(&image, &tmpl, &Transform::Gray, &cfg).unwrap();
        let many = detect_multi_scale_many(&image, std::slice::from_ref(&tmpl), &Transform::Gray, &cfg).unwrap();
        assert!(!single.is_empty());
        assert!(many.iter().all(|d| d.template == 0));
        let dets: Vec<_> = many.iter().map(|d| d.det).collect();
        assert_eq!(dets, single);
    }

    #[test]
    fn no_templates_is_an_error() {
        let image = blob_image();
        assert!(detect_multi_scale_many(&image, &[], &Transform::Gray, &MultiScaleConfig::default()).is_err());
    }
}
