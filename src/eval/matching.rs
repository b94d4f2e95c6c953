//! Greedy matching of detections to ground truth.

use crate::detect::det::{is_sorted, Det, TmplDet};
use crate::detect::rect::Rect;
use crate::util::{SlideDetError, SlideDetResult};

/// Assigns each detection, best first, to the remaining reference with the
/// highest IOU among those with IOU at least `min_iou`. A matched reference
/// is no longer available to later detections.
///
/// Entry `i` of the result is the reference matched by detection `i`.
/// The assignment is greedy in score order, not a global optimum.
pub fn match_dets(dets: &[Det], refs: &[Rect], min_iou: f64) -> SlideDetResult<Vec<Option<usize>>> {
    if !is_sorted(dets) {
        return Err(SlideDetError::NotSorted { context: "match_dets" });
    }
    let mut remaining: Vec<usize> = (0..refs.len()).collect();
    let mut out = Vec::with_capacity(dets.len());
    for det in dets {
        let mut best = 0.0;
        let mut argmax = None;
        for (pos, &j) in remaining.iter().enumerate() {
            let iou = det.rect.iou(&refs[j]);
            if iou < min_iou {
                continue;
            }
            if iou > best {
                best = iou;
                argmax = Some(pos);
            }
        }
        out.push(argmax.map(|pos| remaining.remove(pos)));
    }
    Ok(out)
}

/// A detection labelled against ground truth.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValDet {
    pub det: Det,
    /// The reference it matched, for a true positive.
    pub truth: Option<Rect>,
}

impl ValDet {
    pub fn is_true(&self) -> bool {
        self.truth.is_some()
    }
}

/// Validation of the detections in one image.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValImage {
    /// Detections in score order, without those excused by ignore regions.
    pub dets: Vec<ValDet>,
    /// References no detection matched.
    pub misses: Vec<Rect>,
}

impl ValImage {
    pub fn num_true(&self) -> usize {
        self.dets.iter().filter(|d| d.is_true()).count()
    }

    pub fn num_false(&self) -> usize {
        self.dets.len() - self.num_true()
    }
}

/// Indices of the detections that are counted, each with the reference it
/// matched, followed by the unmatched references.
type Labels = (Vec<(usize, Option<Rect>)>, Vec<Rect>);

fn label(dets: &[Det], refs: &[Rect], ignore: &[Rect], min_iou: f64, min_ignore_cover: f64) -> SlideDetResult<Labels> {
    let assignment = match_dets(dets, refs, min_iou)?;
    let mut used = vec![false; refs.len()];
    let mut out = Vec::with_capacity(dets.len());
    for (i, (det, m)) in dets.iter().zip(assignment).enumerate() {
        match m {
            Some(j) => {
                used[j] = true;
                out.push((i, Some(refs[j])));
            }
            None => {
                if ignore.iter().any(|r| r.cover(&det.rect) > min_ignore_cover) {
                    continue;
                }
                out.push((i, None));
            }
        }
    }
    let misses = refs
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(r, _)| *r)
        .collect();
    Ok((out, misses))
}

/// Matches `dets` to `refs` and labels them.
///
/// Unmatched detections covered by more than `min_ignore_cover` of their
/// area by any ignore region are dropped instead of counted as false.
/// References left unmatched are misses.
pub fn validate(
    dets: &[Det],
    refs: &[Rect],
    ignore: &[Rect],
    min_iou: f64,
    min_ignore_cover: f64,
) -> SlideDetResult<ValImage> {
    let (labels, misses) = label(dets, refs, ignore, min_iou, min_ignore_cover)?;
    let dets = labels
        .into_iter()
        .map(|(i, truth)| ValDet { det: dets[i], truth })
        .collect();
    Ok(ValImage { dets, misses })
}

/// A labelled detection together with the template that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmplValDet {
    pub val: ValDet,
    pub template: usize,
}

/// Validation of template-tagged detections in one image.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmplValImage {
    pub dets: Vec<TmplValDet>,
    pub misses: Vec<Rect>,
}

impl TmplValImage {
    /// The same labels without template tags.
    pub fn untagged(&self) -> ValImage {
        ValImage {
            dets: self.dets.iter().map(|d| d.val).collect(),
            misses: self.misses.clone(),
        }
    }

    pub fn num_true(&self) -> usize {
        self.dets.iter().filter(|d| d.val.is_true()).count()
    }
}

/// [`validate`] for detections from several templates. Matching ignores
/// the tags; each labelled detection keeps its template index.
pub fn validate_tagged(
    dets: &[TmplDet],
    refs: &[Rect],
    ignore: &[Rect],
    min_iou: f64,
    min_ignore_cover: f64,
) -> SlideDetResult<TmplValImage> {
    let plain: Vec<Det> = dets.iter().map(|d| d.det).collect();
    let (labels, misses) = label(&plain, refs, ignore, min_iou, min_ignore_cover)?;
    let dets = labels
        .into_iter()
        .map(|(i, truth)| TmplValDet {
            val: ValDet { det: plain[i], truth },
            template: dets[i].template,
        })
        .collect();
    Ok(TmplValImage { dets, misses })
}
