//! Candidate extraction from response maps.

use crate::feature::PyrPoint;
use crate::image::{Image, MultiImage};
use crate::kernel::scorer::Scorer;
use crate::trace::trace_debug;
use crate::util::SlideDetResult;

/// Scored window position in one response map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredPoint {
    pub score: f64,
    pub x: usize,
    pub y: usize,
}

/// Scored window position in a feature pyramid.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PyrDet {
    pub score: f64,
    pub point: PyrPoint,
}

/// Which positions of a response map become candidates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointFilter {
    /// Keep only positions no 4-neighbour beats.
    pub local_max: bool,
    /// Drop scores below this.
    pub min_score: f64,
}

impl Default for PointFilter {
    fn default() -> Self {
        Self {
            local_max: true,
            min_score: f64::NEG_INFINITY,
        }
    }
}

fn is_local_max(resp: &Image, x: usize, y: usize, score: f64) -> bool {
    let (w, h) = resp.size();
    !((x > 0 && score < resp.at(x - 1, y))
        || (y > 0 && score < resp.at(x, y - 1))
        || (x + 1 < w && score < resp.at(x + 1, y))
        || (y + 1 < h && score < resp.at(x, y + 1)))
}

/// Candidates of one response map, in raster order.
pub fn points(resp: &Image, filter: &PointFilter) -> Vec<ScoredPoint> {
    let mut out = Vec::new();
    for y in 0..resp.height() {
        for x in 0..resp.width() {
            let score = resp.at(x, y);
            if score < filter.min_score {
                continue;
            }
            if filter.local_max && !is_local_max(resp, x, y, score) {
                continue;
            }
            out.push(ScoredPoint { score, x, y });
        }
    }
    out
}

/// Slides `scorer` over each level until the first level it does not fit.
pub fn eval_levels<S: Scorer + ?Sized>(feats: &[MultiImage], scorer: &S) -> SlideDetResult<Vec<Image>> {
    let (tw, th) = scorer.size();
    let mut resps = Vec::with_capacity(feats.len());
    for feat in feats {
        if feat.width() < tw || feat.height() < th {
            break;
        }
        resps.push(scorer.slide(feat)?);
    }
    trace_debug!("eval_levels", levels = resps.len());
    Ok(resps)
}

/// Candidates of every response map, tagged with their level.
pub fn pyramid_points(resps: &[Image], filter: &PointFilter) -> Vec<PyrDet> {
    let mut out = Vec::new();
    for (level, resp) in resps.iter().enumerate() {
        out.extend(points(resp, filter).into_iter().map(|p| PyrDet {
            score: p.score,
            point: PyrPoint::new(level, p.x, p.y),
        }));
    }
    trace_debug!("pyramid_points", candidates = out.len());
    out
}
