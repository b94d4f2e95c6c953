//! Suppression over pyramid candidates with a spatial lookup table.
//!
//! Every candidate is indexed by its level and feature cell. When a
//! candidate is kept, only the cells whose windows could intersect it are
//! probed on each level. The bound is derived from the same mapping as
//! [`PyramidGeometry::to_image_rect`] and widened by one cell on each side,
//! so for any predicate that requires a positive-area intersection the
//! result is identical to exhaustive suppression.

use crate::detect::nms::suppress_rects_indices;
use crate::detect::overlap::OverlapTest;
use crate::detect::points::PyrDet;
use crate::detect::rect::Rect;
use crate::feature::PyramidGeometry;
use crate::trace::trace_debug;
use crate::util::{SlideDetError, SlideDetResult};

/// Image rectangles of pyramid candidates.
pub fn candidate_rects(cands: &[PyrDet], geometry: &PyramidGeometry, interior: &Rect) -> Vec<Rect> {
    cands
        .iter()
        .map(|c| geometry.to_image_rect(c.point, interior))
        .collect()
}

/// Exhaustive suppression of score-sorted pyramid candidates.
pub fn suppress_pyramid_exhaustive(
    cands: &[PyrDet],
    geometry: &PyramidGeometry,
    interior: &Rect,
    max_num: Option<usize>,
    overlap: &impl OverlapTest,
) -> SlideDetResult<Vec<usize>> {
    let rects = candidate_rects(cands, geometry, interior);
    let idx: Vec<usize> = (0..cands.len()).collect();
    suppress_rects_indices(&idx, |&i| rects[i], |&i| cands[i].score, max_num, overlap)
}

struct Table {
    levels: Vec<(usize, usize, Vec<Vec<usize>>)>,
}

impl Table {
    fn new(sizes: &[(usize, usize)], cands: &[PyrDet]) -> SlideDetResult<Self> {
        let mut levels: Vec<_> = sizes
            .iter()
            .map(|&(w, h)| (w, h, vec![Vec::new(); w * h]))
            .collect();
        for (i, cand) in cands.iter().enumerate() {
            let p = cand.point;
            let num_levels = levels.len();
            let (w, h, cells) = levels.get_mut(p.level).ok_or(SlideDetError::IndexOutOfBounds {
                index: p.level,
                len: num_levels,
                context: "candidate level",
            })?;
            if p.x >= *w || p.y >= *h {
                return Err(SlideDetError::IndexOutOfBounds {
                    index: p.y * *w + p.x,
                    len: *w * *h,
                    context: "candidate position",
                });
            }
            cells[p.y * *w + p.x].push(i);
        }
        Ok(Self { levels })
    }
}

/// Range of feature cells `[lo, hi)` along one axis whose windows may
/// intersect the pixel interval `px` at a level of the given scale.
fn cell_span(px: (i64, i64), int: (i64, i64), margin: usize, scale: f64, rate: f64, len: usize) -> (usize, usize) {
    let lo = ((px.0 as f64 - 0.5) * scale - int.1 as f64 + margin as f64) / rate;
    let hi = ((px.1 as f64 + 0.5) * scale - int.0 as f64 + margin as f64) / rate;
    let lo = lo.floor() as i64 - 1;
    let hi = hi.ceil() as i64 + 1;
    (lo.clamp(0, len as i64) as usize, hi.clamp(0, len as i64) as usize)
}

/// Indexed suppression of score-sorted pyramid candidates.
///
/// `sizes` holds the response-map size of each level; every candidate must
/// lie inside its level. Output equals [`suppress_pyramid_exhaustive`]
/// whenever `overlap` only holds for rectangles with a positive-area
/// intersection.
pub fn suppress_pyramid_indexed(
    cands: &[PyrDet],
    sizes: &[(usize, usize)],
    geometry: &PyramidGeometry,
    interior: &Rect,
    max_num: Option<usize>,
    overlap: &impl OverlapTest,
) -> SlideDetResult<Vec<usize>> {
    if !cands.windows(2).all(|w| w[0].score >= w[1].score) {
        return Err(SlideDetError::NotSorted {
            context: "suppress_pyramid_indexed",
        });
    }
    if sizes.len() > geometry.num_levels() {
        return Err(SlideDetError::IndexOutOfBounds {
            index: sizes.len(),
            len: geometry.num_levels(),
            context: "response levels",
        });
    }
    let table = Table::new(sizes, cands)?;
    let rects = candidate_rects(cands, geometry, interior);
    let rate = geometry.rate as f64;
    let (mx, my) = geometry.margin.top_left();

    let mut removed = vec![false; cands.len()];
    let mut keep = Vec::new();
    let mut probes = 0usize;
    for i in 0..cands.len() {
        if max_num.is_some_and(|m| keep.len() >= m) {
            break;
        }
        if removed[i] {
            continue;
        }
        keep.push(i);
        let r = rects[i];
        for (k, (w, h, cells)) in table.levels.iter().enumerate() {
            let s = geometry.scales[k];
            let (x0, x1) = cell_span((r.x0, r.x1), (interior.x0, interior.x1), mx, s, rate, *w);
            let (y0, y1) = cell_span((r.y0, r.y1), (interior.y0, interior.y1), my, s, rate, *h);
            for y in y0..y1 {
                for x in x0..x1 {
                    for &j in &cells[y * w + x] {
                        probes += 1;
                        if j > i && !removed[j] && overlap.overlaps(&r, &rects[j]) {
                            removed[j] = true;
                        }
                    }
                }
            }
        }
    }
    trace_debug!("nms_indexed", candidates = cands.len(), kept = keep.len(), probes = probes);
    Ok(keep)
}
