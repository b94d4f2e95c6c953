//! Greedy non-maximum suppression.
//!
//! Repeatedly keep the best remaining candidate and drop every later
//! candidate that it overlaps. Input must be sorted by descending score.

use crate::detect::det::Det;
use crate::detect::overlap::OverlapTest;
use crate::detect::rect::Rect;
use crate::trace::trace_debug;
use crate::util::{SlideDetError, SlideDetResult};

/// Greedy suppression over `n` candidates in priority order, where
/// `overlaps(i, j)` with `i < j` decides whether `i` suppresses `j`.
pub(crate) fn suppress_by(
    n: usize,
    max_num: Option<usize>,
    mut overlaps: impl FnMut(usize, usize) -> bool,
) -> Vec<usize> {
    let mut removed = vec![false; n];
    let mut keep = Vec::new();
    for i in 0..n {
        if max_num.is_some_and(|m| keep.len() >= m) {
            break;
        }
        if removed[i] {
            continue;
        }
        keep.push(i);
        for j in i + 1..n {
            if !removed[j] && overlaps(i, j) {
                removed[j] = true;
            }
        }
    }
    keep
}

/// Indices of the detections that survive suppression, in score order.
///
/// `max_num` caps the number kept.
pub fn suppress_indices(
    dets: &[Det],
    max_num: Option<usize>,
    overlap: &impl OverlapTest,
) -> SlideDetResult<Vec<usize>> {
    suppress_rects_indices(dets, |d| d.rect, |d| d.score, max_num, overlap)
}

/// Generic form of [`suppress_indices`] for any score-ordered items.
pub fn suppress_rects_indices<T>(
    items: &[T],
    rect: impl Fn(&T) -> Rect,
    score: impl Fn(&T) -> f64,
    max_num: Option<usize>,
    overlap: &impl OverlapTest,
) -> SlideDetResult<Vec<usize>> {
    if !items.windows(2).all(|w| score(&w[0]) >= score(&w[1])) {
        return Err(SlideDetError::NotSorted { context: "suppress" });
    }
    let rects: Vec<Rect> = items.iter().map(rect).collect();
    let keep = suppress_by(rects.len(), max_num, |i, j| overlap.overlaps(&rects[i], &rects[j]));
    trace_debug!("nms", candidates = items.len(), kept = keep.len());
    Ok(keep)
}

/// Detections that survive suppression, in score order.
pub fn suppress(
    dets: &[Det],
    max_num: Option<usize>,
    overlap: &impl OverlapTest,
) -> SlideDetResult<Vec<Det>> {
    let keep = suppress_indices(dets, max_num, overlap)?;
    Ok(keep.into_iter().map(|i| dets[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::{suppress, suppress_indices};
    use crate::detect::det::Det;
    use crate::detect::overlap::Overlap;
    use crate::detect::rect::Rect;

    #[test]
    fn disjoint_boxes_all_survive() {
        let dets = vec![
            Det::new(4.0, Rect::from_size(0, 0, 5, 5)),
            Det::new(3.0, Rect::from_size(10, 0, 5, 5)),
            Det::new(2.0, Rect::from_size(0, 10, 5, 5)),
            Det::new(1.0, Rect::from_size(10, 10, 5, 5)),
        ];
        let kept = suppress(&dets, Some(10), &Overlap::CoverBoth(0.0)).unwrap();
        assert_eq!(kept, dets);
    }

    #[test]
    fn cap_limits_output() {
        let dets: Vec<_> = (0..5)
            .map(|i| Det::new(10.0 - i as f64, Rect::from_size(10 * i, 0, 5, 5)))
            .collect();
        let kept = suppress_indices(&dets, Some(2), &Overlap::Iou(0.5)).unwrap();
        assert_eq!(kept, vec![0, 1]);
        assert_eq!(suppress_indices(&dets, Some(0), &Overlap::Iou(0.5)).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn unsorted_input_is_an_error() {
        let dets = vec![
            Det::new(1.0, Rect::from_size(0, 0, 1, 1)),
            Det::new(2.0, Rect::from_size(0, 0, 1, 1)),
        ];
        assert!(suppress_indices(&dets, None, &Overlap::Iou(0.5)).is_err());
    }
}
