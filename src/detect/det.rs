//! Scored detections and score-ordered lists.

use std::cmp::Ordering;

use crate::detect::rect::Rect;
use crate::util::math::is_sorted_desc;
use crate::util::{SlideDetError, SlideDetResult};

/// A scored rectangle in original image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Det {
    pub score: f64,
    pub rect: Rect,
}

impl Det {
    pub fn new(score: f64, rect: Rect) -> Self {
        Self { score, rect }
    }
}

/// A detection tagged with the index of the template that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmplDet {
    pub det: Det,
    pub template: usize,
}

impl TmplDet {
    pub fn new(det: Det, template: usize) -> Self {
        Self { det, template }
    }
}

/// Position of the first NaN produced by `score`, if any.
pub(crate) fn find_nan<T>(items: &[T], score: impl Fn(&T) -> f64) -> SlideDetResult<()> {
    match items.iter().position(|item| score(item).is_nan()) {
        Some(index) => Err(SlideDetError::NanScore { index }),
        None => Ok(()),
    }
}

/// Stable sort by descending score.
pub(crate) fn sort_desc_by<T>(items: &mut [T], score: impl Fn(&T) -> f64) -> SlideDetResult<()> {
    find_nan(items, &score)?;
    items.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
    Ok(())
}

/// Sorts by descending score. Ties keep their relative order.
pub fn sort_dets(dets: &mut [Det]) -> SlideDetResult<()> {
    sort_desc_by(dets, |d| d.score)
}

pub fn is_sorted(dets: &[Det]) -> bool {
    is_sorted_desc(dets, |d| d.score)
}

/// Merges two lists sorted by descending score. On equal scores the
/// element of `b` comes first.
pub fn merge_dets(a: &[Det], b: &[Det]) -> SlideDetResult<Vec<Det>> {
    if !is_sorted(a) || !is_sorted(b) {
        return Err(SlideDetError::NotSorted {
            context: "merge_dets",
        });
    }
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].score > b[j].score {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    Ok(out)
}

/// Concatenates any number of lists and sorts the result.
pub fn merge_all_dets(lists: &[Vec<Det>]) -> SlideDetResult<Vec<Det>> {
    match lists {
        [] => Ok(Vec::new()),
        [a] => Ok(a.clone()),
        [a, b] => merge_dets(a, b),
        _ => {
            let mut all: Vec<Det> = lists.iter().flatten().copied().collect();
            sort_dets(&mut all)?;
            Ok(all)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_all_dets, merge_dets, sort_dets, Det};
    use crate::detect::rect::Rect;
    use crate::util::SlideDetError;

    fn det(score: f64) -> Det {
        Det::new(score, Rect::from_size(0, 0, 1, 1))
    }

    fn scores(dets: &[Det]) -> Vec<f64> {
        dets.iter().map(|d| d.score).collect()
    }

    #[test]
    fn sort_is_descending() {
        let mut dets = vec![det(1.0), det(3.0), det(2.0)];
        sort_dets(&mut dets).unwrap();
        assert_eq!(scores(&dets), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn sort_rejects_nan() {
        let mut dets = vec![det(1.0), det(f64::NAN)];
        assert_eq!(sort_dets(&mut dets), Err(SlideDetError::NanScore { index: 1 }));
    }

    #[test]
    fn merge_interleaves() {
        let a = vec![det(5.0), det(3.0), det(1.0)];
        let b = vec![det(4.0), det(3.0), det(0.0)];
        let c = merge_dets(&a, &b).unwrap();
        assert_eq!(scores(&c), vec![5.0, 4.0, 3.0, 3.0, 1.0, 0.0]);
        let all = merge_all_dets(&[a.clone(), b, vec![det(2.0)]]).unwrap();
        assert_eq!(scores(&all), vec![5.0, 4.0, 3.0, 3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn merge_rejects_unsorted() {
        let a = vec![det(1.0), det(2.0)];
        assert!(merge_dets(&a, &[]).is_err());
    }
}
