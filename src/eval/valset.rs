//! Aggregated validation results across images.

use crate::eval::matching::{TmplValImage, ValImage};
use crate::eval::perf::{Perf, PerfPath};
use crate::trace::trace_debug;
use crate::util::math::is_sorted_desc;
use crate::util::{SlideDetError, SlideDetResult};

/// Score and correctness of one detection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValScore {
    pub score: f64,
    pub truth: bool,
}

impl ValScore {
    pub fn new(score: f64, truth: bool) -> Self {
        Self { score, truth }
    }
}

/// Validated detections of a set of images.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValSet {
    /// Ordered by descending score.
    pub dets: Vec<ValScore>,
    /// Missed references.
    pub misses: usize,
    /// Images the set was computed over.
    pub images: usize,
}

impl From<&ValImage> for ValSet {
    fn from(image: &ValImage) -> Self {
        Self {
            dets: image
                .dets
                .iter()
                .map(|d| ValScore::new(d.det.score, d.is_true()))
                .collect(),
            misses: image.misses.len(),
            images: 1,
        }
    }
}

impl From<&TmplValImage> for ValSet {
    fn from(image: &TmplValImage) -> Self {
        Self::from(&image.untagged())
    }
}

fn check_sorted(dets: &[ValScore], context: &'static str) -> SlideDetResult<()> {
    if is_sorted_desc(dets, |d| d.score) {
        Ok(())
    } else {
        Err(SlideDetError::NotSorted { context })
    }
}

impl ValSet {
    pub fn new(dets: Vec<ValScore>, misses: usize, images: usize) -> SlideDetResult<Self> {
        check_sorted(&dets, "ValSet::new")?;
        Ok(Self {
            dets,
            misses,
            images,
        })
    }

    pub fn num_true(&self) -> usize {
        self.dets.iter().filter(|d| d.truth).count()
    }

    /// All actual positives: matched detections plus misses.
    pub fn num_positives(&self) -> usize {
        self.num_true() + self.misses
    }

    /// Combines two sets. On equal scores detections of `other` come first.
    pub fn merge(&self, other: &ValSet) -> SlideDetResult<ValSet> {
        check_sorted(&self.dets, "ValSet::merge")?;
        check_sorted(&other.dets, "ValSet::merge")?;
        let (a, b) = (&self.dets, &other.dets);
        let mut dets = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i].score > b[j].score {
                dets.push(a[i]);
                i += 1;
            } else {
                dets.push(b[j]);
                j += 1;
            }
        }
        dets.extend_from_slice(&a[i..]);
        dets.extend_from_slice(&b[j..]);
        Ok(ValSet {
            dets,
            misses: self.misses + other.misses,
            images: self.images + other.images,
        })
    }

    /// Combines any number of sets by concatenating and sorting.
    pub fn merge_all<'a>(sets: impl IntoIterator<Item = &'a ValSet>) -> SlideDetResult<ValSet> {
        let mut out = ValSet::default();
        for set in sets {
            out.dets.extend_from_slice(&set.dets);
            out.misses += set.misses;
            out.images += set.images;
        }
        crate::detect::det::sort_desc_by(&mut out.dets, |d| d.score)?;
        Ok(out)
    }

    /// Operating points obtained by lowering the threshold past each
    /// detection in turn, starting from everything negative.
    pub fn enumerate(&self) -> SlideDetResult<PerfPath> {
        check_sorted(&self.dets, "ValSet::enumerate")?;
        let mut curr = Perf::new(0, 0, self.num_positives());
        let mut path = Vec::with_capacity(self.dets.len() + 1);
        path.push(curr);
        for det in &self.dets {
            if det.truth {
                curr.true_pos += 1;
                curr.false_neg -= 1;
            } else {
                curr.false_pos += 1;
            }
            path.push(curr);
        }
        Ok(PerfPath(path))
    }

    /// Average precision of [`ValSet::enumerate`].
    pub fn average_precision(&self) -> SlideDetResult<f64> {
        Ok(self.enumerate()?.average_precision())
    }

    /// Miss rate at each false-positives-per-image rate.
    ///
    /// The operating point used is the loosest threshold with at most
    /// `floor(fppi * images)` false positives. Fails when that count is
    /// zero, since the set then holds too few images to resolve the rate.
    pub fn miss_rate_at_fppis(&self, fppis: &[f64]) -> SlideDetResult<Vec<f64>> {
        check_sorted(&self.dets, "ValSet::miss_rate_at_fppis")?;
        let n = self.dets.len();
        let mut false_pos = vec![0usize; n + 1];
        for (i, det) in self.dets.iter().enumerate() {
            false_pos[i + 1] = false_pos[i] + usize::from(!det.truth);
        }
        let pos_dets = self.num_true();
        let mut rates = Vec::with_capacity(fppis.len());
        for &fppi in fppis {
            let max_fp = (fppi * self.images as f64) as usize;
            if max_fp < 1 {
                return Err(SlideDetError::NotEnoughImages {
                    fppi,
                    images: self.images,
                });
            }
            let l = false_pos[1..].partition_point(|&fp| fp <= max_fp);
            let true_pos = l - false_pos[l];
            let false_neg = pos_dets - true_pos;
            let total = pos_dets + self.misses;
            let rate = if total == 0 {
                0.0
            } else {
                (false_neg + self.misses) as f64 / total as f64
            };
            trace_debug!("miss_rate", fppi = fppi, max_false_pos = max_fp, dets = l, rate = rate);
            rates.push(rate);
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::{ValScore, ValSet};
    use crate::util::SlideDetError;

    fn set(truth: &[bool], misses: usize, images: usize) -> ValSet {
        let n = truth.len();
        let dets = truth
            .iter()
            .enumerate()
            .map(|(i, &t)| ValScore::new((n - i) as f64, t))
            .collect();
        ValSet::new(dets, misses, images).unwrap()
    }

    #[test]
    fn miss_rate_counts_true_positives_before_the_fp_budget() {
        let s = set(
            &[true, true, false, true, true, false, false, true, false, false],
            7,
            13,
        );
        let fppi = |fp: usize| fp as f64 / 13.0 + 1e-9;
        let rates = s.miss_rate_at_fppis(&[fppi(1), fppi(2), fppi(3), fppi(100)]).unwrap();
        let want = [8.0 / 12.0, 8.0 / 12.0, 7.0 / 12.0, 7.0 / 12.0];
        for (got, want) in rates.iter().zip(want) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
        assert_eq!(
            s.miss_rate_at_fppis(&[0.5 / 13.0]),
            Err(SlideDetError::NotEnoughImages {
                fppi: 0.5 / 13.0,
                images: 13
            })
        );
    }

    #[test]
    fn enumerate_starts_all_negative() {
        let s = set(&[true, false, true], 2, 1);
        let path = s.enumerate().unwrap();
        let pts: Vec<_> = path.points().iter().map(|p| (p.true_pos, p.false_pos, p.false_neg)).collect();
        assert_eq!(pts, vec![(0, 0, 4), (1, 0, 3), (1, 1, 3), (2, 1, 2)]);
    }

    #[test]
    fn merge_sums_counts() {
        let a = set(&[true, false], 1, 2);
        let b = ValSet::new(vec![ValScore::new(1.5, true)], 3, 1).unwrap();
        let c = a.merge(&b).unwrap();
        let scores: Vec<_> = c.dets.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![2.0, 1.5, 1.0]);
        assert_eq!((c.misses, c.images), (4, 3));
        assert_eq!(ValSet::merge_all([&a, &b]).unwrap(), c);
    }

    #[test]
    fn unsorted_sets_are_rejected() {
        assert!(ValSet::new(vec![ValScore::new(1.0, true), ValScore::new(2.0, true)], 0, 1).is_err());
    }
}
