//! Operating points and curves.

/// Counts at one operating point. True negatives depend on the number of
/// windows searched and are not tracked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Perf {
    pub true_pos: usize,
    pub false_pos: usize,
    pub false_neg: usize,
}

impl Perf {
    pub fn new(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        Self {
            true_pos,
            false_pos,
            false_neg,
        }
    }

    /// Actual positives, `tp + fn`.
    pub fn positives(&self) -> usize {
        self.true_pos + self.false_neg
    }

    /// `tp / (tp + fp)`, 1 when nothing was detected.
    pub fn precision(&self) -> f64 {
        let detected = self.true_pos + self.false_pos;
        if detected == 0 {
            1.0
        } else {
            self.true_pos as f64 / detected as f64
        }
    }

    /// `tp / (tp + fn)`, 0 when there are no positives.
    pub fn recall(&self) -> f64 {
        match self.positives() {
            0 => 0.0,
            n => self.true_pos as f64 / n as f64,
        }
    }

    pub fn miss_rate(&self) -> f64 {
        match self.positives() {
            0 => 0.0,
            n => self.false_neg as f64 / n as f64,
        }
    }
}

/// Operating points from the strictest threshold to the loosest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerfPath(pub Vec<Perf>);

impl PerfPath {
    pub fn points(&self) -> &[Perf] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Perf> {
        self.0.last()
    }

    /// Area under the precision-recall staircase: the precision at each
    /// point weighted by the recall gained since the previous point.
    pub fn average_precision(&self) -> f64 {
        let mut ap = 0.0;
        let mut prev_recall = 0.0;
        for p in &self.0 {
            let r = p.recall();
            ap += (r - prev_recall) * p.precision();
            prev_recall = r;
        }
        ap
    }
}

#[cfg(test)]
mod tests {
    use super::{Perf, PerfPath};

    #[test]
    fn precision_recall() {
        let p = Perf::new(3, 1, 2);
        assert_eq!(p.precision(), 0.75);
        assert_eq!(p.recall(), 0.6);
        assert_eq!(p.miss_rate(), 0.4);
        assert_eq!(Perf::default().precision(), 1.0);
        assert_eq!(Perf::default().recall(), 0.0);
    }

    #[test]
    fn perfect_ranking_has_unit_ap() {
        let path = PerfPath(vec![Perf::new(0, 0, 2), Perf::new(1, 0, 1), Perf::new(2, 0, 0), Perf::new(2, 1, 0)]);
        assert!((path.average_precision() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ap_weights_precision_by_recall_gain() {
        // F, T, T: precision at recall 1/2 is 1/2, at recall 1 is 2/3.
        let path = PerfPath(vec![Perf::new(0, 0, 2), Perf::new(0, 1, 2), Perf::new(1, 1, 1), Perf::new(2, 1, 0)]);
        let want = 0.5 * 0.5 + 0.5 * (2.0 / 3.0);
        assert!((path.average_precision() - want).abs() < 1e-12);
    }
}
