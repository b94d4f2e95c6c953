//! Window scorers.
//!
//! A [`Scorer`] knows how to score one window of a fixed size. Scorers with
//! a faster way to score every window at once (for example by correlation)
//! override [`Scorer::slide`]; the default evaluates windows one by one.

use crate::image::{Image, MultiImage};
use crate::kernel::cos::cos_corr_multi;
use crate::kernel::{corr_multi, Algo};
use crate::util::{SlideDetError, SlideDetResult};

/// Scores fixed-size windows of a feature image.
pub trait Scorer {
    /// Window `(width, height)`.
    fn size(&self) -> (usize, usize);

    /// Feature channels expected in each window.
    fn channels(&self) -> usize;

    /// Score of one window of exactly [`Scorer::size`].
    fn score(&self, window: &MultiImage) -> SlideDetResult<f64>;

    /// Score of every window that fits inside `image`.
    fn slide(&self, image: &MultiImage) -> SlideDetResult<Image> {
        if image.channels() != self.channels() {
            return Err(SlideDetError::ChannelMismatch {
                image: image.channels(),
                filter: self.channels(),
            });
        }
        eval_func(image, self.size(), |window| self.score(window))
    }
}

/// Evaluates `f` on every window of `size` in `image`.
///
/// Returns an empty image when the window does not fit.
pub fn eval_func(
    image: &MultiImage,
    size: (usize, usize),
    mut f: impl FnMut(&MultiImage) -> SlideDetResult<f64>,
) -> SlideDetResult<Image> {
    let (iw, ih) = image.size();
    let (w, h) = size;
    if iw < w || ih < h {
        return Ok(Image::empty());
    }
    let channels = image.channels();
    let mut out = Image::new(iw - w + 1, ih - h + 1);
    let mut window = MultiImage::new(w, h, channels);
    for v in 0..out.height() {
        for u in 0..out.width() {
            for y in 0..h {
                for x in 0..w {
                    window.pixel_mut(x, y).copy_from_slice(image.pixel(u + x, v + y));
                }
            }
            out.set(u, v, f(&window)?);
        }
    }
    Ok(out)
}

/// Inner product used by [`AffineScorer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CorrOp {
    #[default]
    Dot,
    /// Dot product of the unit-normalized window and template.
    Cos,
}

/// Linear template plus bias.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineScorer {
    pub weights: MultiImage,
    pub bias: f64,
    pub op: CorrOp,
    pub algo: Algo,
}

impl AffineScorer {
    pub fn new(weights: MultiImage, bias: f64) -> Self {
        Self {
            weights,
            bias,
            op: CorrOp::Dot,
            algo: Algo::Auto,
        }
    }

    pub fn with_op(mut self, op: CorrOp) -> Self {
        self.op = op;
        self
    }

    pub fn with_algo(mut self, algo: Algo) -> Self {
        self.algo = algo;
        self
    }
}

impl Scorer for AffineScorer {
    fn size(&self) -> (usize, usize) {
        self.weights.size()
    }

    fn channels(&self) -> usize {
        self.weights.channels()
    }

    fn score(&self, window: &MultiImage) -> SlideDetResult<f64> {
        if window.size() != self.weights.size() {
            return Err(SlideDetError::InvalidDimensions {
                width: window.width(),
                height: window.height(),
            });
        }
        if window.channels() != self.weights.channels() {
            return Err(SlideDetError::ChannelMismatch {
                image: window.channels(),
                filter: self.weights.channels(),
            });
        }
        let dot: f64 = window
            .data()
            .iter()
            .zip(self.weights.data())
            .map(|(a, b)| a * b)
            .sum();
        let value = match self.op {
            CorrOp::Dot => dot,
            CorrOp::Cos => {
                let na = window.data().iter().map(|v| v * v).sum::<f64>().sqrt();
                let nb = self.weights.data().iter().map(|v| v * v).sum::<f64>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    0.0
                } else {
                    dot / (na * nb)
                }
            }
        };
        Ok(value + self.bias)
    }

    fn slide(&self, image: &MultiImage) -> SlideDetResult<Image> {
        let mut out = match self.op {
            CorrOp::Dot => corr_multi(image, &self.weights, self.algo)?,
            CorrOp::Cos => cos_corr_multi(image, &self.weights, self.algo)?,
        };
        if self.bias != 0.0 {
            out.add_scalar(self.bias);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{eval_func, AffineScorer, CorrOp, Scorer};
    use crate::image::MultiImage;
    use crate::kernel::Algo;

    #[test]
    fn slide_agrees_with_window_by_window() {
        let image = MultiImage::from_fn(9, 7, 2, |x, y, k| ((x * 3 + y * 5 + k) % 7) as f64 - 2.0);
        let weights = MultiImage::from_fn(3, 2, 2, |x, y, k| (x + y) as f64 - k as f64);
        for op in [CorrOp::Dot, CorrOp::Cos] {
            let scorer = AffineScorer::new(weights.clone(), 0.25)
                .with_op(op)
                .with_algo(Algo::Naive);
            let fast = scorer.slide(&image).unwrap();
            let slow = eval_func(&image, scorer.size(), |w| scorer.score(w)).unwrap();
            assert_eq!(fast.size(), slow.size());
            for (a, b) in fast.data().iter().zip(slow.data()) {
                assert!((a - b).abs() < 1e-9, "{op:?}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn window_larger_than_image_is_empty() {
        let image = MultiImage::new(2, 2, 1);
        let out = eval_func(&image, (3, 1), |_| Ok(1.0)).unwrap();
        assert!(out.is_empty());
    }

    struct Sum((usize, usize));

    impl Scorer for Sum {
        fn size(&self) -> (usize, usize) {
            self.0
        }

        fn channels(&self) -> usize {
            1
        }

        fn score(&self, window: &MultiImage) -> crate::util::SlideDetResult<f64> {
            Ok(window.data().iter().sum())
        }
    }

    #[test]
    fn default_slide_scores_each_window() {
        let image = MultiImage::from_fn(4, 3, 1, |x, y, _| (x + 4 * y) as f64);
        let out = Sum((2, 2)).slide(&image).unwrap();
        assert_eq!(out.size(), (3, 2));
        assert_eq!(out.at(0, 0), 0.0 + 1.0 + 4.0 + 5.0);
        assert_eq!(out.at(2, 1), 6.0 + 7.0 + 10.0 + 11.0);
        assert!(Sum((2, 2)).slide(&MultiImage::new(4, 3, 2)).is_err());
    }

    #[test]
    fn score_rejects_wrong_channels() {
        let scorer = AffineScorer::new(MultiImage::new(2, 2, 3), 0.0);
        assert!(scorer.score(&MultiImage::new(2, 2, 1)).is_err());
    }
}
