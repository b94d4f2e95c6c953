//! Geometric scale sequences and lazily generated image pyramids.
//!
//! Levels are produced one at a time. A level whose predecessor had scale
//! `>= 1` is resampled from the original image, otherwise it is resampled
//! from the predecessor. Upsampled levels therefore never compound
//! interpolation blur, while the total work for the shrinking levels stays
//! proportional to the size of the largest one.

use crate::image::resize::{resize, Interp};
use crate::image::MultiImage;
use crate::trace::trace_span;
use crate::util::math::round_half_up;
use crate::util::{SlideDetError, SlideDetResult};

/// Slack applied before rounding the length of a sequence down, so that a
/// limit hit exactly (up to rounding) is still included.
const SEQUENCE_EPS: f64 = 1e-9;

/// Finite geometric sequence `start * step^i` for `i < len`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoSeq {
    pub start: f64,
    pub step: f64,
    pub len: usize,
}

impl GeoSeq {
    /// Longest sequence from `start` whose elements do not pass `lim`.
    ///
    /// With `step > 1` the limit must lie above `start`, with `step < 1`
    /// below it; otherwise the sequence is empty.
    pub fn sequence(start: f64, step: f64, lim: f64) -> SlideDetResult<Self> {
        if !(step > 0.0) {
            return Err(SlideDetError::InvalidInput("step must be positive"));
        }
        if step == 1.0 {
            return Err(SlideDetError::InvalidInput("step must not be 1"));
        }
        if !(start > 0.0) || !(lim > 0.0) {
            return Err(SlideDetError::InvalidInput("start and limit must be positive"));
        }
        let n = (lim / start).ln() / step.ln() + 1.0;
        let len = if n.is_finite() && n > 0.0 {
            (n + SEQUENCE_EPS).floor() as usize
        } else {
            0
        };
        Ok(Self { start, step, len })
    }

    /// Sequence of `n >= 2` elements running from `first` to `last`.
    ///
    /// The endpoints must be positive and distinct so that the step is
    /// neither zero nor one.
    pub fn log_range(first: f64, last: f64, n: usize) -> SlideDetResult<Self> {
        if n < 2 {
            return Err(SlideDetError::InvalidInput("log range needs at least two elements"));
        }
        if !(first > 0.0) || !(last > 0.0) {
            return Err(SlideDetError::InvalidInput("log range endpoints must be positive"));
        }
        if first == last {
            return Err(SlideDetError::InvalidInput("log range endpoints must differ"));
        }
        let step = ((last / first).ln() / (n - 1) as f64).exp();
        Ok(Self {
            start: first,
            step,
            len: n,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `i`-th element.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn at(&self, i: usize) -> f64 {
        assert!(i < self.len, "geometric sequence index {i} out of range {}", self.len);
        self.start * self.step.powi(i as i32)
    }

    /// The `i`-th element, if any.
    pub fn get(&self, i: usize) -> Option<f64> {
        (i < self.len).then(|| self.start * self.step.powi(i as i32))
    }

    /// Fractional index of `x` in the progression.
    pub fn inv(&self, x: f64) -> f64 {
        (x / self.start).ln() / self.step.ln()
    }

    /// Same elements in the opposite order.
    pub fn reverse(&self) -> Self {
        match self.len {
            0 => *self,
            len => Self {
                start: self.at(len - 1),
                step: 1.0 / self.step,
                len,
            },
        }
    }

    pub fn elems(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.at(i)).collect()
    }
}

/// Scales for searching a template across an image, largest first.
///
/// Runs from `max_scale` down by factors of `1 / step` and stops before the
/// image would become smaller than the template in either dimension.
pub fn scales(
    image_size: (usize, usize),
    template_size: (usize, usize),
    max_scale: f64,
    step: f64,
) -> SlideDetResult<GeoSeq> {
    if !(step > 1.0) {
        return Err(SlideDetError::InvalidInput("pyramid step must be greater than 1"));
    }
    let (iw, ih) = image_size;
    let (tw, th) = template_size;
    let min_scale = f64::max(tw as f64 / iw as f64, th as f64 / ih as f64);
    if !(min_scale > 0.0) {
        return Err(SlideDetError::InvalidInput("template must have positive size"));
    }
    GeoSeq::sequence(max_scale, 1.0 / step, min_scale)
}

/// Size of an image of `size` after scaling, rounded to the nearest pixel.
pub fn scale_size(size: (usize, usize), scale: f64) -> (usize, usize) {
    let w = round_half_up(size.0 as f64 * scale).max(0) as usize;
    let h = round_half_up(size.1 as f64 * scale).max(0) as usize;
    (w, h)
}

/// One generated pyramid level.
#[derive(Clone, Debug)]
pub struct ImageLevel {
    pub image: MultiImage,
    pub index: usize,
}

/// Which image the next level is resampled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResampleSource {
    Original,
    Previous,
}

/// Generates pyramid levels on demand.
pub struct ImagePyramidGenerator<'a> {
    image: &'a MultiImage,
    scales: Vec<f64>,
    interp: Interp,
}

impl<'a> ImagePyramidGenerator<'a> {
    /// Scales must be positive and non-increasing.
    pub fn new(image: &'a MultiImage, scales: &[f64], interp: Interp) -> SlideDetResult<Self> {
        if scales.iter().any(|s| !(*s > 0.0)) {
            return Err(SlideDetError::InvalidInput("scales must be positive"));
        }
        if scales.windows(2).any(|w| w[1] > w[0]) {
            return Err(SlideDetError::InvalidInput("scales must be non-increasing"));
        }
        Ok(Self {
            image,
            scales: scales.to_vec(),
            interp,
        })
    }

    /// Builds the generator from a geometric sequence.
    pub fn from_seq(image: &'a MultiImage, scales: GeoSeq, interp: Interp) -> SlideDetResult<Self> {
        Self::new(image, &scales.elems(), interp)
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn original(&self) -> &MultiImage {
        self.image
    }

    pub fn interp(&self) -> Interp {
        self.interp
    }

    /// Pixel size of level `index`.
    pub fn level_size(&self, index: usize) -> Option<(usize, usize)> {
        let scale = self.scales.get(index)?;
        Some(scale_size(self.image.size(), *scale))
    }

    pub fn first(&self) -> Option<ImageLevel> {
        let size = self.level_size(0)?;
        let _span = trace_span!("pyramid_level", index = 0usize).entered();
        Some(ImageLevel {
            image: resize(self.image, size.0, size.1, self.interp),
            index: 0,
        })
    }

    /// Source image for the level following `curr`.
    pub fn resample_source(&self, curr: &ImageLevel) -> ResampleSource {
        if self.scales[curr.index] >= 1.0 {
            ResampleSource::Original
        } else {
            ResampleSource::Previous
        }
    }

    pub fn next(&self, curr: &ImageLevel) -> Option<ImageLevel> {
        let index = curr.index + 1;
        let size = self.level_size(index)?;
        let _span = trace_span!("pyramid_level", index = index).entered();
        let src = match self.resample_source(curr) {
            ResampleSource::Original => self.image,
            ResampleSource::Previous => &curr.image,
        };
        Some(ImageLevel {
            image: resize(src, size.0, size.1, self.interp),
            index,
        })
    }

    /// Iterates over all levels in order.
    pub fn levels(&self) -> Levels<'_, 'a> {
        Levels {
            gen: self,
            curr: None,
            done: false,
        }
    }
}

/// Iterator over the levels of an [`ImagePyramidGenerator`].
pub struct Levels<'g, 'a> {
    gen: &'g ImagePyramidGenerator<'a>,
    curr: Option<ImageLevel>,
    done: bool,
}

impl Iterator for Levels<'_, '_> {
    type Item = ImageLevel;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let level = match &self.curr {
            None => self.gen.first(),
            Some(curr) => self.gen.next(curr),
        };
        match &level {
            Some(level) => self.curr = Some(level.clone()),
            None => self.done = true,
        }
        level
    }
}

/// Eagerly built image pyramid.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<MultiImage>,
    scales: Vec<f64>,
}

impl ImagePyramid {
    pub fn build(image: &MultiImage, scales: &[f64], interp: Interp) -> SlideDetResult<Self> {
        let gen = ImagePyramidGenerator::new(image, scales, interp)?;
        let levels = gen.levels().map(|level| level.image).collect();
        Ok(Self {
            levels,
            scales: scales.to_vec(),
        })
    }

    pub fn levels(&self) -> &[MultiImage] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&MultiImage> {
        self.levels.get(index)
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::{scales, GeoSeq, ImagePyramidGenerator, ResampleSource};
    use crate::image::resize::Interp;
    use crate::image::MultiImage;

    #[test]
    fn reverse_visits_elements_backwards() {
        let seq = GeoSeq {
            start: 1.0,
            step: 2.0,
            len: 4,
        };
        let rev = seq.reverse();
        for i in 0..4 {
            assert!((rev.at(i) - seq.at(3 - i)).abs() < 1e-12);
        }
    }

    #[test]
    fn sequence_stops_at_limit() {
        let seq = GeoSeq::sequence(2.0, 2.0, 35.0).unwrap();
        let last = seq.at(seq.len() - 1);
        assert!(last <= 35.0);
        assert!(2.0 * last > 35.0);
    }

    #[test]
    fn sequence_rejects_bad_steps() {
        assert!(GeoSeq::sequence(1.0, 1.0, 0.5).is_err());
        assert!(GeoSeq::sequence(1.0, 0.0, 0.5).is_err());
        assert!(GeoSeq::sequence(1.0, -2.0, 0.5).is_err());
    }

    #[test]
    fn log_range_ends_at_last() {
        let seq = GeoSeq::log_range(2.0, 32.0, 10).unwrap();
        assert!((seq.at(9) - 32.0).abs() < 1e-12);
        assert!((seq.inv(32.0) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn log_range_rejects_unit_step() {
        assert!(GeoSeq::log_range(2.0, 32.0, 1).is_err());
        assert!(GeoSeq::log_range(2.0, 32.0, 0).is_err());
        assert!(GeoSeq::log_range(4.0, 4.0, 5).is_err());
        assert!(GeoSeq::log_range(0.0, 4.0, 5).is_err());
        let seq = GeoSeq::log_range(32.0, 2.0, 2).unwrap();
        assert!((seq.step - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn scales_never_shrink_below_template() {
        let sqrt10 = 10f64.sqrt();
        let cases = [
            ((400, 300), (40, 30), sqrt10, 3),
            ((400, 300), (40, 40), sqrt10, 2),
            ((400, 300), (0, 30), sqrt10, 3),
            ((512, 256), (1, 1), 2.0, 9),
        ];
        for (image, tmpl, step, len) in cases {
            let seq = scales(image, tmpl, 1.0, step).unwrap();
            assert_eq!(seq.len(), len, "image {image:?} template {tmpl:?}");
        }
    }

    #[test]
    fn upsampled_levels_resample_from_original() {
        let image = MultiImage::from_fn(20, 10, 1, |x, y, _| (x + y) as f64);
        let gen = ImagePyramidGenerator::new(&image, &[2.0, 1.0, 0.5, 0.25], Interp::Bilinear)
            .unwrap();
        let sources: Vec<_> = gen
            .levels()
            .take(3)
            .map(|level| gen.resample_source(&level))
            .collect();
        assert_eq!(
            sources,
            vec![
                ResampleSource::Original,
                ResampleSource::Original,
                ResampleSource::Previous
            ]
        );
        let sizes: Vec<_> = gen.levels().map(|level| level.image.size()).collect();
        assert_eq!(sizes, vec![(40, 20), (20, 10), (10, 5), (5, 3)]);
    }

    #[test]
    fn generator_rejects_increasing_scales() {
        let image = MultiImage::new(4, 4, 1);
        assert!(ImagePyramidGenerator::new(&image, &[0.5, 1.0], Interp::Nearest).is_err());
    }
}
