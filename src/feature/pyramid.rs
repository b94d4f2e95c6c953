//! Feature pyramids and the feature-to-image coordinate map.

use crate::detect::rect::Rect;
use crate::feature::{FeatureTransform, Margin, Pad};
use crate::image::pyramid::{GeoSeq, ImageLevel, ImagePyramidGenerator};
use crate::image::resize::Interp;
use crate::image::MultiImage;
use crate::trace::trace_span;
use crate::util::math::round_half_up;
use crate::util::SlideDetResult;

/// Position of a feature cell in a pyramid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PyrPoint {
    pub level: usize,
    pub x: usize,
    pub y: usize,
}

impl PyrPoint {
    pub fn new(level: usize, x: usize, y: usize) -> Self {
        Self { level, x, y }
    }
}

/// Scales, rate and margin of a feature pyramid.
///
/// All conversions from feature space to image pixels go through
/// [`PyramidGeometry::to_image_rect`].
#[derive(Clone, Debug, PartialEq)]
pub struct PyramidGeometry {
    pub scales: Vec<f64>,
    pub rate: usize,
    pub margin: Margin,
}

impl PyramidGeometry {
    pub fn new(scales: Vec<f64>, rate: usize, margin: Margin) -> Self {
        Self {
            scales,
            rate,
            margin,
        }
    }

    pub fn num_levels(&self) -> usize {
        self.scales.len()
    }

    /// Rectangle in the original image of a window placed at `pt` whose
    /// object box in window pixels is `interior`.
    ///
    /// The window offset is `pt * rate - margin`, added to `interior` and
    /// divided by the level scale, each corner rounded half up.
    pub fn to_image_rect(&self, pt: PyrPoint, interior: &Rect) -> Rect {
        let rate = self.rate as i64;
        let (left, top) = self.margin.top_left();
        let dx = pt.x as i64 * rate - left as i64;
        let dy = pt.y as i64 * rate - top as i64;
        interior.translate(dx, dy).scale_round(1.0 / self.scales[pt.level])
    }

    /// Feature position at `level` whose image rectangle has its top-left
    /// corner at `(x, y)`. Inverse of [`PyramidGeometry::to_image_rect`] up
    /// to rounding.
    pub fn to_feature_point(&self, level: usize, x: i64, y: i64, interior: &Rect) -> (f64, f64) {
        let scale = self.scales[level];
        let (left, top) = self.margin.top_left();
        let rate = self.rate as f64;
        (
            (x as f64 * scale - interior.x0 as f64 + left as f64) / rate,
            (y as f64 * scale - interior.y0 as f64 + top as f64) / rate,
        )
    }

    /// Nearest feature cell for [`PyramidGeometry::to_feature_point`].
    pub fn round_feature_point(&self, level: usize, x: i64, y: i64, interior: &Rect) -> (i64, i64) {
        let (u, v) = self.to_feature_point(level, x, y, interior);
        (round_half_up(u), round_half_up(v))
    }
}

/// One level of a feature pyramid.
#[derive(Clone, Debug)]
pub struct FeatureLevel {
    pub image: ImageLevel,
    pub feat: MultiImage,
}

impl FeatureLevel {
    pub fn index(&self) -> usize {
        self.image.index
    }
}

/// Generates feature levels on demand: resize, pad, transform.
pub struct FeaturePyramidGenerator<'a, T> {
    images: ImagePyramidGenerator<'a>,
    transform: T,
    pad: Pad,
}

impl<'a, T: FeatureTransform> FeaturePyramidGenerator<'a, T> {
    pub fn new(images: ImagePyramidGenerator<'a>, transform: T, pad: Pad) -> Self {
        Self {
            images,
            transform,
            pad,
        }
    }

    /// Convenience constructor from an image and a scale sequence.
    pub fn from_seq(
        image: &'a MultiImage,
        scales: GeoSeq,
        interp: Interp,
        transform: T,
        pad: Pad,
    ) -> SlideDetResult<Self> {
        let images = ImagePyramidGenerator::from_seq(image, scales, interp)?;
        Ok(Self::new(images, transform, pad))
    }

    pub fn images(&self) -> &ImagePyramidGenerator<'a> {
        &self.images
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    pub fn pad(&self) -> &Pad {
        &self.pad
    }

    pub fn geometry(&self) -> PyramidGeometry {
        PyramidGeometry::new(
            self.images.scales().to_vec(),
            self.transform.rate(),
            self.pad.margin,
        )
    }

    fn features(&self, image: ImageLevel) -> SlideDetResult<FeatureLevel> {
        let _span = trace_span!("feature_level", index = image.index).entered();
        let feat = self.transform.apply_pad(&image.image, &self.pad)?;
        Ok(FeatureLevel { image, feat })
    }

    pub fn first(&self) -> SlideDetResult<Option<FeatureLevel>> {
        self.images.first().map(|im| self.features(im)).transpose()
    }

    pub fn next(&self, curr: &FeatureLevel) -> SlideDetResult<Option<FeatureLevel>> {
        self.images.next(&curr.image).map(|im| self.features(im)).transpose()
    }

    /// Iterates over all levels; stops after the first error.
    pub fn levels(&self) -> FeatureLevels<'_, 'a, T> {
        FeatureLevels {
            gen: self,
            curr: None,
            done: false,
        }
    }
}

/// Iterator over the levels of a [`FeaturePyramidGenerator`].
pub struct FeatureLevels<'g, 'a, T> {
    gen: &'g FeaturePyramidGenerator<'a, T>,
    curr: Option<FeatureLevel>,
    done: bool,
}

impl<T: FeatureTransform> Iterator for FeatureLevels<'_, '_, T> {
    type Item = SlideDetResult<FeatureLevel>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let level = match &self.curr {
            None => self.gen.first(),
            Some(curr) => self.gen.next(curr),
        };
        match level {
            Ok(Some(level)) => {
                self.curr = Some(level.clone());
                Some(Ok(level))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Eagerly computed feature pyramid.
#[derive(Clone, Debug)]
pub struct FeaturePyramid {
    feats: Vec<MultiImage>,
    geometry: PyramidGeometry,
}

impl FeaturePyramid {
    pub fn build<T: FeatureTransform>(gen: &FeaturePyramidGenerator<'_, T>) -> SlideDetResult<Self> {
        let feats = gen
            .levels()
            .map(|level| level.map(|level| level.feat))
            .collect::<SlideDetResult<Vec<_>>>()?;
        Ok(Self {
            feats,
            geometry: gen.geometry(),
        })
    }

    /// Builds the levels resampled from the original image in parallel and
    /// the chain of shrinking levels in order. Equal to [`FeaturePyramid::build`].
    #[cfg(feature = "rayon")]
    pub fn build_par<T: FeatureTransform + Sync>(
        gen: &FeaturePyramidGenerator<'_, T>,
    ) -> SlideDetResult<Self> {
        use crate::image::pyramid::scale_size;
        use crate::image::resize::resize;
        use rayon::prelude::*;

        let images = gen.images();
        let scales = images.scales();
        let original = images.original();
        let from_original = |i: usize| i == 0 || scales[i - 1] >= 1.0;
        let resize_from = |src: &MultiImage, i: usize| {
            let (w, h) = scale_size(original.size(), scales[i]);
            resize(src, w, h, images.interp())
        };

        let roots: Vec<Option<MultiImage>> = (0..scales.len())
            .into_par_iter()
            .map(|i| from_original(i).then(|| resize_from(original, i)))
            .collect();
        let mut pixels: Vec<MultiImage> = Vec::with_capacity(roots.len());
        for (i, root) in roots.into_iter().enumerate() {
            let level = match root {
                Some(level) => level,
                None => resize_from(&pixels[i - 1], i),
            };
            pixels.push(level);
        }
        let feats = pixels
            .par_iter()
            .map(|im| gen.transform().apply_pad(im, gen.pad()))
            .collect::<SlideDetResult<Vec<_>>>()?;
        Ok(Self {
            feats,
            geometry: gen.geometry(),
        })
    }

    pub fn feats(&self) -> &[MultiImage] {
        &self.feats
    }

    pub fn level(&self, index: usize) -> Option<&MultiImage> {
        self.feats.get(index)
    }

    pub fn len(&self) -> usize {
        self.feats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feats.is_empty()
    }

    pub fn geometry(&self) -> &PyramidGeometry {
        &self.geometry
    }
}
