//! Margins and boundary extension applied before a feature transform.

use crate::image::MultiImage;

/// Pixels added on each side of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Margin {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl Margin {
    pub fn uniform(n: usize) -> Self {
        Self {
            top: n,
            left: n,
            bottom: n,
            right: n,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Offset of the original image inside the padded one, `(left, top)`.
    pub fn top_left(&self) -> (usize, usize) {
        (self.left, self.top)
    }
}

/// How samples outside the image are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Extend {
    /// Zero outside the image.
    Zero,
    /// Nearest border pixel.
    #[default]
    Continue,
    /// Wrap around.
    Periodic,
    /// Half-sample mirror, `-1 -> 0`, `w -> w - 1`.
    Mirror,
}

impl Extend {
    /// Source index for `i` in an axis of length `n`, or `None` for zero.
    fn index(self, i: i64, n: usize) -> Option<usize> {
        let n = n as i64;
        if n == 0 {
            return None;
        }
        if (0..n).contains(&i) {
            return Some(i as usize);
        }
        let j = match self {
            Extend::Zero => return None,
            Extend::Continue => i.clamp(0, n - 1),
            Extend::Periodic => i.rem_euclid(n),
            Extend::Mirror => {
                let j = i.rem_euclid(2 * n);
                if j > n - 1 {
                    2 * n - 1 - j
                } else {
                    j
                }
            }
        };
        Some(j as usize)
    }
}

/// Margin plus extension mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Pad {
    pub margin: Margin,
    pub extend: Extend,
}

impl Pad {
    pub fn new(margin: Margin, extend: Extend) -> Self {
        Self { margin, extend }
    }

    /// Grows `image` by the margin, filling the border per `extend`.
    pub fn apply(&self, image: &MultiImage) -> MultiImage {
        if self.margin.is_zero() {
            return image.clone();
        }
        let m = self.margin;
        let (w, h) = image.size();
        let out_w = w + m.left + m.right;
        let out_h = h + m.top + m.bottom;
        let mut out = MultiImage::new(out_w, out_h, image.channels());
        for y in 0..out_h {
            let Some(sy) = self.extend.index(y as i64 - m.top as i64, h) else {
                continue;
            };
            for x in 0..out_w {
                let Some(sx) = self.extend.index(x as i64 - m.left as i64, w) else {
                    continue;
                };
                out.pixel_mut(x, y).copy_from_slice(image.pixel(sx, sy));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Extend, Margin, Pad};
    use crate::image::MultiImage;

    fn row(image: &MultiImage, y: usize) -> Vec<f64> {
        (0..image.width()).map(|x| image.at(x, y, 0)).collect()
    }

    #[test]
    fn extension_modes_fill_borders() {
        let image = MultiImage::from_fn(3, 1, 1, |x, _, _| (x + 1) as f64);
        let margin = Margin {
            top: 0,
            left: 2,
            bottom: 0,
            right: 2,
        };
        let cases = [
            (Extend::Zero, vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0]),
            (Extend::Continue, vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0]),
            (Extend::Periodic, vec![2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0]),
            (Extend::Mirror, vec![2.0, 1.0, 1.0, 2.0, 3.0, 3.0, 2.0]),
        ];
        for (extend, expected) in cases {
            let padded = Pad::new(margin, extend).apply(&image);
            assert_eq!(row(&padded, 0), expected, "{extend:?}");
        }
    }

    #[test]
    fn zero_margin_is_identity() {
        let image = MultiImage::from_fn(2, 2, 2, |x, y, k| (x + y + k) as f64);
        assert_eq!(Pad::default().apply(&image), image);
    }
}
