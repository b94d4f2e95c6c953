//! Separable resampling of multi-channel images.
//!
//! Each output coordinate maps back to `(i + 0.5) / scale - 0.5` in the
//! source. When shrinking, the filter support is widened by `1 / scale` so
//! every source pixel contributes. Samples outside the source clamp to the
//! border.

use crate::image::MultiImage;

/// Interpolation kernel used when resizing pyramid levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Interp {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
}

impl Interp {
    fn support(self) -> f64 {
        match self {
            Interp::Nearest => 0.5,
            Interp::Bilinear => 1.0,
            Interp::Bicubic => 2.0,
        }
    }

    fn kernel(self, t: f64) -> f64 {
        let t = t.abs();
        match self {
            Interp::Nearest => {
                if t < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Interp::Bilinear => (1.0 - t).max(0.0),
            Interp::Bicubic => {
                // Catmull-Rom, a = -0.5.
                const A: f64 = -0.5;
                if t < 1.0 {
                    ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
                } else if t < 2.0 {
                    ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
                } else {
                    0.0
                }
            }
        }
    }
}

/// Taps for one output coordinate: first source index and its weights.
struct Taps {
    start: usize,
    weights: Vec<f64>,
}

fn compute_taps(src_len: usize, dst_len: usize, interp: Interp) -> Vec<Taps> {
    let scale = dst_len as f64 / src_len as f64;
    let last = src_len - 1;
    if interp == Interp::Nearest {
        return (0..dst_len)
            .map(|i| Taps {
                start: (((i as f64 + 0.5) / scale).floor() as usize).min(last),
                weights: vec![1.0],
            })
            .collect();
    }

    let factor = if scale < 1.0 { 1.0 / scale } else { 1.0 };
    let radius = interp.support() * factor;
    (0..dst_len)
        .map(|i| {
            let center = (i as f64 + 0.5) / scale - 0.5;
            let lo = (center - radius).ceil() as i64;
            let hi = (center + radius).floor() as i64;
            let start = lo.clamp(0, last as i64) as usize;
            let end = hi.clamp(0, last as i64) as usize;
            let mut weights = vec![0.0; end - start + 1];
            let mut total = 0.0;
            for j in lo..=hi {
                let w = interp.kernel((j as f64 - center) / factor);
                let idx = j.clamp(0, last as i64) as usize;
                weights[idx - start] += w;
                total += w;
            }
            if total.abs() > f64::EPSILON {
                for w in &mut weights {
                    *w /= total;
                }
            }
            Taps { start, weights }
        })
        .collect()
}

/// Resizes `src` to `width x height`.
pub fn resize(src: &MultiImage, width: usize, height: usize, interp: Interp) -> MultiImage {
    let channels = src.channels();
    if src.size() == (width, height) {
        return src.clone();
    }
    if src.is_empty() || width == 0 || height == 0 {
        return MultiImage::new(width, height, channels);
    }

    let x_taps = compute_taps(src.width(), width, interp);
    let y_taps = compute_taps(src.height(), height, interp);

    let mut horiz = MultiImage::new(width, src.height(), channels);
    for y in 0..src.height() {
        for (x, taps) in x_taps.iter().enumerate() {
            let out = horiz.pixel_mut(x, y);
            for (offset, w) in taps.weights.iter().enumerate() {
                for (o, v) in out.iter_mut().zip(src.pixel(taps.start + offset, y)) {
                    *o += w * v;
                }
            }
        }
    }

    let mut dst = MultiImage::new(width, height, channels);
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..width {
            for (offset, w) in taps.weights.iter().enumerate() {
                let sy = taps.start + offset;
                for k in 0..channels {
                    let value = dst.at(x, y, k) + w * horiz.at(x, sy, k);
                    dst.set(x, y, k, value);
                }
            }
        }
    }
    dst
}
