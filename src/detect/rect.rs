//! Integer rectangles and padded template geometry.

use crate::feature::Margin;
use crate::util::math::round_half_up;
use crate::util::{SlideDetError, SlideDetResult};

/// Half-open axis-aligned rectangle `[x0, x1) x [y0, y1)` in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl Rect {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle with top-left corner `(x, y)` and the given size.
    pub fn from_size(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Area, zero when empty.
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() * self.height()
        }
    }

    pub fn translate(&self, dx: i64, dy: i64) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    /// Intersection; empty rectangles collapse to the default.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }

    /// Intersection over union. Zero when both are empty.
    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersect(other).area();
        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f64 / union as f64
    }

    /// Fraction of `other` covered by `self`.
    pub fn cover(&self, other: &Rect) -> f64 {
        let area = other.area();
        if area <= 0 {
            return 0.0;
        }
        self.intersect(other).area() as f64 / area as f64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x0 + self.x1) as f64 / 2.0,
            (self.y0 + self.y1) as f64 / 2.0,
        )
    }

    /// Scales both corners by `k` and rounds each to the nearest integer.
    pub fn scale_round(&self, k: f64) -> Rect {
        Rect::new(
            round_half_up(self.x0 as f64 * k),
            round_half_up(self.y0 as f64 * k),
            round_half_up(self.x1 as f64 * k),
            round_half_up(self.y1 as f64 * k),
        )
    }
}

/// How a box is coerced to a target aspect ratio (width / height).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AspectMode {
    /// Keep the area.
    #[default]
    Area,
    /// Keep the width.
    Width,
    /// Keep the height.
    Height,
    /// Shrink one side.
    Fit,
    /// Grow one side.
    Fill,
    /// Leave unchanged.
    Stretch,
}

/// Coerces `(w, h)` to `aspect` according to `mode`.
pub fn set_aspect(w: f64, h: f64, aspect: f64, mode: AspectMode) -> (f64, f64) {
    match mode {
        AspectMode::Area => ((w * h * aspect).sqrt(), (w * h / aspect).sqrt()),
        AspectMode::Width => (w, w / aspect),
        AspectMode::Height => (h * aspect, h),
        AspectMode::Fit => (w.min(h * aspect), h.min(w / aspect)),
        AspectMode::Fill => (w.max(h * aspect), h.max(w / aspect)),
        AspectMode::Stretch => (w, h),
    }
}

/// Template window of `size` pixels whose object box is `interior`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PadRect {
    pub size: (i64, i64),
    pub interior: Rect,
}

impl PadRect {
    pub fn new(size: (i64, i64), interior: Rect) -> Self {
        Self { size, interior }
    }

    /// Window whose interior is `size` surrounded by `margin`.
    pub fn pad(size: (i64, i64), margin: Margin) -> Self {
        let (left, top) = (margin.left as i64, margin.top as i64);
        Self {
            size: (
                size.0 + left + margin.right as i64,
                size.1 + top + margin.bottom as i64,
            ),
            interior: Rect::from_size(left, top, size.0, size.1),
        }
    }

    pub fn left(&self) -> i64 {
        self.interior.x0
    }

    pub fn top(&self) -> i64 {
        self.interior.y0
    }

    pub fn right(&self) -> i64 {
        self.size.0 - self.interior.x1
    }

    pub fn bottom(&self) -> i64 {
        self.size.1 - self.interior.y1
    }

    /// Window in the image that, resized to [`PadRect::size`], places the
    /// box `orig` on the interior. Returns the magnification and the window.
    pub fn fit_rect(&self, orig: &Rect, mode: AspectMode) -> SlideDetResult<(f64, Rect)> {
        let int = &self.interior;
        if int.width() <= 0 || int.height() <= 0 {
            return Err(SlideDetError::InvalidInput("template interior is empty"));
        }
        if mode == AspectMode::Stretch {
            return Err(SlideDetError::InvalidInput("fit_rect does not support stretch"));
        }
        let aspect = int.width() as f64 / int.height() as f64;
        let (w, _) = set_aspect(orig.width() as f64, orig.height() as f64, aspect, mode);
        let scale = int.width() as f64 / w;
        let (left, top) = int.center();
        let (right, bottom) = (self.size.0 as f64 - left, self.size.1 as f64 - top);
        let (x, y) = orig.center();
        let fit = Rect::new(
            round_half_up(x - left / scale),
            round_half_up(y - top / scale),
            round_half_up(x + right / scale),
            round_half_up(y + bottom / scale),
        );
        Ok((scale, fit))
    }
}
