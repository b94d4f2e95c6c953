//! Summed-area tables.

use crate::image::Image;

/// Summed-area table with an exclusive prefix, `(width + 1) x (height + 1)`.
///
/// `sum(x, y)` holds the total over `[0, x) x [0, y)`.
#[derive(Clone, Debug)]
pub struct SumTable {
    sums: Vec<f64>,
    width: usize,
    height: usize,
}

impl SumTable {
    /// Accumulates the table for `image`.
    pub fn new(image: &Image) -> Self {
        let (width, height) = image.size();
        let stride = width + 1;
        let mut sums = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += image.at(x, y);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self {
            sums,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn corner(&self, x: usize, y: usize) -> f64 {
        self.sums[y * (self.width + 1) + x]
    }

    /// Sum over the half-open rectangle `[x0, x1) x [y0, y1)`.
    pub fn rect_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        debug_assert!(x0 <= x1 && x1 <= self.width && y0 <= y1 && y1 <= self.height);
        self.corner(x1, y1) - self.corner(x0, y1) - self.corner(x1, y0) + self.corner(x0, y0)
    }

    /// Sum of the magnitudes of the four corner terms used by [`rect_sum`].
    ///
    /// For a non-negative source image this bounds the accumulated rounding
    /// error of `rect_sum`.
    ///
    /// [`rect_sum`]: SumTable::rect_sum
    pub fn rect_abs_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        if x0 == x1 || y0 == y1 {
            return 0.0;
        }
        self.corner(x1, y1).abs()
            + self.corner(x0, y1).abs()
            + self.corner(x1, y0).abs()
            + self.corner(x0, y0).abs()
    }
}
