//! Frequency-domain evaluation on top of `rustfft`.
//!
//! Inputs are zero-padded to a work size chosen by [`fft2_size`]. The work
//! size is never smaller than the valid region plus the filter support, so
//! the circular correlation computed by the transform never wraps into the
//! samples that are read back.
//!
//! A [`Fft2`] owns its plans and scratch buffers. It is created per call and
//! never shared between threads.

use crate::image::MultiImage;
use crate::kernel::bank::MultiBank;
use crate::kernel::size::{fft2_size, valid_size, valid_size_stride};
use crate::util::math::ceil_div;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Row-major 2D transform built from 1D row and column passes.
pub(crate) struct Fft2 {
    width: usize,
    height: usize,
    row_fwd: Arc<dyn Fft<f64>>,
    row_inv: Arc<dyn Fft<f64>>,
    col_fwd: Arc<dyn Fft<f64>>,
    col_inv: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    transposed: Vec<Complex64>,
}

impl Fft2 {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::new();
        let row_fwd = planner.plan_fft_forward(width);
        let row_inv = planner.plan_fft_inverse(width);
        let col_fwd = planner.plan_fft_forward(height);
        let col_inv = planner.plan_fft_inverse(height);
        let scratch_len = [&row_fwd, &row_inv, &col_fwd, &col_inv]
            .iter()
            .map(|plan| plan.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);
        Self {
            width,
            height,
            row_fwd,
            row_inv,
            col_fwd,
            col_inv,
            scratch: vec![ZERO; scratch_len],
            transposed: vec![ZERO; width * height],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.width * self.height
    }

    /// Zeroed buffer of the work size.
    pub(crate) fn buffer(&self) -> Vec<Complex64> {
        vec![ZERO; self.len()]
    }

    pub(crate) fn forward(&mut self, buf: &mut [Complex64]) {
        let (row, col) = (Arc::clone(&self.row_fwd), Arc::clone(&self.col_fwd));
        self.transform(buf, row.as_ref(), col.as_ref());
    }

    /// Unnormalized inverse; callers divide by [`Fft2::len`].
    pub(crate) fn inverse(&mut self, buf: &mut [Complex64]) {
        let (row, col) = (Arc::clone(&self.row_inv), Arc::clone(&self.col_inv));
        self.transform(buf, row.as_ref(), col.as_ref());
    }

    fn transform(&mut self, buf: &mut [Complex64], row: &dyn Fft<f64>, col: &dyn Fft<f64>) {
        debug_assert_eq!(buf.len(), self.len());
        let (w, h) = (self.width, self.height);
        // All rows at once: the buffer is `h` consecutive rows of length `w`.
        row.process_with_scratch(buf, &mut self.scratch);
        for y in 0..h {
            for x in 0..w {
                self.transposed[x * h + y] = buf[y * w + x];
            }
        }
        col.process_with_scratch(&mut self.transposed, &mut self.scratch);
        for x in 0..w {
            for y in 0..h {
                buf[y * w + x] = self.transposed[x * h + y];
            }
        }
    }
}

/// Strided correlation of `f` with every filter in `g`.
///
/// The output position `(u, v)` reads `f` at `(stride * u + i, stride * v + j)`
/// for filter taps `(i, j)`. Taps are grouped by `(i % stride, j % stride)`;
/// each group is an ordinary correlation of a decimated image with a
/// decimated filter, and the groups are summed in the frequency domain.
/// The forward transform of each decimated input channel is computed once
/// and reused for every filter.
pub(crate) fn corr_multi_bank_stride(f: &MultiImage, g: &MultiBank, stride: usize) -> MultiImage {
    let (out_w, out_h) = valid_size_stride(f.size(), g.size(), stride);
    let (fw, fh) = f.size();
    let (gw, gh) = g.size();
    let channels = f.channels();
    let grid = (stride.min(gw), stride.min(gh));
    let sub = (ceil_div(gw, stride), ceil_div(gh, stride));
    let sub_image = (out_w + sub.0 - 1, out_h + sub.1 - 1);
    let ((work_w, work_h), _) = fft2_size(sub_image);

    let mut plan = Fft2::new(work_w, work_h);
    let mut acc: Vec<Vec<Complex64>> = (0..g.len()).map(|_| plan.buffer()).collect();
    let mut fhat = plan.buffer();
    let mut ghat = plan.buffer();

    for gj in 0..grid.1 {
        for gi in 0..grid.0 {
            for k in 0..channels {
                fhat.fill(ZERO);
                for v in 0..work_h {
                    let y = stride * v + gj;
                    if y >= fh {
                        break;
                    }
                    for u in 0..work_w {
                        let x = stride * u + gi;
                        if x >= fw {
                            break;
                        }
                        fhat[v * work_w + u] = Complex64::new(f.at(x, y, k), 0.0);
                    }
                }
                plan.forward(&mut fhat);

                for (filter, acc) in g.filters().iter().zip(acc.iter_mut()) {
                    ghat.fill(ZERO);
                    for (tv, y) in (gj..gh).step_by(stride).enumerate() {
                        for (tu, x) in (gi..gw).step_by(stride).enumerate() {
                            ghat[tv * work_w + tu] = Complex64::new(filter.at(x, y, k), 0.0);
                        }
                    }
                    plan.forward(&mut ghat);
                    for ((a, x), y) in acc.iter_mut().zip(&fhat).zip(&ghat) {
                        *a += x * y.conj();
                    }
                }
            }
        }
    }

    let norm = plan.len() as f64;
    let p = g.len();
    let mut out = MultiImage::new(out_w, out_h, p);
    for (pi, acc) in acc.iter_mut().enumerate() {
        plan.inverse(acc);
        for v in 0..out_h {
            for u in 0..out_w {
                out.set(u, v, pi, acc[v * work_w + u].re / norm);
            }
        }
    }
    out
}

/// Convolution over the valid region: the spectra are multiplied without
/// conjugation and the result is read from offset `(gw - 1, gh - 1)`.
pub(crate) fn conv_multi(f: &MultiImage, g: &MultiImage) -> MultiImage {
    let (out_w, out_h) = valid_size(f.size(), g.size());
    let (gw, gh) = g.size();
    let ((work_w, work_h), _) = fft2_size(f.size());

    let mut plan = Fft2::new(work_w, work_h);
    let mut acc = plan.buffer();
    let mut fhat = plan.buffer();
    let mut ghat = plan.buffer();
    for k in 0..f.channels() {
        fhat.fill(ZERO);
        for y in 0..f.height() {
            for x in 0..f.width() {
                fhat[y * work_w + x] = Complex64::new(f.at(x, y, k), 0.0);
            }
        }
        ghat.fill(ZERO);
        for y in 0..gh {
            for x in 0..gw {
                ghat[y * work_w + x] = Complex64::new(g.at(x, y, k), 0.0);
            }
        }
        plan.forward(&mut fhat);
        plan.forward(&mut ghat);
        for ((a, x), y) in acc.iter_mut().zip(&fhat).zip(&ghat) {
            *a += x * y;
        }
    }
    plan.inverse(&mut acc);

    let norm = plan.len() as f64;
    MultiImage::from_fn(out_w, out_h, 1, |u, v, _| {
        acc[(v + gh - 1) * work_w + u + gw - 1].re / norm
    })
}
