//! Output sizes and the FFT length oracle.

use crate::util::math::ceil_div;

/// Prime factors an FFT length may be built from.
const FFT_FACTORS: [usize; 4] = [2, 3, 5, 7];

/// Size of the correlation of an `f`-sized image with a `g`-sized filter:
/// every placement of `g` that lies entirely inside `f`.
pub fn valid_size(f: (usize, usize), g: (usize, usize)) -> (usize, usize) {
    let w = (f.0 + 1).saturating_sub(g.0);
    let h = (f.1 + 1).saturating_sub(g.1);
    if w == 0 || h == 0 {
        return (0, 0);
    }
    (w, h)
}

/// Size of the valid correlation sampled every `stride` positions.
///
/// A zero stride samples nothing and yields `(0, 0)`.
pub fn valid_size_stride(f: (usize, usize), g: (usize, usize), stride: usize) -> (usize, usize) {
    if stride == 0 {
        return (0, 0);
    }
    let (w, h) = valid_size(f, g);
    (ceil_div(w, stride), ceil_div(h, stride))
}

/// Smallest length `>= n` that factors over {2, 3, 5, 7} at minimal cost.
///
/// Returns `(length, cost)` where the cost of a length is the length times
/// the sum of its prime factors.
pub fn fft_len(n: usize) -> (usize, usize) {
    fft_len_search(1, 0, n, &FFT_FACTORS)
}

fn fft_len_search(prod: usize, sum: usize, n: usize, factors: &[usize]) -> (usize, usize) {
    if prod >= n {
        return (prod, prod * sum);
    }
    let mut best: Option<(usize, usize)> = None;
    for (i, &k) in factors.iter().enumerate() {
        // Factors are tried in non-decreasing order to visit each product once.
        let cand = fft_len_search(prod * k, sum + k, n, &factors[i..]);
        match best {
            Some((_, cost)) if cand.1 >= cost => {}
            _ => best = Some(cand),
        }
    }
    best.unwrap_or((prod, prod * sum))
}

/// Work size for a 2D transform of at least `size`, with its estimated cost.
///
/// A 2D transform runs `y` transforms of length `x` and `x` of length `y`,
/// so the cost is `x * cost(y) + y * cost(x)`.
pub fn fft2_size(size: (usize, usize)) -> ((usize, usize), usize) {
    let (x, cx) = fft_len(size.0);
    let (y, cy) = fft_len(size.1);
    ((x, y), x * cy + y * cx)
}
