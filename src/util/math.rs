//! Small numeric helpers shared across modules.

/// Integer division rounding towards positive infinity.
pub(crate) fn ceil_div(a: usize, b: usize) -> usize {
    debug_assert!(b > 0);
    a.div_ceil(b)
}

/// Rounds half away from negative infinity, `floor(x + 0.5)`.
pub(crate) fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Returns true if the values are ordered by non-increasing score.
pub(crate) fn is_sorted_desc<T>(items: &[T], score: impl Fn(&T) -> f64) -> bool {
    items.windows(2).all(|w| score(&w[0]) >= score(&w[1]))
}

#[cfg(test)]
mod tests {
    use super::{ceil_div, is_sorted_desc, round_half_up};

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(0, 3), 0);
        assert_eq!(ceil_div(1, 3), 1);
        assert_eq!(ceil_div(3, 3), 1);
        assert_eq!(ceil_div(7, 3), 3);
    }

    #[test]
    fn round_half_up_matches_floor_plus_half() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(0.49), 0);
    }

    #[test]
    fn sorted_desc_accepts_ties() {
        assert!(is_sorted_desc(&[3.0, 2.0, 2.0, 1.0], |v| *v));
        assert!(!is_sorted_desc(&[1.0, 2.0], |v| *v));
        assert!(is_sorted_desc::<f64>(&[], |v| *v));
    }
}
