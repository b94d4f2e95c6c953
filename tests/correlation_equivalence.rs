use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slidedet::kernel::{
    conv, conv_multi, corr_bank, corr_multi_bank_stride, corr_multi_stride, corr_stride, decimate,
    decimate_multi, fft_len, flip, flip_multi,
};
use slidedet::{corr, corr_multi, corr_multi_bank, Algo, Bank, Image, MultiBank, MultiImage};

const TOL: f64 = 1e-9;
const ALGOS: [Algo; 4] = [Algo::Naive, Algo::Fft, Algo::Blas, Algo::Auto];

fn random_image(rng: &mut StdRng, w: usize, h: usize) -> Image {
    Image::from_fn(w, h, |_, _| rng.random_range(-1.0..1.0))
}

fn random_multi(rng: &mut StdRng, w: usize, h: usize, c: usize) -> MultiImage {
    MultiImage::from_fn(w, h, c, |_, _, _| rng.random_range(-1.0..1.0))
}

fn assert_close(a: &[f64], b: &[f64], context: &str) {
    assert_eq!(a.len(), b.len(), "{context}: length");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let scale = 1.0 + x.abs().max(y.abs());
        assert!((x - y).abs() <= TOL * scale, "{context}: element {i}: {x} vs {y}");
    }
}

const SIZES: [((usize, usize), (usize, usize)); 6] = [
    ((1, 1), (1, 1)),
    ((9, 7), (3, 2)),
    ((16, 16), (5, 5)),
    ((23, 11), (7, 11)),
    ((31, 17), (1, 4)),
    ((12, 40), (12, 9)),
];

#[test]
fn algorithms_agree_single_channel() {
    let mut rng = StdRng::seed_from_u64(1);
    for (fs, gs) in SIZES {
        let f = random_image(&mut rng, fs.0, fs.1);
        let g = random_image(&mut rng, gs.0, gs.1);
        let reference = corr(&f, &g, Algo::Naive).unwrap();
        for algo in ALGOS {
            let h = corr(&f, &g, algo).unwrap();
            assert_eq!(h.size(), reference.size());
            assert_close(h.data(), reference.data(), &format!("{algo:?} {fs:?} {gs:?}"));
        }
    }
}

#[test]
fn algorithms_agree_multi_channel() {
    let mut rng = StdRng::seed_from_u64(2);
    for (fs, gs) in SIZES {
        for channels in [1, 3, 8] {
            let f = random_multi(&mut rng, fs.0, fs.1, channels);
            let g = random_multi(&mut rng, gs.0, gs.1, channels);
            let reference = corr_multi(&f, &g, Algo::Naive).unwrap();
            for algo in ALGOS {
                let h = corr_multi(&f, &g, algo).unwrap();
                assert_close(h.data(), reference.data(), &format!("{algo:?} {fs:?} {gs:?} c={channels}"));
            }
        }
    }
}

#[test]
fn bank_outputs_equal_individual_correlations() {
    let mut rng = StdRng::seed_from_u64(3);
    let f = random_multi(&mut rng, 20, 14, 4);
    let filters: Vec<_> = (0..5).map(|_| random_multi(&mut rng, 4, 3, 4)).collect();
    let bank = MultiBank::new(filters.clone()).unwrap();
    for algo in ALGOS {
        let out = corr_multi_bank(&f, &bank, algo).unwrap();
        assert_eq!(out.channels(), filters.len());
        for (p, g) in filters.iter().enumerate() {
            let single = corr_multi(&f, g, Algo::Naive).unwrap();
            let plane = out.channel(p).unwrap();
            assert_close(plane.data(), single.data(), &format!("{algo:?} filter {p}"));
        }
    }

    let f = random_image(&mut rng, 13, 9);
    let planes: Vec<_> = (0..3).map(|_| random_image(&mut rng, 3, 3)).collect();
    let out = corr_bank(&f, &Bank::new(planes.clone()).unwrap(), Algo::Fft).unwrap();
    for (p, g) in planes.iter().enumerate() {
        let single = corr(&f, g, Algo::Naive).unwrap();
        assert_close(out.channel(p).unwrap().data(), single.data(), "single-channel bank");
    }
}

#[test]
fn strided_correlation_equals_decimated_full_correlation() {
    let mut rng = StdRng::seed_from_u64(4);
    let cases = [
        ((17, 13), (3, 4), 1),
        ((17, 13), (3, 4), 2),
        ((17, 13), (3, 4), 3),
        ((20, 20), (2, 2), 5),
        ((20, 9), (4, 3), 7),
        ((10, 10), (3, 3), 40),
        ((6, 6), (6, 6), 4),
    ];
    for (fs, gs, k) in cases {
        let f = random_image(&mut rng, fs.0, fs.1);
        let g = random_image(&mut rng, gs.0, gs.1);
        let full = decimate(&corr(&f, &g, Algo::Naive).unwrap(), k);
        for algo in ALGOS {
            let h = corr_stride(&f, &g, k, algo).unwrap();
            assert_eq!(h.size(), full.size(), "{algo:?} {fs:?} {gs:?} k={k}");
            assert_close(h.data(), full.data(), &format!("{algo:?} {fs:?} {gs:?} k={k}"));
        }

        let fm = random_multi(&mut rng, fs.0, fs.1, 2);
        let gm = random_multi(&mut rng, gs.0, gs.1, 2);
        let full = decimate(&corr_multi(&fm, &gm, Algo::Naive).unwrap(), k);
        let h = corr_multi_stride(&fm, &gm, k, Algo::Fft).unwrap();
        assert_close(h.data(), full.data(), &format!("multi {fs:?} {gs:?} k={k}"));
    }
}

#[test]
fn strided_bank_equals_decimated_bank() {
    let mut rng = StdRng::seed_from_u64(5);
    let f = random_multi(&mut rng, 25, 19, 3);
    let bank = MultiBank::new((0..4).map(|_| random_multi(&mut rng, 5, 4, 3)).collect()).unwrap();
    for k in [2, 3, 6] {
        let full = decimate_multi(&corr_multi_bank(&f, &bank, Algo::Naive).unwrap(), k);
        for algo in ALGOS {
            let h = corr_multi_bank_stride(&f, &bank, k, algo).unwrap();
            assert_eq!(h.size(), full.size());
            assert_close(h.data(), full.data(), &format!("{algo:?} k={k}"));
        }
    }
}

#[test]
fn convolution_is_correlation_with_flipped_filter() {
    let mut rng = StdRng::seed_from_u64(6);
    for (fs, gs) in SIZES {
        let f = random_image(&mut rng, fs.0, fs.1);
        let g = random_image(&mut rng, gs.0, gs.1);
        for algo in ALGOS {
            let a = conv(&f, &g, algo).unwrap();
            let b = corr(&f, &flip(&g), Algo::Naive).unwrap();
            assert_close(a.data(), b.data(), &format!("conv {algo:?}"));
            let c = corr(&f, &g, algo).unwrap();
            let d = conv(&f, &flip(&g), Algo::Naive).unwrap();
            assert_close(c.data(), d.data(), &format!("corr {algo:?}"));
        }
    }

    let f = random_multi(&mut rng, 11, 8, 3);
    let g = random_multi(&mut rng, 4, 3, 3);
    for algo in ALGOS {
        let a = conv_multi(&f, &g, algo).unwrap();
        let b = corr_multi(&f, &flip_multi(&g), Algo::Naive).unwrap();
        assert_close(a.data(), b.data(), &format!("conv_multi {algo:?}"));
    }
}

#[test]
fn filters_that_do_not_fit_give_empty_results() {
    let f = Image::new(4, 4);
    for gs in [(5, 1), (1, 5), (5, 5)] {
        let g = Image::new(gs.0, gs.1);
        for algo in ALGOS {
            assert!(corr(&f, &g, algo).unwrap().is_empty());
            assert!(conv(&f, &g, algo).unwrap().is_empty());
            assert!(corr_stride(&f, &g, 3, algo).unwrap().is_empty());
        }
    }
}

#[test]
fn fft_length_of_smooth_numbers_is_identity() {
    for n in [1, 2, 4, 8, 16, 32, 64, 3, 9, 27, 5, 25, 6, 12, 30, 60, 210] {
        if n == 1 {
            assert_eq!(fft_len(n).0, 1);
            continue;
        }
        // Lengths with large factors may be padded to a cheaper one.
        let (len, _) = fft_len(n);
        assert!(len >= n);
        if n.is_power_of_two() {
            assert_eq!(len, n);
        }
    }
    assert_eq!(fft_len(32), (32, 32 * 10));
}
