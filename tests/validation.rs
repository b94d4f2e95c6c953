use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slidedet::eval::{ValScore, ValSet};
use slidedet::{match_dets, validate, Det, Rect};

fn d(score: f64, x0: i64, y0: i64, x1: i64, y1: i64) -> Det {
    Det::new(score, Rect::new(x0, y0, x1, y1))
}

fn r(x0: i64, y0: i64, x1: i64, y1: i64) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

fn pairs(m: &[Option<usize>]) -> Vec<(usize, usize)> {
    m.iter()
        .enumerate()
        .filter_map(|(i, j)| j.map(|j| (i, j)))
        .collect()
}

#[test]
fn greedy_matching_cases() {
    let two = vec![d(10.0, 0, 0, 100, 100), d(9.0, 110, 10, 210, 110)];
    let cases: Vec<(Vec<Det>, Vec<Rect>, f64, Vec<(usize, usize)>)> = vec![
        (vec![], vec![], 0.5, vec![]),
        (vec![], vec![r(10, 10, 110, 110), r(100, 0, 200, 100)], 0.5, vec![]),
        (two.clone(), vec![], 0.5, vec![]),
        // 1500 / 2900 > 0.5
        (
            vec![d(10.0, 10, 20, 50, 70)],
            vec![r(0, 10, 40, 70), r(90, 10, 120, 40)],
            0.5,
            vec![(0, 0)],
        ),
        (
            vec![d(10.0, 10, 20, 50, 70)],
            vec![r(90, 10, 120, 40), r(0, 10, 40, 70)],
            0.5,
            vec![(0, 1)],
        ),
        (
            vec![d(10.0, 10, 20, 50, 80)],
            vec![r(0, 90, 40, 160), r(90, 10, 120, 40)],
            0.5,
            vec![],
        ),
        (vec![d(10.0, 0, 0, 100, 100)], vec![r(33, 0, 133, 100)], 0.5, vec![(0, 0)]),
        (vec![d(10.0, 0, 0, 100, 100)], vec![r(34, 0, 134, 100)], 0.5, vec![]),
        (vec![d(10.0, 0, 0, 100, 100)], vec![r(50, 0, 150, 100)], 1.0 / 3.0 - 0.005, vec![(0, 0)]),
        (vec![d(10.0, 0, 0, 100, 100)], vec![r(50, 0, 150, 100)], 1.0 / 3.0 + 0.005, vec![]),
        (
            two.clone(),
            vec![r(10, 10, 110, 110), r(100, 0, 200, 100)],
            0.5,
            vec![(0, 0), (1, 1)],
        ),
        (
            two.clone(),
            vec![r(100, 0, 200, 100), r(10, 10, 110, 110)],
            0.5,
            vec![(0, 1), (1, 0)],
        ),
        (
            two,
            vec![r(10, 10, 110, 110), r(100, 0, 200, 100), r(-5, -5, 95, 95)],
            0.5,
            vec![(0, 2), (1, 1)],
        ),
        // The higher score takes the reference even though it suits the
        // second detection better.
        (
            vec![d(10.0, 0, 0, 100, 100), d(9.0, 5, 5, 105, 105)],
            vec![r(10, 10, 110, 110)],
            0.5,
            vec![(0, 0)],
        ),
        (
            vec![d(10.0, 0, 0, 100, 100), d(9.0, 5, 5, 105, 105)],
            vec![r(15, 15, 115, 115), r(10, 10, 110, 110), r(5, 5, 105, 105)],
            0.5,
            vec![(0, 2), (1, 1)],
        ),
    ];
    for (i, (dets, refs, min_iou, want)) in cases.into_iter().enumerate() {
        let got = match_dets(&dets, &refs, min_iou).unwrap();
        assert_eq!(got.len(), dets.len());
        assert_eq!(pairs(&got), want, "case {i}");
    }
}

#[test]
fn validation_counts_misses_and_respects_ignore_regions() {
    let dets = vec![
        d(0.9, 0, 0, 10, 20),
        d(0.8, 100, 100, 110, 120),
        d(0.7, 200, 0, 210, 20),
        d(0.6, 1, 1, 11, 21),
    ];
    let refs = vec![r(0, 0, 10, 20), r(50, 50, 60, 70)];
    let ignore = vec![r(195, 0, 215, 25)];
    let val = validate(&dets, &refs, &ignore, 0.5, 0.5).unwrap();
    let labels: Vec<_> = val.dets.iter().map(|v| (v.det.score, v.is_true())).collect();
    assert_eq!(labels, vec![(0.9, true), (0.8, false), (0.6, false)]);
    assert_eq!(val.misses, vec![r(50, 50, 60, 70)]);

    let set = ValSet::from(&val);
    assert_eq!(set.num_positives(), 2);
    assert_eq!(set.images, 1);
}

#[test]
fn unsorted_detections_are_rejected() {
    let dets = vec![d(1.0, 0, 0, 1, 1), d(2.0, 0, 0, 1, 1)];
    assert!(match_dets(&dets, &[], 0.5).is_err());
    assert!(validate(&dets, &[], &[], 0.5, 0.5).is_err());
}

fn random_set(rng: &mut StdRng, n: usize) -> ValSet {
    let mut dets: Vec<_> = (0..n)
        .map(|_| ValScore::new(rng.random_range(0.0..1.0), rng.random_bool(0.4)))
        .collect();
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));
    ValSet::new(dets, rng.random_range(0..5), rng.random_range(1..4)).unwrap()
}

#[test]
fn enumeration_keeps_positives_constant_and_counts_monotone() {
    let mut rng = StdRng::seed_from_u64(21);
    for n in [0, 1, 7, 50] {
        let set = random_set(&mut rng, n);
        let path = set.enumerate().unwrap();
        assert_eq!(path.len(), n + 1);
        let first = path.points()[0];
        assert_eq!((first.true_pos, first.false_pos), (0, 0));
        let total = path.last().unwrap().positives();
        for w in path.points().windows(2) {
            assert_eq!(w[1].positives(), total);
            assert!(w[1].true_pos >= w[0].true_pos);
            assert!(w[1].false_pos >= w[0].false_pos);
            assert_eq!(w[1].true_pos + w[1].false_pos, w[0].true_pos + w[0].false_pos + 1);
        }
    }
}

#[test]
fn merging_is_commutative_up_to_ties() {
    let mut rng = StdRng::seed_from_u64(22);
    let sets: Vec<_> = (0..4).map(|_| random_set(&mut rng, 20)).collect();
    let ab = sets[0].merge(&sets[1]).unwrap();
    let ba = sets[1].merge(&sets[0]).unwrap();
    assert_eq!(ab, ba);

    let left = sets[0].merge(&sets[1]).unwrap().merge(&sets[2]).unwrap();
    let right = sets[0].merge(&sets[1].merge(&sets[2]).unwrap()).unwrap();
    assert_eq!(left, right);

    let all = ValSet::merge_all(&sets).unwrap();
    let chained = sets.iter().skip(1).try_fold(sets[0].clone(), |acc, s| acc.merge(s)).unwrap();
    assert_eq!(all, chained);
    assert_eq!(all.dets.len(), 80);
}

#[test]
fn average_precision_of_perfect_ranking_is_one() {
    let set = ValSet::new(
        vec![ValScore::new(3.0, true), ValScore::new(2.0, true), ValScore::new(1.0, false)],
        0,
        1,
    )
    .unwrap();
    assert!((set.average_precision().unwrap() - 1.0).abs() < 1e-12);
    let with_miss = ValSet { misses: 2, ..set };
    assert!((with_miss.average_precision().unwrap() - 0.5).abs() < 1e-12);
}
