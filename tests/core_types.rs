use slidedet::image::pyramid::scales;
use slidedet::{Bank, GeoSeq, Image, MultiBank, MultiImage, SlideDetError};

#[test]
fn image_rejects_wrong_buffer_length() {
    let err = Image::from_vec(vec![0.0; 5], 2, 3).unwrap_err();
    assert_eq!(err, SlideDetError::BufferLength { needed: 6, got: 5 });

    let err = MultiImage::from_vec(vec![0.0; 12], 2, 2, 2).unwrap_err();
    assert_eq!(err, SlideDetError::BufferLength { needed: 8, got: 12 });
}

#[test]
fn multi_image_is_interleaved_per_pixel() {
    let data: Vec<f64> = (0..12).map(f64::from).collect();
    let image = MultiImage::from_vec(data, 3, 2, 2).unwrap();
    assert_eq!(image.at(0, 0, 1), 1.0);
    assert_eq!(image.at(1, 0, 0), 2.0);
    assert_eq!(image.at(0, 1, 0), 6.0);
    assert_eq!(image.pixel(2, 1), &[10.0, 11.0]);
}

#[test]
fn extracted_channel_is_detached() {
    let mut image = MultiImage::from_fn(3, 3, 2, |x, y, k| (x + 3 * y + 9 * k) as f64);
    let plane = image.channel(1).unwrap();
    image.set(0, 0, 1, -1.0);
    assert_eq!(plane.at(0, 0), 9.0);
    assert!(image.channel(2).is_err());
}

#[test]
fn channels_round_trip_through_planes() {
    let a = Image::from_fn(4, 2, |x, y| (x * y) as f64);
    let b = Image::from_fn(4, 2, |x, y| (x + y) as f64);
    let image = MultiImage::from_channels(&[a.clone(), b.clone()]).unwrap();
    assert_eq!(image.channels(), 2);
    assert_eq!(image.channel(0).unwrap(), a);
    assert_eq!(image.channel(1).unwrap(), b);
    assert!(MultiImage::from_channels(&[a, Image::new(2, 2)]).is_err());
}

#[test]
fn banks_require_equal_shapes() {
    let err = Bank::new(vec![Image::new(3, 3), Image::new(3, 2)]).unwrap_err();
    assert!(matches!(err, SlideDetError::BankShapeMismatch { index: 1, .. }));

    let err = MultiBank::new(vec![MultiImage::new(2, 2, 3), MultiImage::new(2, 2, 1)]).unwrap_err();
    assert!(matches!(err, SlideDetError::BankShapeMismatch { index: 1, .. }));

    assert!(Bank::new(Vec::new()).is_err());
    let bank = Bank::new(vec![Image::new(4, 2), Image::new(4, 2)]).unwrap();
    assert_eq!((bank.len(), bank.size()), (2, (4, 2)));
}

#[test]
fn geometric_sequence_elements_and_inverse() {
    let seq = GeoSeq { start: 2.0, step: 0.5, len: 4 };
    assert_eq!(seq.elems(), vec![2.0, 1.0, 0.5, 0.25]);
    assert!((seq.inv(0.5) - 2.0).abs() < 1e-12);
    assert_eq!(seq.get(4), None);
    let rev = seq.reverse();
    assert!((rev.at(0) - 0.25).abs() < 1e-12);
    assert!((rev.at(3) - 2.0).abs() < 1e-12);
}

#[test]
fn geometric_sequence_rejects_degenerate_steps() {
    assert!(GeoSeq::sequence(1.0, 1.0, 0.5).is_err());
    assert!(GeoSeq::sequence(1.0, 0.0, 0.5).is_err());
    assert!(GeoSeq::sequence(1.0, -0.5, 0.5).is_err());
}

#[test]
fn search_scales_stop_at_template_size() {
    let seq = scales((640, 480), (64, 128), 1.0, 2f64.sqrt()).unwrap();
    let last = seq.at(seq.len() - 1);
    assert!(last >= 128.0 / 480.0 - 1e-9);
    assert!(last / 2f64.sqrt() < 128.0 / 480.0);
    assert!((seq.at(0) - 1.0).abs() < 1e-12);
}
