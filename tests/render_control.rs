extern crate hider;

fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> [hider::Vec3; 4] {
    [hider::Vec3::new(x0, y0, z), hider::Vec3::new(x1, y0, z),
     hider::Vec3::new(x1, y1, z), hider::Vec3::new(x0, y1, z)]
}

fn options() -> hider::Options {
    let mut o = hider::Options::default();
    o.resolution = (4, 4);
    o.bucket_size = (2, 2);
    o.pixel_samples = (2, 2);
    o.filter = hider::FilterKind::Box;
    o.filter_width = (1.0, 1.0);
    o
}

#[test]
fn cancelled_before_first_bucket() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut hider = hider::Hider::new(options(), vec![]).unwrap();
    hider.cancel_handle().store(true, std::sync::atomic::Ordering::SeqCst);
    let mut fb = hider::FrameBuffer::new(4, 4, &[]);
    match hider.render(&mut fb, None) {
        Err(hider::HiderError::Cancelled) => {},
        other => panic!("expected cancel, got {:?}", other),
    }
    assert_eq!(fb.buckets, 0);
}

#[test]
fn invalid_options_are_rejected() {
    let mut o = options();
    o.bucket_size = (0, 2);
    assert!(matches!(hider::Hider::new(o, vec![]), Err(hider::HiderError::InvalidOptions(_))));
}

#[test]
fn background_fills_empty_buckets() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut hider = hider::Hider::new(options(), vec![]).unwrap();
    // Covers the top left bucket only
    let mp = hider::MicroPolygon::new(quad(0.0, 0.0, 2.0, 2.0, 1.0)).unwrap();
    let info = hider::SampleInfo::flat(hider::Color::new(1.0, 0.0, 0.0), hider::Color::gray(0.5));
    hider.add_mpg(hider::QueuedMpg::new(hider::Geometry::Static(mp), info));
    let bg = hider::BackgroundImager::new(hider::Color::new(0.0, 0.0, 1.0));
    let mut fb = hider::FrameBuffer::new(4, 4, &[]);
    let stats = hider.render(&mut fb, Some(&bg)).unwrap();
    assert_eq!(stats.buckets, 4);
    assert_eq!(fb.buckets, 4);
    let px = |x, y, c| fb.image.get(x, y, c).unwrap();
    assert_eq!((px(0, 0, "r"), px(0, 0, "g"), px(0, 0, "b")), (0.5, 0.0, 0.5));
    assert_eq!(px(0, 0, "a"), 1.0);
    // Nothing rendered, background only
    assert_eq!((px(3, 3, "r"), px(3, 3, "g"), px(3, 3, "b")), (0.0, 0.0, 1.0));
    assert_eq!(px(3, 3, "a"), 1.0);
    assert_eq!(px(3, 3, "coverage"), 0.0);

    let rgba = fb.to_rgba8().unwrap();
    assert_eq!(rgba.len(), 4 * 4 * 4);
    assert_eq!(&rgba[(3 * 4 + 3) * 4 .. (3 * 4 + 3) * 4 + 4], &[0, 0, 255, 255]);
}

#[test]
fn aov_channels_are_filtered() {
    let _ = env_logger::builder().is_test(true).try_init();
    let aovs = vec![hider::AovSpec::new("id", 1), hider::AovSpec::new("n", 3)];
    let mut hider = hider::Hider::new(options(), aovs.clone()).unwrap();
    assert_eq!(hider.context().aov_floats(), 4);
    let mp = hider::MicroPolygon::new(quad(-1.0, -1.0, 5.0, 5.0, 1.0)).unwrap();
    let mut info = hider::SampleInfo::flat(hider::Color::WHITE, hider::Color::WHITE);
    info.aovs = [vec![3.0, 0.0, 0.5, 1.0], vec![3.0, 0.0, 0.5, 1.0],
                 vec![3.0, 0.0, 0.5, 1.0], vec![3.0, 0.0, 0.5, 1.0]];
    hider.add_mpg(hider::QueuedMpg::new(hider::Geometry::Static(mp), info));
    let mut fb = hider::FrameBuffer::new(4, 4, &aovs);
    hider.render(&mut fb, None).unwrap();
    assert_eq!(fb.image.num_channels(), 9 + 4);
    assert_eq!(fb.image.get(2, 1, "id").unwrap(), 3.0);
    assert_eq!(fb.image.get(2, 1, "n.1").unwrap(), 0.5);
    assert_eq!(fb.image.get(2, 1, "n.2").unwrap(), 1.0);
    assert!(matches!(fb.image.get(0, 0, "nope"), Err(hider::HiderError::UnknownChannel(_))));
}

#[test]
fn exposure_applies_to_color_only() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut o = options();
    o.exposure = (2.0, 1.0);
    let mut hider = hider::Hider::new(o, vec![]).unwrap();
    let mp = hider::MicroPolygon::new(quad(-1.0, -1.0, 5.0, 5.0, 1.0)).unwrap();
    let info = hider::SampleInfo::flat(hider::Color::gray(0.25), hider::Color::WHITE);
    hider.add_mpg(hider::QueuedMpg::new(hider::Geometry::Static(mp), info));
    let mut fb = hider::FrameBuffer::new(4, 4, &[]);
    hider.render(&mut fb, None).unwrap();
    assert_eq!(fb.image.get(1, 1, "r").unwrap(), 0.5);
    assert_eq!(fb.image.get(1, 1, "or").unwrap(), 1.0);
}
