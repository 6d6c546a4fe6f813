extern crate hider;

fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> [hider::Vec3; 4] {
    [hider::Vec3::new(x0, y0, z), hider::Vec3::new(x1, y0, z),
     hider::Vec3::new(x1, y1, z), hider::Vec3::new(x0, y1, z)]
}

fn options() -> hider::Options {
    let mut o = hider::Options::default();
    o.resolution = (8, 1);
    o.bucket_size = (4, 1);
    o.pixel_samples = (4, 4);
    o.filter = hider::FilterKind::Box;
    o.filter_width = (1.0, 1.0);
    o.shutter = (0.0, 1.0);
    o
}

/// A one pixel square sliding from the left edge to the right edge
fn sliding() -> hider::QueuedMpg {
    let keys = vec![(0.0, quad(0.0, 0.0, 1.0, 1.0, 1.0)), (1.0, quad(7.0, 0.0, 8.0, 1.0, 1.0))];
    let mp = hider::MotionMicroPolygon::new(keys, hider::Triangulation::Full, 4).unwrap();
    let info = hider::SampleInfo::flat(hider::Color::WHITE, hider::Color::WHITE);
    hider::QueuedMpg::new(hider::Geometry::Moving(mp), info)
}

#[test]
fn moving_square_is_smeared() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut hider = hider::Hider::new(options(), vec![]).unwrap();
    assert_eq!(hider.add_mpg(sliding()), 2);
    let mut fb = hider::FrameBuffer::new(8, 1, &[]);
    let stats = hider.render(&mut fb, None).unwrap();
    assert_eq!(stats.buckets, 2);
    assert!(stats.totals.hits > 0);

    let mut total = 0.0;
    for x in 0 .. 8 {
        let a = fb.image.get(x, 0, "a").unwrap();
        // Never covers a pixel for the whole shutter
        assert!(a < 1.0, "pixel {} alpha {}", x, a);
        total += a;
    }
    // Covers one pixel's worth of area at every instant
    assert!(total > 0.5 && total < 1.6, "total {}", total);
    // Something lands along the middle of the path
    assert!((2 .. 6).map(|x| fb.image.get(x, 0, "coverage").unwrap()).sum::<f32>() > 0.0);
}

#[test]
fn closed_shutter_freezes_motion() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut o = options();
    o.shutter = (0.0, 0.0);
    let mut hider = hider::Hider::new(o, vec![]).unwrap();
    hider.add_mpg(sliding());
    let mut fb = hider::FrameBuffer::new(8, 1, &[]);
    hider.render(&mut fb, None).unwrap();
    assert_eq!(fb.image.get(0, 0, "a").unwrap(), 1.0);
    assert_eq!(fb.image.get(0, 0, "coverage").unwrap(), 1.0);
    for x in 1 .. 8 {
        assert_eq!(fb.image.get(x, 0, "coverage").unwrap(), 0.0);
    }
}

#[test]
fn time_ranges_cover_the_motion() {
    let keys = vec![(0.0, quad(0.0, 0.0, 1.0, 1.0, 1.0)), (1.0, quad(7.0, 0.0, 8.0, 1.0, 2.0))];
    let mp = hider::MotionMicroPolygon::new(keys, hider::Triangulation::Full, 4).unwrap();
    let ranges = mp.time_ranges();
    assert_eq!(ranges.len(), 4);
    assert_eq!(ranges[0].t0, f32::NEG_INFINITY);
    assert_eq!(ranges[3].t1, f32::INFINITY);
    for t in [0.0, 0.1, 0.3, 0.5, 0.77, 1.0] {
        let corners = mp.corners_at(t);
        let r = ranges.iter().find(|r| t >= r.t0 && t < r.t1).unwrap();
        for c in corners.iter() {
            assert!(c.x >= r.bound.min.x && c.x <= r.bound.max.x);
            assert!(c.z >= r.bound.min.z && c.z <= r.bound.max.z);
        }
    }
    let b = mp.bound(None);
    assert_eq!((b.min.x, b.max.x), (0.0, 8.0));
}
