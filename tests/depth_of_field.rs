extern crate hider;

use std::sync::Arc;

fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> [hider::Vec3; 4] {
    [hider::Vec3::new(x0, y0, z), hider::Vec3::new(x1, y0, z),
     hider::Vec3::new(x1, y1, z), hider::Vec3::new(x0, y1, z)]
}

/// Circle of confusion is zero at depth 2 and two pixels at depth 1
fn lens() -> hider::DepthOfField {
    hider::DepthOfField::new(0.5, 1.0, 2.0, hider::Vec2::new(2.0, 2.0))
}

fn render(z: f32) -> (hider::RenderStats, hider::FrameBuffer) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut o = hider::Options::default();
    o.resolution = (9, 9);
    o.bucket_size = (9, 9);
    o.pixel_samples = (4, 4);
    o.filter = hider::FilterKind::Box;
    o.filter_width = (1.0, 1.0);
    o.depth_of_field = Some(lens());
    let mut hider = hider::Hider::new(o, vec![]).unwrap();
    let mp = hider::MicroPolygon::new(quad(4.0, 4.0, 5.0, 5.0, z)).unwrap();
    let info = hider::SampleInfo::flat(hider::Color::new(0.5, 0.25, 1.0), hider::Color::WHITE);
    hider.add_mpg(hider::QueuedMpg::new(hider::Geometry::Static(mp), info));
    let mut fb = hider::FrameBuffer::new(9, 9, &[]);
    let stats = hider.render(&mut fb, None).unwrap();
    (stats, fb)
}

#[test]
fn circle_of_confusion() {
    let l = lens();
    assert!(l.validate().is_ok());
    assert_eq!(l.coc(2.0), hider::Vec2::new(0.0, 0.0));
    let c = l.coc(1.0);
    assert!((c.x - 2.0).abs() < 1e-5 && (c.y - 2.0).abs() < 1e-5);
    let bad = hider::DepthOfField::new(0.5, 1.0, 0.5, hider::Vec2::new(1.0, 1.0));
    assert!(bad.validate().is_err());
}

#[test]
fn in_focus_is_sharp() {
    let (_, fb) = render(2.0);
    assert_eq!(fb.image.get(4, 4, "coverage").unwrap(), 1.0);
    assert_eq!(fb.image.get(4, 4, "r").unwrap(), 0.5);
    assert_eq!(fb.image.get(4, 4, "g").unwrap(), 0.25);
    for (x, y) in [(2, 4), (6, 4), (4, 2), (4, 6), (0, 0)] {
        assert_eq!(fb.image.get(x, y, "coverage").unwrap(), 0.0);
    }
}

#[test]
fn out_of_focus_spreads() {
    let (stats, fb) = render(1.0);
    assert!(fb.image.get(4, 4, "coverage").unwrap() < 1.0);
    let mut total = 0.0;
    let mut touched = 0;
    for y in 0 .. 9 {
        for x in 0 .. 9 {
            let a = fb.image.get(x, y, "a").unwrap();
            total += a;
            if a > 0.0 {
                touched += 1;
                // Spread stays within the circle of confusion
                let (dx, dy) = (x as f32 - 4.0, y as f32 - 4.0);
                assert!(dx.abs() <= 3.0 && dy.abs() <= 3.0, "pixel {} {}", x, y);
                assert_eq!(fb.image.get(x, y, "z").unwrap(), 1.0);
            }
        }
    }
    assert!(touched >= 3, "touched {}", touched);
    assert!(total > 0.4 && total < 1.8, "total {}", total);
    // Lens cells whose sub-bound misses the bucket's samples are skipped
    assert!(stats.totals.sample_tests < 9 * 9 * 16);
}

/// One quad, optionally handed back as a single split child first
#[derive(Debug)]
struct Patch {
    corners: [hider::Vec3; 4],
    split: bool,
}

impl hider::Surface for Patch {
    fn dice(&self, _ctx: &hider::RenderContext) -> hider::Dice {
        if self.split {
            let child = Patch { corners: self.corners, split: false };
            return hider::Dice::Split(vec![(Arc::new(child), hider::Bound::from_points(&self.corners))]);
        }
        let mp = hider::MicroPolygon::new(self.corners).unwrap();
        let info = hider::SampleInfo::flat(hider::Color::WHITE, hider::Color::WHITE);
        hider::Dice::Grid(vec![hider::QueuedMpg::new(hider::Geometry::Static(mp), info)])
    }
}

/// Alpha summed over the left of two 4x4 buckets
fn left_alpha(post: impl FnOnce(&mut hider::Hider)) -> f32 {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut o = hider::Options::default();
    o.resolution = (8, 4);
    o.bucket_size = (4, 4);
    o.pixel_samples = (4, 4);
    o.filter = hider::FilterKind::Box;
    o.filter_width = (1.0, 1.0);
    o.depth_of_field = Some(lens());
    let mut hider = hider::Hider::new(o, vec![]).unwrap();
    post(&mut hider);
    let mut fb = hider::FrameBuffer::new(8, 4, &[]);
    hider.render(&mut fb, None).unwrap();
    let mut total = 0.0;
    for y in 0 .. 4 {
        for x in 0 .. 4 {
            total += fb.image.get(x, y, "a").unwrap();
        }
    }
    total
}

#[test]
fn surface_blur_reaches_earlier_bucket() {
    // Sharp bound lies in the right bucket only, the blur crosses x = 4
    let c = quad(4.2, 1.0, 5.2, 2.0, 1.0);
    let direct = left_alpha(|h| {
        let mp = hider::MicroPolygon::new(c).unwrap();
        let info = hider::SampleInfo::flat(hider::Color::WHITE, hider::Color::WHITE);
        h.add_mpg(hider::QueuedMpg::new(hider::Geometry::Static(mp), info));
    });
    assert!(direct > 0.0, "direct {}", direct);
    for split in [false, true] {
        let diced = left_alpha(|h| {
            assert!(h.post_surface(Arc::new(Patch { corners: c, split }), hider::Bound::from_points(&c)));
        });
        assert_eq!(diced, direct, "split {}", split);
    }
}
