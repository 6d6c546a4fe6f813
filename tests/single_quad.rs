extern crate hider;

use std::sync::Arc;

fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> [hider::Vec3; 4] {
    [hider::Vec3::new(x0, y0, z), hider::Vec3::new(x1, y0, z),
     hider::Vec3::new(x1, y1, z), hider::Vec3::new(x0, y1, z)]
}

fn options() -> hider::Options {
    let mut o = hider::Options::default();
    o.resolution = (3, 3);
    o.pixel_samples = (4, 4);
    o.filter = hider::FilterKind::Box;
    o.filter_width = (1.0, 1.0);
    o
}

#[test]
fn single_quad_covers_one_pixel() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut hider = hider::Hider::new(options(), vec![]).unwrap();
    let color = hider::Color::new(0.25, 0.5, 0.75);
    let mp = hider::MicroPolygon::new(quad(1.0, 1.0, 2.0, 2.0, 2.0)).unwrap();
    let info = hider::SampleInfo::flat(color, hider::Color::WHITE);
    assert_eq!(hider.add_mpg(hider::QueuedMpg::new(hider::Geometry::Static(mp), info)), 1);

    let mut fb = hider::FrameBuffer::new(3, 3, &[]);
    let stats = hider.render(&mut fb, None).unwrap();
    assert_eq!(stats.buckets, 1);
    assert_eq!(stats.failed_buckets, 0);
    assert_eq!(fb.buckets, 1);

    let img = &fb.image;
    let px = |name: &str| img.get(1, 1, name).unwrap();
    assert_eq!((px("r"), px("g"), px("b")), (0.25, 0.5, 0.75));
    assert_eq!((px("or"), px("og"), px("ob")), (1.0, 1.0, 1.0));
    assert_eq!(px("a"), 1.0);
    assert_eq!(px("coverage"), 1.0);
    assert_eq!(px("z"), 2.0);

    // Diagonal neighbour sees nothing
    assert_eq!(img.get(0, 0, "coverage").unwrap(), 0.0);
    assert_eq!(img.get(0, 0, "a").unwrap(), 0.0);
    assert_eq!(img.get(0, 0, "z").unwrap(), f32::INFINITY);
    assert_eq!(img.get(2, 2, "coverage").unwrap(), 0.0);
}

#[derive(Debug)]
struct Flat {
    corners: [hider::Vec3; 4],
    color: hider::Color,
}

impl hider::Surface for Flat {
    fn dice(&self, _ctx: &hider::RenderContext) -> hider::Dice {
        let mp = hider::MicroPolygon::new(self.corners).unwrap();
        let info = hider::SampleInfo::flat(self.color, hider::Color::WHITE);
        hider::Dice::Grid(vec![hider::QueuedMpg::new(hider::Geometry::Static(mp), info)])
    }
}

#[test]
fn single_quad_from_surface() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut hider = hider::Hider::new(options(), vec![]).unwrap();
    let corners = quad(1.0, 1.0, 2.0, 2.0, 2.0);
    let bound = hider::Bound::from_points(&corners);
    let surface = Arc::new(Flat { corners, color: hider::Color::new(0.5, 0.5, 0.5) });
    assert!(hider.post_surface(surface, bound));

    let mut fb = hider::FrameBuffer::new(3, 3, &[]);
    let stats = hider.render(&mut fb, None).unwrap();
    assert_eq!(stats.totals.surfaces_diced, 1);
    assert_eq!(stats.totals.mpgs_sampled, 1);
    assert_eq!(fb.image.get(1, 1, "r").unwrap(), 0.5);
    assert_eq!(fb.image.get(1, 1, "coverage").unwrap(), 1.0);
}

#[test]
fn surface_off_image_is_rejected() {
    let mut hider = hider::Hider::new(options(), vec![]).unwrap();
    let corners = quad(10.0, 10.0, 11.0, 11.0, 2.0);
    let bound = hider::Bound::from_points(&corners);
    let surface = Arc::new(Flat { corners, color: hider::Color::WHITE });
    assert!(!hider.post_surface(surface, bound));
}
