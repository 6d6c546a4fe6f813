extern crate hider;

fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> [hider::Vec3; 4] {
    [hider::Vec3::new(x0, y0, z), hider::Vec3::new(x1, y0, z),
     hider::Vec3::new(x1, y1, z), hider::Vec3::new(x0, y1, z)]
}

fn flat(z: f32, color: hider::Color, opacity: hider::Color) -> hider::QueuedMpg {
    let mp = hider::MicroPolygon::new(quad(-1.0, -1.0, 3.0, 3.0, z)).unwrap();
    hider::QueuedMpg::new(hider::Geometry::Static(mp), hider::SampleInfo::flat(color, opacity))
}

fn render(mpgs: Vec<hider::QueuedMpg>) -> hider::FrameBuffer {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut o = hider::Options::default();
    o.resolution = (2, 2);
    o.pixel_samples = (4, 4);
    o.filter = hider::FilterKind::Box;
    o.filter_width = (1.0, 1.0);
    let mut hider = hider::Hider::new(o, vec![]).unwrap();
    for m in mpgs {
        hider.add_mpg(m);
    }
    let mut fb = hider::FrameBuffer::new(2, 2, &[]);
    hider.render(&mut fb, None).unwrap();
    fb
}

fn rgb(fb: &hider::FrameBuffer, x: usize, y: usize) -> (f32, f32, f32) {
    let i = &fb.image;
    (i.get(x, y, "r").unwrap(), i.get(x, y, "g").unwrap(), i.get(x, y, "b").unwrap())
}

#[test]
fn opaque_red_over_opaque_blue() {
    let red = hider::Color::new(1.0, 0.0, 0.0);
    let blue = hider::Color::new(0.0, 0.0, 1.0);
    // Far surface first, so the near one has to replace it
    let fb = render(vec![flat(2.0, blue, hider::Color::WHITE), flat(1.0, red, hider::Color::WHITE)]);
    for y in 0 .. 2 {
        for x in 0 .. 2 {
            assert_eq!(rgb(&fb, x, y), (1.0, 0.0, 0.0));
            assert_eq!(fb.image.get(x, y, "z").unwrap(), 1.0);
            assert_eq!(fb.image.get(x, y, "a").unwrap(), 1.0);
        }
    }
    // Near surface first, the far one is hidden at insertion
    let fb = render(vec![flat(1.0, red, hider::Color::WHITE), flat(2.0, blue, hider::Color::WHITE)]);
    assert_eq!(rgb(&fb, 1, 1), (1.0, 0.0, 0.0));
}

#[test]
fn half_transparent_green_over_red() {
    let red = hider::Color::new(1.0, 0.0, 0.0);
    let green = hider::Color::new(0.0, 1.0, 0.0);
    let fb = render(vec![flat(2.0, red, hider::Color::WHITE), flat(1.0, green, hider::Color::gray(0.5))]);
    for y in 0 .. 2 {
        for x in 0 .. 2 {
            assert_eq!(rgb(&fb, x, y), (0.5, 0.5, 0.0));
            assert_eq!(fb.image.get(x, y, "a").unwrap(), 1.0);
            // Depth comes from the first surface that makes the sample opaque
            assert_eq!(fb.image.get(x, y, "z").unwrap(), 2.0);
        }
    }
}

#[test]
fn transparent_layers_alone() {
    let green = hider::Color::new(0.0, 1.0, 0.0);
    let fb = render(vec![flat(1.0, green, hider::Color::gray(0.5)), flat(3.0, green, hider::Color::gray(0.5))]);
    let (r, g, b) = rgb(&fb, 0, 0);
    assert_eq!((r, b), (0.0, 0.0));
    assert_eq!(g, 0.75);
    assert_eq!(fb.image.get(0, 0, "a").unwrap(), 0.75);
    assert_eq!(fb.image.get(0, 0, "coverage").unwrap(), 1.0);
    // Never reaches full opacity
    assert_eq!(fb.image.get(0, 0, "z").unwrap(), f32::INFINITY);
}

#[test]
fn matte_cuts_a_hole() {
    let red = hider::Color::new(1.0, 0.0, 0.0);
    let mp = hider::MicroPolygon::new(quad(-1.0, -1.0, 3.0, 3.0, 1.0)).unwrap();
    let mut info = hider::SampleInfo::flat(hider::Color::new(0.0, 1.0, 0.0), hider::Color::WHITE);
    info.matte = true;
    let matte = hider::QueuedMpg::new(hider::Geometry::Static(mp), info);
    let fb = render(vec![flat(2.0, red, hider::Color::WHITE), matte]);
    assert_eq!(rgb(&fb, 0, 0), (0.0, 0.0, 0.0));
    assert_eq!(fb.image.get(0, 0, "a").unwrap(), 0.0);
}
