extern crate hider;

fn grid(seed: u64) -> hider::SampleGrid {
    let mut g = hider::SampleGrid::new(seed);
    g.allocate_samples(5, 3, 3, 2);
    g.initialise_samples((0.0, 1.0));
    g
}

#[test]
fn offset_samples_moves_every_point() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = grid(11);
    for origin in [hider::Vec2::new(37.0, 11.0), hider::Vec2::new(-4.0, 3.0)] {
        g.offset_samples(origin);
        let spp = g.samples_per_pixel();
        for (i, p) in g.points().iter().enumerate() {
            let pixel = i / spp;
            let (px, py) = ((pixel % 5) as f32, (pixel / 5) as f32);
            assert_eq!(p.position.x, origin.x + px + p.unit_position.x);
            assert_eq!(p.position.y, origin.y + py + p.unit_position.y);
        }
        assert_eq!(g.origin(), origin);
    }
}

#[test]
fn pattern_ranges() {
    let g = grid(3);
    assert_eq!(g.len(), 5 * 3 * 6);
    for p in g.points() {
        assert!(p.unit_position.x >= 0.0 && p.unit_position.x <= 1.0);
        assert!(p.unit_position.y >= 0.0 && p.unit_position.y <= 1.0);
        assert!(p.time >= 0.0 && p.time <= 1.0);
        assert!(p.detail_level >= 0.0 && p.detail_level <= 1.0);
        assert!(p.lens_offset.length() <= 1.0 + 1e-5);
        assert!(p.lens_offset_index < 6);
        assert!(p.sub_cell_index < 6);
    }
    // Every lens cell once per pixel
    let spp = g.samples_per_pixel();
    for pixel in 0 .. 15 {
        let mut cells: Vec<usize> = (0 .. spp).map(|k| g.point(pixel * spp + k).lens_offset_index).collect();
        cells.sort();
        assert_eq!(cells, (0 .. spp).collect::<Vec<_>>());
    }
}

#[test]
fn same_seed_same_pattern() {
    let a = grid(5);
    let b = grid(5);
    assert_eq!(a.points(), b.points());
    let mut c = grid(99);
    c.reseed(5);
    c.initialise_samples((0.0, 1.0));
    assert_eq!(a.points(), c.points());
}

fn entry(depth: f32, color: hider::Color, opacity: hider::Color) -> hider::VisibilityEntry {
    let flags = if opacity.is_opaque() { hider::OCCLUDES } else { 0 };
    hider::VisibilityEntry { depth, color, opacity, flags, ..Default::default() }
}

#[test]
fn combine_twice_is_combine_once() {
    let mut g = grid(1);
    let red = hider::Color::new(1.0, 0.0, 0.0);
    let blue = hider::Color::new(0.0, 0.0, 1.0);
    for i in 0 .. g.len() {
        match i % 4 {
            0 => {},
            1 => { g.insert_hit(i, entry(2.0, red, hider::Color::WHITE)); },
            2 => {
                g.insert_hit(i, entry(1.0, blue, hider::Color::gray(0.25)));
                g.insert_hit(i, entry(3.0, red, hider::Color::WHITE));
            },
            _ => {
                g.insert_hit(i, entry(1.0, blue, hider::Color::gray(0.5)));
                g.insert_hit(i, entry(1.5, red, hider::Color::gray(0.5)));
            },
        }
    }
    g.combine(hider::DepthFilter::Min, &hider::Color::WHITE).unwrap();
    let once: Vec<(f32, hider::Color, hider::Color, bool)> = (0 .. g.len())
        .map(|i| { let o = &g.data(i).opaque; (o.depth, o.color, o.opacity, o.is_valid()) })
        .collect();
    g.combine(hider::DepthFilter::Min, &hider::Color::WHITE).unwrap();
    for i in 0 .. g.len() {
        let o = &g.data(i).opaque;
        assert_eq!((o.depth, o.color, o.opacity, o.is_valid()), once[i]);
        assert!(g.data(i).entries.is_empty());
    }
    // Spot check the layers
    assert!(!once[0].3);
    assert_eq!(once[1].0, 2.0);
    assert_eq!(once[2].0, 3.0);
    assert_eq!(once[3].0, f32::INFINITY);
    assert_eq!(once[3].2, hider::Color::gray(0.75));
}

#[test]
fn hidden_hits_are_rejected() {
    let mut g = grid(2);
    assert_eq!(g.insert_hit(0, entry(2.0, hider::Color::WHITE, hider::Color::WHITE)), Some(2.0));
    assert_eq!(g.insert_hit(0, entry(3.0, hider::Color::WHITE, hider::Color::gray(0.5))), None);
    assert!(g.data(0).entries.is_empty());
    assert_eq!(g.insert_hit(0, entry(1.0, hider::Color::WHITE, hider::Color::WHITE)), Some(1.0));
    assert_eq!(g.data(0).opaque.depth, 1.0);
}
