extern crate hider;

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn v(x: f32, y: f32, z: f32) -> hider::Vec3 {
    hider::Vec3::new(x, y, z)
}

fn centroid(c: &[hider::Vec3; 4]) -> hider::Vec2 {
    hider::Vec2::new((c[0].x + c[1].x + c[2].x + c[3].x) * 0.25,
                     (c[0].y + c[1].y + c[2].y + c[3].y) * 0.25)
}

fn convex_quads() -> Vec<[hider::Vec3; 4]> {
    vec![
        [v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.0), v(1.0, 1.0, 1.0), v(0.0, 1.0, 1.0)],
        [v(10.2, 3.1, 2.0), v(12.7, 3.9, 2.5), v(12.1, 6.0, 3.0), v(9.8, 5.2, 2.5)],
        [v(-3.0, -1.0, 5.0), v(0.5, -2.0, 4.0), v(1.0, 0.25, 4.5), v(-2.5, 1.5, 6.0)],
        // Thin sliver
        [v(0.0, 0.0, 1.0), v(8.0, 0.0, 1.0), v(8.0, 0.1, 1.0), v(0.0, 0.1, 1.0)],
    ]
}

#[test]
fn centroid_hits_and_far_points_miss() {
    for c in convex_quads() {
        // Both windings
        for corners in [c, [c[3], c[2], c[1], c[0]]] {
            let mp = hider::MicroPolygon::new(corners).unwrap();
            let p = centroid(&corners);
            let hit = mp.sample(p, None, false);
            assert!(hit.is_some(), "centroid {:?} missed {:?}", p, corners);
            let b = mp.bound(None);
            assert!(hit.unwrap().depth >= b.min.z - 1e-4 && hit.unwrap().depth <= b.max.z + 1e-4);
            for far in [hider::Vec2::new(b.max.x + 10.0, p.y), hider::Vec2::new(p.x, b.min.y - 10.0),
                        hider::Vec2::new(b.min.x - 0.5, b.min.y - 0.5)] {
                assert!(mp.sample(far, None, false).is_none());
            }
        }
    }
}

#[test]
fn depth_follows_the_plane() {
    // z = 1 + x / 4
    let mp = hider::MicroPolygon::new([v(0.0, 0.0, 1.0), v(4.0, 0.0, 2.0),
                                       v(4.0, 4.0, 2.0), v(0.0, 4.0, 1.0)]).unwrap();
    for x in [0.5, 1.0, 2.5, 3.75] {
        let h = mp.sample(hider::Vec2::new(x, 2.0), None, false).unwrap();
        assert!(approx_eq(h.depth, 1.0 + x / 4.0, 1e-5), "{} {}", x, h.depth);
    }
}

#[test]
fn collapsed_corner_makes_a_triangle() {
    let mp = hider::MicroPolygon::new([v(0.0, 0.0, 1.0), v(2.0, 0.0, 1.0),
                                       v(2.0, 2.0, 1.0), v(2.0, 2.0, 1.0)]).unwrap();
    assert!(mp.is_triangle());
    assert!(mp.sample(hider::Vec2::new(1.5, 0.5), None, false).is_some());
    assert!(mp.sample(hider::Vec2::new(0.5, 1.5), None, false).is_none());
    assert!(matches!(hider::MicroPolygon::new([v(0.0, 0.0, 1.0), v(1.0, 1.0, 1.0),
                                               v(2.0, 2.0, 1.0), v(3.0, 3.0, 1.0)]),
                     Err(hider::HiderError::DegenerateMicroPolygon)));
}

#[test]
fn smooth_shading_uses_local_coordinates() {
    let corners = [v(0.0, 0.0, 1.0), v(2.0, 0.0, 1.0), v(2.0, 2.0, 1.0), v(0.0, 2.0, 1.0)];
    let mp = hider::MicroPolygon::new(corners).unwrap();
    let mut info = hider::SampleInfo::flat(hider::Color::BLACK, hider::Color::WHITE);
    info.colors = [hider::Color::BLACK, hider::Color::new(1.0, 0.0, 0.0),
                   hider::Color::new(1.0, 1.0, 0.0), hider::Color::new(0.0, 1.0, 0.0)];
    info.interpolation = hider::Interpolation::Smooth;
    let q = hider::QueuedMpg::new(hider::Geometry::Static(mp), info);
    let point = hider::SamplePoint { position: hider::Vec2::new(0.5, 1.5), ..Default::default() };
    let e = q.sample(&point, None).unwrap();
    assert!(approx_eq(e.color.r, 0.25, 1e-4) && approx_eq(e.color.g, 0.75, 1e-4));
    assert!(e.occludes());
}
