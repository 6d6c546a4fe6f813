//! Micropolygons
//!
//! A micropolygon is a small quadrilateral `A,B,C,D` in hybrid space, raster
//! `x,y` plus camera depth `z`. Hit testing is four half-plane tests against
//! edge equations cached at construction, depth comes from the plane
//! through the corners.
//!
//! Corner labels follow the bilinear parameterization used for shading:
//!
//! ```text
//! D ---- C      (0,1) ---- (1,1)
//! |      |        |          |
//! A ---- B      (0,0) ---- (1,0)
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

use crate::bound::Bound;
use crate::dof::DepthOfField;
use crate::error::{HiderError, Result};
use crate::math::{Vec2, Vec3};

/// Corners closer than this in raster space are merged
const COINCIDENT_EPSILON: f32 = 1e-6;
/// Polygons with a smaller raster area cannot be hit
const AREA_EPSILON: f32 = 1e-10;

/// Which half of a quad is kept when a grid was built from triangles
#[derive(Debug,PartialEq,Eq,Copy,Clone)]
pub enum Triangulation {
    /// Whole quad
    Full,
    /// Triangle A,B,D of a quad split along B-D
    KeepAbd,
    /// Triangle B,C,D of a quad split along B-D
    KeepBcd,
    /// Triangle A,B,C of a quad split along A-C
    KeepAbc,
    /// Triangle A,C,D of a quad split along A-C
    KeepAcd,
}
impl Default for Triangulation {
    fn default() -> Triangulation {
        Triangulation::Full
    }
}

/// Half-plane `a*x + b*y + c >= 0`
#[derive(Debug,Default,Copy,Clone,PartialEq)]
struct Edge {
    a: f32,
    b: f32,
    c: f32,
}

impl Edge {
    /// Edge from `p` to `q`; points to the left are inside
    fn through(p: Vec2, q: Vec2) -> Self {
        let a = -(q.y - p.y);
        let b = q.x - p.x;
        let c = -(a * p.x + b * p.y);
        Self { a, b, c }
    }
    fn eval(&self, p: Vec2) -> f32 {
        self.a * p.x + self.b * p.y + self.c
    }
    fn flipped(&self) -> Self {
        Self { a: -self.a, b: -self.b, c: -self.c }
    }
}

/// Result of a successful hit test
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Hit {
    pub depth: f32,
    /// Bilinear (s,t) of the hit, zero unless requested
    pub local: Vec2,
}

/// Hit-test geometry for one set of corners
///
/// Coincident corners collapse to a triangle; clockwise polygons are
/// reversed so every edge keeps the inside on its left.
#[derive(Debug)]
pub struct Quad {
    corners: [Vec3; 4],
    edges: [Edge; 4],
    num_edges: usize,
    diagonal: Option<Edge>,
    /// Depth plane `z = zx * x + zy * y + z0`
    zx: f32,
    zy: f32,
    z0: f32,
    last_failed: AtomicU8,
}

impl Quad {
    /// Build the edge and plane equations, `None` if nothing can be hit
    pub fn new(corners: [Vec3; 4], triangulation: Triangulation) -> Option<Self> {
        let close = |p: Vec3, q: Vec3| {
            let (dx, dy) = (p.x - q.x, p.y - q.y);
            dx * dx + dy * dy <= COINCIDENT_EPSILON * COINCIDENT_EPSILON
        };
        if !corners.iter().all(|c| c.is_finite()) {
            return None;
        }
        // Edges are checked in the order A-B, B-C, C-D, D-A, the first
        // coincident pair loses its second corner
        let mut verts = [Vec3::ZERO; 4];
        let mut n = 4;
        match (0 .. 4).find(|&i| close(corners[i], corners[(i + 1) % 4])) {
            None => verts = corners,
            Some(i) => {
                let drop = (i + 1) % 4;
                n = 0;
                for (k, c) in corners.iter().enumerate() {
                    if k != drop {
                        verts[n] = *c;
                        n += 1;
                    }
                }
                for k in 0 .. 3 {
                    if close(verts[k], verts[(k + 1) % 3]) {
                        return None;
                    }
                }
            }
        }
        let poly = &mut verts[.. n];
        let mut area = 0.0;
        for k in 0 .. n {
            let (p, q) = (poly[k], poly[(k + 1) % n]);
            area += p.x * q.y - q.x * p.y;
        }
        if area.abs() * 0.5 < AREA_EPSILON || !area.is_finite() {
            return None;
        }
        if area < 0.0 {
            poly.reverse();
        }

        let mut edges = [Edge::default(); 4];
        for k in 0 .. n {
            edges[k] = Edge::through(poly[k].xy(), poly[(k + 1) % n].xy());
        }

        // Newell normal, robust for slightly non-planar quads
        let mut normal = Vec3::ZERO;
        let mut center = Vec3::ZERO;
        for k in 0 .. n {
            let (p, q) = (poly[k], poly[(k + 1) % n]);
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
            center = center + p;
        }
        center = center * (1.0 / n as f32);
        if normal.z.abs() < AREA_EPSILON {
            return None;
        }
        let zx = -normal.x / normal.z;
        let zy = -normal.y / normal.z;
        let z0 = center.z - zx * center.x - zy * center.y;

        let diagonal = match triangulation {
            Triangulation::Full => None,
            Triangulation::KeepAbd => Some(Self::split(&corners, 1, 3, 0)),
            Triangulation::KeepBcd => Some(Self::split(&corners, 1, 3, 2)),
            Triangulation::KeepAbc => Some(Self::split(&corners, 0, 2, 1)),
            Triangulation::KeepAcd => Some(Self::split(&corners, 0, 2, 3)),
        };

        Some(Self { corners, edges, num_edges: n, diagonal, zx, zy, z0,
                    last_failed: AtomicU8::new(0) })
    }
    /// Diagonal from corner `p` to `q`, oriented so corner `keep` is inside
    fn split(c: &[Vec3; 4], p: usize, q: usize, keep: usize) -> Edge {
        let e = Edge::through(c[p].xy(), c[q].xy());
        if e.eval(c[keep].xy()) < 0.0 { e.flipped() } else { e }
    }
    /// Corners in their labelled order
    pub fn corners(&self) -> &[Vec3; 4] {
        &self.corners
    }
    /// True if two corners were merged
    pub fn is_triangle(&self) -> bool {
        self.num_edges == 3
    }
    /// Point in polygon test
    ///
    /// Starts with the edge that rejected the previous point, neighbouring
    /// samples tend to fail on the same edge
    pub fn contains(&self, p: Vec2) -> bool {
        let n = self.num_edges;
        let start = self.last_failed.load(Ordering::Relaxed) as usize % n;
        for k in 0 .. n {
            let e = (start + k) % n;
            if self.edges[e].eval(p) < 0.0 {
                self.last_failed.store(e as u8, Ordering::Relaxed);
                return false;
            }
        }
        match &self.diagonal {
            Some(d) => d.eval(p) >= 0.0,
            None => true,
        }
    }
    /// Depth of the plane at `p`
    pub fn depth_at(&self, p: Vec2) -> f32 {
        self.zx * p.x + self.zy * p.y + self.z0
    }
    /// Hit test, with the bilinear coordinates when `need_local` is set
    pub fn hit(&self, p: Vec2, need_local: bool) -> Option<Hit> {
        if !self.contains(p) {
            return None;
        }
        let local = if need_local { self.local_coords(p) } else { Vec2::ZERO };
        Some(Hit { depth: self.depth_at(p), local })
    }
    /// Reverse bilinear solve of `p` into `(s,t)` on `A,B,C,D`
    ///
    /// Quadratic in `t`, then linear in `s`. The root inside `[0,1]` is
    /// chosen; results are clamped to the unit square.
    pub fn local_coords(&self, p: Vec2) -> Vec2 {
        let [a, b, c, d] = self.corners;
        let (a, b, c, d) = (a.xy(), b.xy(), c.xy(), d.xy());
        let e = b - a;
        let f = d - a;
        let g = a - b + c - d;
        let h = p - a;
        let k2 = g.cross(f);
        let k1 = e.cross(f) + h.cross(g);
        let k0 = h.cross(e);

        let in_unit = |v: f32| v >= -1e-4 && v <= 1.0 + 1e-4;
        let t = if k2.abs() < 1e-9 {
            if k1.abs() < 1e-12 { 0.0 } else { -k0 / k1 }
        } else {
            let disc = k1 * k1 - 4.0 * k0 * k2;
            if disc < 0.0 {
                -k1 / (2.0 * k2)
            } else {
                let sq = disc.sqrt();
                let t0 = (-k1 - sq) / (2.0 * k2);
                let t1 = (-k1 + sq) / (2.0 * k2);
                if in_unit(t0) { t0 } else { t1 }
            }
        };
        let dx = e.x + g.x * t;
        let dy = e.y + g.y * t;
        let s = if dx.abs() >= dy.abs() {
            if dx.abs() < 1e-12 { 0.0 } else { (h.x - f.x * t) / dx }
        } else {
            (h.y - f.y * t) / dy
        };
        let fix = |v: f32| if v.is_nan() { 0.0 } else { v.max(0.0).min(1.0) };
        Vec2::new(fix(s), fix(t))
    }
}

/// Displace corners by their circle of confusion times `lens`
pub fn displace_corners(corners: &[Vec3; 4], dof: &DepthOfField, lens: Vec2) -> [Vec3; 4] {
    let mut out = *corners;
    for c in out.iter_mut() {
        let coc = dof.coc(c.z);
        c.x += coc.x * lens.x;
        c.y += coc.y * lens.y;
    }
    out
}

/// Bound of the corners displaced by any lens offset in `[lens_min, lens_max]`
pub fn dof_corner_bound(corners: &[Vec3; 4], dof: &DepthOfField, lens_min: Vec2, lens_max: Vec2) -> Bound {
    let mut b = Bound::empty();
    for c in corners {
        let coc = dof.coc(c.z);
        b.encapsulate(Vec3::new(c.x + coc.x * lens_min.x, c.y + coc.y * lens_min.y, c.z));
        b.encapsulate(Vec3::new(c.x + coc.x * lens_max.x, c.y + coc.y * lens_max.y, c.z));
    }
    b
}

/// A stationary micropolygon
#[derive(Debug)]
pub struct MicroPolygon {
    quad: Quad,
    triangulation: Triangulation,
    bound: Bound,
}

impl MicroPolygon {
    /// Create a micropolygon from its corners
    ///
    ///     use hider::{MicroPolygon,Vec2,Vec3};
    ///
    ///     let mp = MicroPolygon::new([Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0),
    ///                                 Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 1.0, 1.0)]).unwrap();
    ///     assert_eq!(mp.sample(Vec2::new(0.5, 0.5), None, false).unwrap().depth, 1.0);
    ///     assert!(mp.sample(Vec2::new(3.0, 0.5), None, false).is_none());
    ///
    pub fn new(corners: [Vec3; 4]) -> Result<Self> {
        Self::with_triangulation(corners, Triangulation::Full)
    }
    /// Create a micropolygon that keeps only one triangle of the quad
    pub fn with_triangulation(corners: [Vec3; 4], triangulation: Triangulation) -> Result<Self> {
        let quad = Quad::new(corners, triangulation).ok_or(HiderError::DegenerateMicroPolygon)?;
        let bound = Bound::from_points(&corners);
        Ok(Self { quad, triangulation, bound })
    }
    pub fn corners(&self) -> &[Vec3; 4] {
        self.quad.corners()
    }
    pub fn triangulation(&self) -> Triangulation {
        self.triangulation
    }
    pub fn is_triangle(&self) -> bool {
        self.quad.is_triangle()
    }
    /// Bound of the corners, dilated by the circle of confusion when `dof` is given
    pub fn bound(&self, dof: Option<&DepthOfField>) -> Bound {
        match dof {
            None => self.bound,
            Some(dof) => dof_corner_bound(self.corners(), dof, Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)),
        }
    }
    /// Bound over lens offsets in `[lens_min, lens_max]`
    pub fn lens_sub_bound(&self, dof: &DepthOfField, lens_min: Vec2, lens_max: Vec2) -> Bound {
        dof_corner_bound(self.corners(), dof, lens_min, lens_max)
    }
    /// Hit test at raster point `p`
    ///
    /// With a lens, each corner moves by its circle of confusion times the
    /// sample's lens offset before testing.
    pub fn sample(&self, p: Vec2, lens: Option<(&DepthOfField, Vec2)>, need_local: bool) -> Option<Hit> {
        match lens {
            None => self.quad.hit(p, need_local),
            Some((dof, offset)) => {
                let moved = displace_corners(self.corners(), dof, offset);
                Quad::new(moved, self.triangulation)?.hit(p, need_local)
            }
        }
    }
}
