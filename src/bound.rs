//! Axis aligned bounds in hybrid raster/camera space

use crate::math::{Vec2, Vec3};

/// Axis aligned box
///
/// `x` and `y` are raster coordinates, `z` is camera depth. A freshly
/// created bound is empty (min > max) and grows with [`encapsulate`].
///
/// [`encapsulate`]: #method.encapsulate
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct Bound {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bound {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bound {
    /// Create a new bound from two corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }
    /// Empty bound, encapsulating anything yields that thing
    pub fn empty() -> Self {
        let inf = f32::INFINITY;
        Self { min: Vec3::new(inf, inf, inf), max: Vec3::new(-inf, -inf, -inf) }
    }
    /// Bound of a set of points
    pub fn from_points(pts: &[Vec3]) -> Self {
        let mut b = Self::empty();
        for p in pts {
            b.encapsulate(*p);
        }
        b
    }
    /// Expand if the point is outside
    pub fn encapsulate(&mut self, p: Vec3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }
    /// Expand if the other bound is outside
    pub fn union(&mut self, other: &Bound) {
        self.encapsulate(other.min);
        self.encapsulate(other.max);
    }
    /// Grow in all directions by a relative amount plus a small absolute slack
    pub fn expand_conservative(&mut self, rel: f32) {
        let ex = (self.max.x - self.min.x).abs() * rel + f32::EPSILON;
        let ey = (self.max.y - self.min.y).abs() * rel + f32::EPSILON;
        let ez = (self.max.z - self.min.z).abs() * rel + f32::EPSILON;
        self.min = self.min - Vec3::new(ex, ey, ez);
        self.max = self.max + Vec3::new(ex, ey, ez);
    }
    /// True if any coordinate is NaN or the bound is inverted
    pub fn is_malformed(&self) -> bool {
        let v = [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z];
        v.iter().any(|c| c.is_nan())
            || self.min.x > self.max.x
            || self.min.y > self.max.y
            || self.min.z > self.max.z
    }
    /// Overlap test ignoring depth, touching edges count as overlapping
    pub fn intersects_2d(&self, min: Vec2, max: Vec2) -> bool {
        self.min.x <= max.x && self.max.x >= min.x
            && self.min.y <= max.y && self.max.y >= min.y
    }
    /// True if the 2D projection of this bound lies within `[min, max]`
    pub fn within_2d(&self, min: Vec2, max: Vec2) -> bool {
        self.min.x >= min.x && self.max.x <= max.x
            && self.min.y >= min.y && self.max.y <= max.y
    }
    /// Does the 2D projection contain the point
    pub fn contains_2d(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
