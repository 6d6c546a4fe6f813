//! Depth of Field
//!
//! A thin lens blurs a point at depth `z` into a circle of confusion. The
//! hider displaces each micropolygon corner by its own circle of confusion
//! times the sample's lens offset; bounds are dilated the same way.

use crate::bound::Bound;
use crate::error::{HiderError, Result};
use crate::math::Vec2;

/// Smallest depth used when evaluating the circle of confusion
const MIN_DEPTH: f32 = 1e-4;

/// Thin lens parameters
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct DepthOfField {
    pub fstop: f32,
    pub focal_length: f32,
    pub focal_distance: f32,
    /// Raster pixels per camera-space unit on the image plane, in x and y
    pub raster_scale: Vec2,
    multiplier: f32,
}

impl DepthOfField {
    pub fn new(fstop: f32, focal_length: f32, focal_distance: f32, raster_scale: Vec2) -> Self {
        let lens_radius = 0.5 * focal_length / fstop;
        let multiplier = lens_radius * focal_length * focal_distance / (focal_distance - focal_length);
        Self { fstop, focal_length, focal_distance, raster_scale, multiplier }
    }
    pub fn validate(&self) -> Result<()> {
        if !(self.fstop > 0.0) || !(self.focal_length > 0.0)
            || !(self.focal_distance > self.focal_length) || !self.multiplier.is_finite() {
            return Err(HiderError::InvalidOptions(
                "lens needs fstop > 0, focal length > 0 and focal distance beyond the focal length".into()));
        }
        Ok(())
    }
    /// Circle of confusion radius in raster units, per axis
    pub fn coc(&self, z: f32) -> Vec2 {
        let z = z.max(MIN_DEPTH);
        let r = self.multiplier * (1.0 / z - 1.0 / self.focal_distance).abs();
        Vec2::new(r * self.raster_scale.x, r * self.raster_scale.y)
    }
    /// Largest circle of confusion over a depth range
    ///
    /// `|1/z - 1/d|` is convex in `1/z`, so the end points bound it
    pub fn max_coc(&self, zmin: f32, zmax: f32) -> Vec2 {
        let a = self.coc(zmin);
        let b = self.coc(zmax);
        Vec2::new(a.x.max(b.x), a.y.max(b.y))
    }
    /// Dilate a bound by every displacement `coc * lens`, with `lens` inside `lens_bound`
    pub fn dilate(&self, bound: &Bound, lens_min: Vec2, lens_max: Vec2) -> Bound {
        let coc = self.max_coc(bound.min.z, bound.max.z);
        let mut b = *bound;
        b.min.x += (coc.x * lens_min.x).min(0.0);
        b.min.y += (coc.y * lens_min.y).min(0.0);
        b.max.x += (coc.x * lens_max.x).max(0.0);
        b.max.y += (coc.y * lens_max.y).max(0.0);
        b
    }
}

/// Map a point of the square `[-1,1]^2` onto the unit disk
///
/// Scales by the dominant axis so square rings land on circles
pub fn square_to_disk(p: Vec2) -> Vec2 {
    let len = p.length();
    if len == 0.0 {
        return p;
    }
    let scale = p.x.abs().max(p.y.abs()) / len;
    p * scale
}

/// Lens-grid cell `(i,j)` of an `nx` x `ny` grid over `[-1,1]^2`
pub fn lens_cell(i: usize, j: usize, nx: usize, ny: usize) -> (Vec2, Vec2) {
    let x0 = 2.0 * i as f32 / nx as f32 - 1.0;
    let x1 = 2.0 * (i + 1) as f32 / nx as f32 - 1.0;
    let y0 = 2.0 * j as f32 / ny as f32 - 1.0;
    let y1 = 2.0 * (j + 1) as f32 / ny as f32 - 1.0;
    (Vec2::new(x0, y0), Vec2::new(x1, y1))
}

/// Box containing the disk image of the square cell `[min,max]`
///
/// The mapping shrinks points towards the origin by a factor within
/// `[1/sqrt(2), 1]`, keeping their sign
pub fn lens_region_bound(min: Vec2, max: Vec2) -> (Vec2, Vec2) {
    let shrink = std::f32::consts::FRAC_1_SQRT_2;
    let axis = |lo: f32, hi: f32| {
        if lo >= 0.0 {
            (lo * shrink, hi)
        } else if hi <= 0.0 {
            (lo, hi * shrink)
        } else {
            (lo, hi)
        }
    };
    let (x0, x1) = axis(min.x, max.x);
    let (y0, y1) = axis(min.y, max.y);
    (Vec2::new(x0, y0), Vec2::new(x1, y1))
}
