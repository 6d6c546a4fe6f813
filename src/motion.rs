//! Moving Micropolygons
//!
//! A moving micropolygon is a list of corner sets keyed by shutter time.
//! Between keys the corners move linearly. The shutter span of the keys is
//! split into a few ranges, each with its own bound, so a fast moving
//! micropolygon is only tested against samples near where it actually is.

use crate::bound::Bound;
use crate::dof::DepthOfField;
use crate::error::{HiderError, Result};
use crate::math::{lerp3, Vec2, Vec3};
use crate::micropolygon::{displace_corners, Hit, Quad, Triangulation};

/// Relative growth applied to interpolated sub-bounds
const SUB_BOUND_SLACK: f32 = 1e-4;

#[derive(Debug)]
struct Key {
    time: f32,
    corners: [Vec3; 4],
    /// Hit-test geometry, `None` if the corners are degenerate at this time
    quad: Option<Quad>,
}

/// Bound of the micropolygon over part of the shutter
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct TimeRange {
    /// Half open `[t0, t1)`; the first range starts at -inf and the last ends at +inf
    pub t0: f32,
    pub t1: f32,
    pub bound: Bound,
}

/// A micropolygon moving through time-keyed positions
#[derive(Debug)]
pub struct MotionMicroPolygon {
    keys: Vec<Key>,
    ranges: Vec<TimeRange>,
    bound: Bound,
    triangulation: Triangulation,
}

impl MotionMicroPolygon {
    /// Create from `(time, corners)` keys, bounded over `time_ranges` sub-ranges
    ///
    /// Keys are sorted by time. Fails if there are no keys or every key is
    /// degenerate.
    pub fn new(keys: Vec<(f32, [Vec3; 4])>, triangulation: Triangulation, time_ranges: usize) -> Result<Self> {
        let mut keys: Vec<Key> = keys.into_iter()
            .filter(|(t, _)| t.is_finite())
            .map(|(time, corners)| Key { time, corners, quad: Quad::new(corners, triangulation) })
            .collect();
        keys.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
        if keys.iter().all(|k| k.quad.is_none()) {
            return Err(HiderError::DegenerateMicroPolygon);
        }
        let mut bound = Bound::empty();
        for k in &keys {
            bound.union(&Bound::from_points(&k.corners));
        }
        let mut mp = Self { keys, ranges: vec![], bound, triangulation };
        mp.ranges = mp.compute_ranges(time_ranges.max(1));
        Ok(mp)
    }
    fn compute_ranges(&self, n: usize) -> Vec<TimeRange> {
        let t_first = self.keys[0].time;
        let t_last = self.keys[self.keys.len() - 1].time;
        let n = if t_last > t_first { n } else { 1 };
        let mut ranges = Vec::with_capacity(n);
        for r in 0 .. n {
            let ta = t_first + (t_last - t_first) * r as f32 / n as f32;
            let tb = t_first + (t_last - t_first) * (r + 1) as f32 / n as f32;
            let mut b = Bound::from_points(&self.corners_at(ta));
            b.union(&Bound::from_points(&self.corners_at(tb)));
            for k in self.keys.iter().filter(|k| k.time > ta && k.time < tb) {
                b.union(&Bound::from_points(&k.corners));
            }
            b.expand_conservative(SUB_BOUND_SLACK);
            let t0 = if r == 0 { f32::NEG_INFINITY } else { ta };
            let t1 = if r + 1 == n { f32::INFINITY } else { tb };
            ranges.push(TimeRange { t0, t1, bound: b });
        }
        ranges
    }
    /// Index of the last key at or before `time` and the blend towards the next
    fn bracket(&self, time: f32) -> (usize, f32) {
        let n = self.keys.len();
        if n == 1 || time <= self.keys[0].time {
            return (0, 0.0);
        }
        if time >= self.keys[n - 1].time {
            return (n - 1, 0.0);
        }
        let i = self.keys.partition_point(|k| k.time <= time) - 1;
        let (a, b) = (&self.keys[i], &self.keys[i + 1]);
        (i, (time - a.time) / (b.time - a.time))
    }
    /// Corner positions at `time`, held at the end keys outside their span
    pub fn corners_at(&self, time: f32) -> [Vec3; 4] {
        let (i, u) = self.bracket(time);
        if u == 0.0 {
            return self.keys[i].corners;
        }
        let (a, b) = (&self.keys[i].corners, &self.keys[i + 1].corners);
        [lerp3(a[0], b[0], u), lerp3(a[1], b[1], u), lerp3(a[2], b[2], u), lerp3(a[3], b[3], u)]
    }
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
    pub fn triangulation(&self) -> Triangulation {
        self.triangulation
    }
    /// Union of the key bounds, dilated by the largest circle of confusion with a lens
    pub fn bound(&self, dof: Option<&DepthOfField>) -> Bound {
        match dof {
            None => self.bound,
            Some(dof) => dof.dilate(&self.bound, Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)),
        }
    }
    /// Bounds over sub-ranges of the shutter
    pub fn time_ranges(&self) -> &[TimeRange] {
        &self.ranges
    }
    /// Hit test at raster point `p` and shutter `time`
    pub fn sample(&self, p: Vec2, time: f32, lens: Option<(&DepthOfField, Vec2)>, need_local: bool) -> Option<Hit> {
        let (i, u) = self.bracket(time);
        match lens {
            None if u == 0.0 => self.keys[i].quad.as_ref()?.hit(p, need_local),
            None => Quad::new(self.corners_at(time), self.triangulation)?.hit(p, need_local),
            Some((dof, offset)) => {
                let moved = displace_corners(&self.corners_at(time), dof, offset);
                Quad::new(moved, self.triangulation)?.hit(p, need_local)
            }
        }
    }
}
