//! Surfaces and Queued Micropolygons
//!
//! The hider does not shade or dice. Upstream hands it either undiced
//! [`Surface`]s, which are diced when a bucket gets to them, or finished
//! micropolygons together with the [`SampleInfo`] that says how to turn a
//! hit into a visibility entry.
//!
//! [`Surface`]: trait.Surface.html
//! [`SampleInfo`]: struct.SampleInfo.html

use std::fmt::Debug;
use std::sync::Arc;

use crate::bound::Bound;
use crate::color::Color;
use crate::context::RenderContext;
use crate::dof::DepthOfField;
use crate::math::{bilerp, Vec2};
use crate::micropolygon::MicroPolygon;
use crate::motion::MotionMicroPolygon;
use crate::sample::{CsgRef, SamplePoint, VisibilityEntry, MATTE, OCCLUDES};

/// How shading values vary across a micropolygon
#[derive(Debug,PartialEq,Eq,Copy,Clone)]
pub enum Interpolation {
    /// Values of corner A everywhere
    Constant,
    /// Bilinear between the four corners
    Smooth,
}
impl Default for Interpolation {
    fn default() -> Interpolation {
        Interpolation::Constant
    }
}

/// Which side of the trim curves is kept
#[derive(Debug,PartialEq,Eq,Copy,Clone)]
pub enum TrimSense {
    KeepInside,
    KeepOutside,
}

/// Trim curves of a surface, evaluated in the surface's (u,v)
pub trait TrimRegion: Debug + Send + Sync {
    fn inside(&self, u: f32, v: f32) -> bool;
}

/// Trimming of one micropolygon
#[derive(Debug,Clone)]
pub struct TrimInfo {
    /// Surface (u,v) at corners A,B,C,D
    pub uv: [Vec2; 4],
    pub region: Arc<dyn TrimRegion>,
    pub sense: TrimSense,
}

impl TrimInfo {
    /// True if the point at bilinear `local` coordinates survives trimming
    pub fn keeps(&self, local: Vec2) -> bool {
        let uv = bilerp(self.uv[0], self.uv[1], self.uv[2], self.uv[3], local.x, local.y);
        let inside = self.region.inside(uv.x, uv.y);
        match self.sense {
            TrimSense::KeepInside => inside,
            TrimSense::KeepOutside => !inside,
        }
    }
}

/// Shading results and flags of a micropolygon
#[derive(Debug,Clone,Default)]
pub struct SampleInfo {
    /// Colors at corners A,B,C,D
    pub colors: [Color; 4],
    pub opacities: [Color; 4],
    /// Per corner AOV floats, laid out as declared on the context
    pub aovs: [Vec<f32>; 4],
    pub interpolation: Interpolation,
    pub matte: bool,
    pub csg: Option<CsgRef>,
    pub trim: Option<TrimInfo>,
    /// Detail levels `[d0, d1]` this micropolygon is visible to
    pub detail_range: Option<(f32, f32)>,
}

impl SampleInfo {
    /// Constant color and opacity
    pub fn flat(color: Color, opacity: Color) -> Self {
        Self { colors: [color; 4], opacities: [opacity; 4], ..Default::default() }
    }
    fn needs_local(&self) -> bool {
        self.interpolation == Interpolation::Smooth || self.trim.is_some()
    }
    /// Color, opacity and AOVs at bilinear `local` coordinates
    pub fn shade(&self, local: Vec2) -> (Color, Color, Vec<f32>) {
        match self.interpolation {
            Interpolation::Constant => (self.colors[0], self.opacities[0], self.aovs[0].clone()),
            Interpolation::Smooth => {
                let (s, t) = (local.x, local.y);
                let [c0, c1, c2, c3] = self.colors;
                let [o0, o1, o2, o3] = self.opacities;
                let aovs = (0 .. self.aovs[0].len()).map(|k| {
                    let v = |i: usize| self.aovs[i].get(k).copied().unwrap_or(0.0);
                    bilerp(v(0), v(1), v(2), v(3), s, t)
                }).collect();
                (bilerp(c0, c1, c2, c3, s, t), bilerp(o0, o1, o2, o3, s, t), aovs)
            }
        }
    }
}

/// Static or moving micropolygon geometry
#[derive(Debug)]
pub enum Geometry {
    Static(MicroPolygon),
    Moving(MotionMicroPolygon),
}

/// A micropolygon waiting in a bucket queue
#[derive(Debug)]
pub struct QueuedMpg {
    pub geometry: Geometry,
    pub info: SampleInfo,
}

impl QueuedMpg {
    pub fn new(geometry: Geometry, info: SampleInfo) -> Self {
        Self { geometry, info }
    }
    pub fn is_moving(&self) -> bool {
        matches!(self.geometry, Geometry::Moving(_))
    }
    /// Screen and depth bound, including lens blur
    pub fn bound(&self, dof: Option<&DepthOfField>) -> Bound {
        match &self.geometry {
            Geometry::Static(mp) => mp.bound(dof),
            Geometry::Moving(mp) => mp.bound(dof),
        }
    }
    /// Hit test and shade at one sample
    pub fn sample(&self, point: &SamplePoint, dof: Option<&DepthOfField>) -> Option<VisibilityEntry> {
        if let Some((d0, d1)) = self.info.detail_range {
            if point.detail_level < d0 || point.detail_level > d1 {
                return None;
            }
        }
        let need_local = self.info.needs_local();
        let lens = dof.map(|d| (d, point.lens_offset));
        let hit = match &self.geometry {
            Geometry::Static(mp) => mp.sample(point.position, lens, need_local),
            Geometry::Moving(mp) => mp.sample(point.position, point.time, lens, need_local),
        }?;
        if let Some(trim) = &self.info.trim {
            if !trim.keeps(hit.local) {
                return None;
            }
        }
        let (color, opacity, aovs) = self.info.shade(hit.local);
        let mut flags = 0;
        if opacity.is_opaque() && self.info.csg.is_none() {
            flags |= OCCLUDES;
        }
        if self.info.matte {
            flags |= MATTE;
        }
        Some(VisibilityEntry { depth: hit.depth, color, opacity, flags,
                               csg: self.info.csg.clone(), aovs })
    }
}

/// Result of dicing a surface
#[derive(Debug)]
pub enum Dice {
    /// Smaller surfaces with their bounds, queued again
    Split(Vec<(Arc<dyn Surface>, Bound)>),
    /// A finished grid of micropolygons
    Grid(Vec<QueuedMpg>),
}

/// An undiced surface, provided by the dicing pipeline
pub trait Surface: Debug + Send + Sync {
    /// Split the surface or dice it into micropolygons
    fn dice(&self, context: &RenderContext) -> Dice;
}
