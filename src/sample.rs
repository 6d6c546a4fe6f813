//! Sample Points and Visibility Entries

use std::sync::Arc;

use crate::color::Color;
use crate::csg::CsgTree;
use crate::math::Vec2;

/// Entry is fully opaque and hides everything behind it
pub const OCCLUDES : u8 = 0b0000_0001;
/// Entry punches out what is behind it instead of compositing over it
pub const MATTE    : u8 = 0b0000_0010;
/// Entry holds data, set on the opaque slot after a hit or combine
pub const VALID    : u8 = 0b0000_0100;

/// A stochastic sample location
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct SamplePoint {
    /// Raster position
    pub position: Vec2,
    /// Position within the pixel, in [0,1)
    pub unit_position: Vec2,
    /// Lens position in the unit disk
    pub lens_offset: Vec2,
    /// Lens-grid cell the offset was taken from
    pub lens_offset_index: usize,
    /// Shutter time
    pub time: f32,
    /// Level of detail selector in [0,1)
    pub detail_level: f32,
    /// Sub-cell of the pixel the sample is stratified into, `sy * xs + sx`
    pub sub_cell_index: usize,
}

/// Reference to a primitive node of a CSG tree
#[derive(Debug,Clone)]
pub struct CsgRef {
    pub tree: Arc<CsgTree>,
    pub node: usize,
}

/// One surface seen by a sample
#[derive(Debug,Clone)]
pub struct VisibilityEntry {
    pub depth: f32,
    pub color: Color,
    pub opacity: Color,
    /// Bits of [OCCLUDES], [MATTE] and [VALID]
    ///
    /// [OCCLUDES]: constant.OCCLUDES.html
    /// [MATTE]: constant.MATTE.html
    /// [VALID]: constant.VALID.html
    pub flags: u8,
    pub csg: Option<CsgRef>,
    /// Arbitrary output variables, laid out as declared on the context
    pub aovs: Vec<f32>,
}

impl Default for VisibilityEntry {
    fn default() -> Self {
        Self { depth: f32::INFINITY, color: Color::BLACK, opacity: Color::BLACK,
               flags: 0, csg: None, aovs: vec![] }
    }
}

impl VisibilityEntry {
    pub fn occludes(&self) -> bool {
        self.flags & OCCLUDES != 0
    }
    pub fn is_matte(&self) -> bool {
        self.flags & MATTE != 0
    }
    pub fn is_valid(&self) -> bool {
        self.flags & VALID != 0
    }
    /// Fully opaque, not a matte and not part of a CSG solid
    pub fn is_fast_opaque(&self) -> bool {
        self.occludes() && !self.is_matte() && self.csg.is_none()
    }
    /// Average color, opacity and AOVs with another entry at the same depth
    pub fn average_with(&mut self, other: &VisibilityEntry) {
        self.color = (self.color + other.color) * 0.5;
        self.opacity = (self.opacity + other.opacity) * 0.5;
        for (a, b) in self.aovs.iter_mut().zip(other.aovs.iter()) {
            *a = (*a + *b) * 0.5;
        }
    }
}

/// Visibility storage of one sample
///
/// Fully opaque, non-matte, non-CSG hits take the single opaque slot;
/// everything else goes into a depth ordered list. After combining, the
/// slot holds the composite.
#[derive(Debug,Clone,Default)]
pub struct SampleData {
    pub opaque: VisibilityEntry,
    pub entries: Vec<VisibilityEntry>,
}

impl SampleData {
    /// Empty the list and invalidate the opaque slot, keeping allocations
    pub fn clear(&mut self) {
        self.entries.clear();
        self.opaque.flags = 0;
        self.opaque.depth = f32::INFINITY;
        self.opaque.csg = None;
    }
    /// Depth beyond which nothing can be seen
    ///
    /// The list is truncated behind an occluding entry, so only its last
    /// entry needs checking.
    pub fn occlusion_depth(&self) -> f32 {
        let slot = if self.opaque.is_valid() { self.opaque.depth } else { f32::INFINITY };
        match self.entries.last() {
            Some(e) if e.occludes() => slot.min(e.depth),
            _ => slot,
        }
    }
}
