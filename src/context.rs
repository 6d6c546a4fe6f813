//! Render Context
//!
//! Everything the per-bucket machinery needs to know about the render as a
//! whole. Built once, then shared by reference; nothing in it changes while
//! buckets are processed.

use crate::bound::Bound;
use crate::dof::DepthOfField;
use crate::error::Result;
use crate::filter::FilterWeights;
use crate::math::Vec2;
use crate::options::Options;

/// Arbitrary output variable declared by the renderer
#[derive(Debug,Clone,PartialEq)]
pub struct AovSpec {
    pub name: String,
    /// Number of floats, 1 for a scalar, 3 for a color or point
    pub size: usize,
}

impl AovSpec {
    pub fn new(name: &str, size: usize) -> Self {
        Self { name: name.to_string(), size }
    }
    /// Channel names written for this variable
    pub fn channel_names(&self) -> Vec<String> {
        if self.size == 1 {
            vec![self.name.clone()]
        } else {
            (0 .. self.size).map(|i| format!("{}.{}", self.name, i)).collect()
        }
    }
}

/// Shared, read-only render state
#[derive(Debug,Clone)]
pub struct RenderContext {
    pub options: Options,
    pub filter: FilterWeights,
    pub aovs: Vec<AovSpec>,
    aov_floats: usize,
}

impl RenderContext {
    /// Validate the options and precompute the filter tables
    pub fn new(options: Options, aovs: Vec<AovSpec>) -> Result<Self> {
        options.validate()?;
        let (xs, ys) = (options.pixel_samples.0 as usize, options.pixel_samples.1 as usize);
        let filter = FilterWeights::new(options.filter, options.filter_width, xs, ys,
                                        options.separable_filter_threshold);
        let aov_floats = aovs.iter().map(|a| a.size).sum();
        Ok(Self { options, filter, aovs, aov_floats })
    }
    /// Lens, if depth of field is enabled
    pub fn dof(&self) -> Option<&DepthOfField> {
        self.options.depth_of_field.as_ref()
    }
    /// Total number of AOV floats carried by each visibility entry
    pub fn aov_floats(&self) -> usize {
        self.aov_floats
    }
    /// Samples across and down each pixel
    pub fn pixel_samples(&self) -> (usize, usize) {
        (self.options.pixel_samples.0 as usize, self.options.pixel_samples.1 as usize)
    }
    /// Screen bound of an undiced surface
    ///
    /// Grown by the circle of confusion over the whole lens so that it
    /// covers every micropolygon the surface can dice into.
    pub fn surface_bound(&self, bound: &Bound) -> Bound {
        match self.dof() {
            Some(d) => d.dilate(bound, Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)),
            None => *bound,
        }
    }
}
