//! Render Options

use crate::color::Color;
use crate::dof::DepthOfField;
use crate::error::{HiderError, Result};
use crate::filter::FilterKind;

/// How the exported depth of a sample is derived from its opaque layers
#[derive(Debug,PartialEq,Eq,Copy,Clone)]
pub enum DepthFilter {
    /// Nearest opaque depth
    Min,
    /// Halfway between the nearest and second nearest opaque depths
    Midpoint,
    /// Farthest opaque depth
    Max,
    /// Mean of all opaque depths
    Average,
}
impl Default for DepthFilter {
    fn default() -> DepthFilter {
        DepthFilter::Min
    }
}

/// Bucket traversal policy, has no effect on the output image
#[derive(Debug,PartialEq,Eq,Copy,Clone)]
pub enum BucketOrder {
    /// Row by row, left to right
    Horizontal,
    /// Column by column, top to bottom
    Vertical,
    /// Row by row, alternating direction
    ZigZag,
    /// Outwards from the center
    Circle,
    /// Shuffled with the render seed
    Random,
}
impl Default for BucketOrder {
    fn default() -> BucketOrder {
        BucketOrder::Horizontal
    }
}

/// Options controlling sampling and reconstruction
#[derive(Debug,Clone)]
pub struct Options {
    /// Image size in pixels
    pub resolution: (u32, u32),
    /// Crop window as (xmin, xmax, ymin, ymax) in [0,1]
    pub crop_window: (f32, f32, f32, f32),
    /// Bucket size in pixels
    pub bucket_size: (u32, u32),
    /// Samples per pixel in x and y
    pub pixel_samples: (u32, u32),
    /// Reconstruction filter
    pub filter: FilterKind,
    /// Reconstruction filter support in pixels
    pub filter_width: (f32, f32),
    /// Shutter open and close times
    pub shutter: (f32, f32),
    /// Thin lens parameters, `None` for a pinhole camera
    pub depth_of_field: Option<DepthOfField>,
    /// Accumulated opacity at which a layer counts as opaque for depth output
    pub matte_opacity_threshold: Color,
    pub depth_filter: DepthFilter,
    pub bucket_order: BucketOrder,
    /// Exposure gain and gamma
    pub exposure: (f32, f32),
    /// Number of time sub-ranges a moving micropolygon is bounded over
    pub motion_time_ranges: u32,
    /// Filter width above which a separable filter runs in two passes
    pub separable_filter_threshold: f32,
    /// Seed for the sample pattern
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            resolution: (640, 480),
            crop_window: (0.0, 1.0, 0.0, 1.0),
            bucket_size: (16, 16),
            pixel_samples: (2, 2),
            filter: FilterKind::Gaussian,
            filter_width: (2.0, 2.0),
            shutter: (0.0, 0.0),
            depth_of_field: None,
            matte_opacity_threshold: Color::WHITE,
            depth_filter: DepthFilter::Min,
            bucket_order: BucketOrder::Horizontal,
            exposure: (1.0, 1.0),
            motion_time_ranges: 4,
            separable_filter_threshold: 3.0,
            seed: 0,
        }
    }
}

impl Options {
    /// Number of samples in each pixel
    pub fn samples_per_pixel(&self) -> usize {
        self.pixel_samples.0 as usize * self.pixel_samples.1 as usize
    }
    /// Check for configuration the hider cannot work with
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: &str| Err(HiderError::InvalidOptions(msg.to_string()));
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return bad("resolution must be non-zero");
        }
        if self.bucket_size.0 == 0 || self.bucket_size.1 == 0 {
            return bad("bucket size must be non-zero");
        }
        if self.pixel_samples.0 == 0 || self.pixel_samples.1 == 0 {
            return bad("pixel samples must be non-zero");
        }
        let (fw, fh) = self.filter_width;
        if !(fw > 0.0 && fh > 0.0) || !fw.is_finite() || !fh.is_finite() {
            return bad("filter width must be positive");
        }
        let (c0, c1, c2, c3) = self.crop_window;
        let in_unit = |v: f32| v >= 0.0 && v <= 1.0;
        if !(in_unit(c0) && in_unit(c1) && in_unit(c2) && in_unit(c3)) || c0 >= c1 || c2 >= c3 {
            return bad("crop window must be a non-empty region of [0,1]");
        }
        if !(self.shutter.0 <= self.shutter.1) {
            return bad("shutter close must not precede shutter open");
        }
        if self.motion_time_ranges == 0 {
            return bad("motion time ranges must be non-zero");
        }
        let (gain, gamma) = self.exposure;
        if !(gain >= 0.0) || !(gamma > 0.0) {
            return bad("exposure gain must be non-negative and gamma positive");
        }
        if let Some(dof) = &self.depth_of_field {
            dof.validate()?;
        }
        Ok(())
    }
}
