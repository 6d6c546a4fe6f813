//! Bucket Regions

use crate::math::Vec2;
use crate::options::Options;

/// Rectangle
///
/// Half open in both directions: `x1..x2`, `y1..y2`
#[derive(Debug,Default,Copy,Clone,PartialEq,Eq)]
pub struct Rectangle<T: std::cmp::PartialOrd + Copy> {
    /// Minimum x value
    pub x1: T,
    /// Minimum y value
    pub y1: T,
    /// Maximum x value (exclusive)
    pub x2: T,
    /// Maximum y value (exclusive)
    pub y2: T,
}

impl<T> Rectangle<T> where T: std::cmp::PartialOrd + Copy {
    /// Create a new Rectangle
    ///
    /// Values are sorted before storing
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        let (x1, x2) = if x1 > x2 { (x2,x1) } else { (x1,x2) };
        let (y1, y2) = if y1 > y2 { (y2,y1) } else { (y1,y2) };
        Self { x1,y1,x2,y2 }
    }
}

impl Rectangle<i32> {
    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }
    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
    /// Overlapping region, may be empty
    pub fn intersect(&self, o: &Rectangle<i32>) -> Rectangle<i32> {
        Rectangle { x1: self.x1.max(o.x1), y1: self.y1.max(o.y1),
                    x2: self.x2.min(o.x2), y2: self.y2.min(o.y2) }
    }
    /// Grow by `mx` and `my` pixels on each side
    pub fn expand(&self, mx: i32, my: i32) -> Rectangle<i32> {
        Rectangle { x1: self.x1 - mx, y1: self.y1 - my,
                    x2: self.x2 + mx, y2: self.y2 + my }
    }
    /// Minimum corner as floats
    pub fn min_f(&self) -> Vec2 {
        Vec2::new(self.x1 as f32, self.y1 as f32)
    }
    /// Maximum corner as floats
    pub fn max_f(&self) -> Vec2 {
        Vec2::new(self.x2 as f32, self.y2 as f32)
    }
}

/// Number of whole pixels the filter reaches beyond a pixel
///
/// A pixel centered at `x + 0.5` gathers samples within `width/2`
pub fn filter_margin(width: f32) -> i32 {
    ((width * 0.5 - 0.5).max(0.0)).ceil() as i32
}

/// Image area covered by the crop window, in pixels
pub fn crop_rectangle(opts: &Options) -> Rectangle<i32> {
    let (w, h) = (opts.resolution.0 as f32, opts.resolution.1 as f32);
    let (cx0, cx1, cy0, cy1) = opts.crop_window;
    Rectangle::new((cx0 * w).ceil() as i32, (cy0 * h).ceil() as i32,
                   (cx1 * w).ceil() as i32, (cy1 * h).ceil() as i32)
}

/// Pixel rectangles of one bucket
///
/// The `display` rectangle is what the bucket writes. The `samples`
/// rectangle is the display rectangle grown by the filter margin so edge
/// pixels have full filter support; it overlaps neighbouring buckets and is
/// clamped to the crop window.
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct BucketRegion {
    /// Bucket column and row
    pub index: (usize, usize),
    pub display: Rectangle<i32>,
    pub samples: Rectangle<i32>,
}

impl BucketRegion {
    /// Compute the regions for bucket (`bx`,`by`)
    pub fn new(opts: &Options, bx: usize, by: usize) -> Self {
        let crop = crop_rectangle(opts);
        let (bw, bh) = (opts.bucket_size.0 as i32, opts.bucket_size.1 as i32);
        let x = crop.x1 + bx as i32 * bw;
        let y = crop.y1 + by as i32 * bh;
        let display = Rectangle::new(x, y, x + bw, y + bh).intersect(&crop);
        let mx = filter_margin(opts.filter_width.0);
        let my = filter_margin(opts.filter_width.1);
        let samples = display.expand(mx, my).intersect(&crop);
        Self { index: (bx, by), display, samples }
    }
    /// True if this bucket's sample region overlaps the 2D box `[min,max]`
    pub fn overlaps(&self, min: Vec2, max: Vec2) -> bool {
        let (lo, hi) = (self.samples.min_f(), self.samples.max_f());
        min.x < hi.x && max.x >= lo.x && min.y < hi.y && max.y >= lo.y
    }
}

/// Number of buckets across and down the crop window
pub fn bucket_counts(opts: &Options) -> (usize, usize) {
    let crop = crop_rectangle(opts);
    let (bw, bh) = (opts.bucket_size.0.max(1) as i32, opts.bucket_size.1.max(1) as i32);
    let nx = (crop.width() + bw - 1) / bw;
    let ny = (crop.height() + bh - 1) / bh;
    (nx.max(0) as usize, ny.max(0) as usize)
}
