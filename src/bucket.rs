//! Bucket Processing
//!
//! One bucket goes through three stages:
//!
//!   - `pre_process`: lay out the sample grid over the bucket's sample
//!     region and build or refresh the occlusion tree
//!   - `process`: dice queued surfaces and sample queued micropolygons
//!   - `post_process`: combine visibility lists, filter into the display
//!     region, expose and run the imager
//!
//! The sample region is the display region grown by the filter margin, so
//! neighbouring buckets sample the pixels along their shared edges twice.

use std::sync::Arc;

use crate::bound::Bound;
use crate::channel_buffer::ChannelBuffer;
use crate::context::RenderContext;
use crate::dof::DepthOfField;
use crate::error::Result;
use crate::imager::{expose, Imager};
use crate::occlusion::{OcclusionTree, TreeQuery};
use crate::region::BucketRegion;
use crate::sample_grid::{insert_entry, SampleGrid};
use crate::scheduler::BucketStore;
use crate::surface::{Dice, Geometry, QueuedMpg};

/// Color, opacity then AOVs
const COLOR_VALUES: usize = 6;

/// Counters for one bucket
#[derive(Debug,Default,Copy,Clone,PartialEq,Eq)]
pub struct BucketStats {
    /// Micropolygons hit tested against samples
    pub mpgs_sampled: usize,
    /// Micropolygons culled whole by the occlusion tree
    pub mpgs_culled: usize,
    /// Time or lens sub-bounds culled
    pub sub_bounds_culled: usize,
    /// Micropolygons skipped for unusable bounds
    pub mpgs_degenerate: usize,
    pub surfaces_diced: usize,
    pub surfaces_split: usize,
    /// Surfaces hidden here and passed on to a later bucket
    pub surfaces_deferred: usize,
    /// Sample hit tests
    pub sample_tests: usize,
    pub hits: usize,
}

impl BucketStats {
    pub fn add(&mut self, o: &BucketStats) {
        self.mpgs_sampled += o.mpgs_sampled;
        self.mpgs_culled += o.mpgs_culled;
        self.sub_bounds_culled += o.sub_bounds_culled;
        self.mpgs_degenerate += o.mpgs_degenerate;
        self.surfaces_diced += o.surfaces_diced;
        self.surfaces_split += o.surfaces_split;
        self.surfaces_deferred += o.surfaces_deferred;
        self.sample_tests += o.sample_tests;
        self.hits += o.hits;
    }
}

/// Per-bucket sampling and reconstruction
///
/// Storage is kept from one bucket to the next. When the next bucket's
/// sample region has the same size, the sample pattern is re-jittered and
/// the occlusion tree keeps its topology.
#[derive(Debug)]
pub struct BucketProcessor {
    region: BucketRegion,
    grid: SampleGrid,
    tree: OcclusionTree,
    buffer: ChannelBuffer,
    stats: BucketStats,
    has_tree: bool,
    scratch: Vec<f32>,
}

impl BucketProcessor {
    pub fn new(ctx: &RenderContext) -> Self {
        Self { region: BucketRegion::default(),
               grid: SampleGrid::new(ctx.options.seed),
               tree: OcclusionTree::new(),
               buffer: ChannelBuffer::standard(0, 0, &ctx.aovs),
               stats: BucketStats::default(),
               has_tree: false,
               scratch: vec![] }
    }
    pub fn region(&self) -> &BucketRegion {
        &self.region
    }
    pub fn stats(&self) -> &BucketStats {
        &self.stats
    }
    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }
    pub fn tree(&self) -> &OcclusionTree {
        &self.tree
    }
    /// Filtered output of the last bucket
    pub fn buffer(&self) -> &ChannelBuffer {
        &self.buffer
    }
    /// True if the tree shows everything in `bound` is hidden in this bucket
    pub fn can_cull(&self, bound: &Bound) -> bool {
        self.tree.can_cull(bound)
    }

    /// Prepare the samples, tree and output for `region`
    pub fn pre_process(&mut self, ctx: &RenderContext, region: BucketRegion) {
        self.region = region;
        self.stats = BucketStats::default();
        let (w, h) = (region.samples.width() as usize, region.samples.height() as usize);
        let (xs, ys) = ctx.pixel_samples();
        let shutter = ctx.options.shutter;
        let changed = self.grid.allocate_samples(w, h, xs, ys);
        // Per bucket stream, so the pattern does not depend on bucket order
        let (bx, by) = (region.index.0 as u64, region.index.1 as u64);
        self.grid.reseed(ctx.options.seed ^ (by << 32 | bx).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        if changed || !self.has_tree {
            self.grid.initialise_samples(shutter);
            self.grid.offset_samples(region.samples.min_f());
            self.tree.construct_tree(self.grid.points());
            self.has_tree = true;
        } else {
            self.grid.clear();
            self.grid.jitter_samples(shutter);
            self.grid.offset_samples(region.samples.min_f());
            self.tree.update_bounds(self.grid.points());
        }
        self.buffer.resize(region.display.width() as usize, region.display.height() as usize);
        log::debug!("bucket {:?}: display {:?} samples {:?}", region.index, region.display, region.samples);
    }

    /// Drain the work queued for bucket `index`
    ///
    /// Queued micropolygons are sampled before the next surface is taken,
    /// so the tree is as deep as it can be when a surface is checked.
    /// Surfaces already hidden here are deferred, the rest are diced or
    /// split. New micropolygons are queued in every bucket they touch, this
    /// one included.
    pub fn process(&mut self, ctx: &RenderContext, store: &mut BucketStore, index: usize) {
        loop {
            for m in store.take_mpgs(index) {
                self.sample_mpg(ctx, &m);
            }
            let (surface, bound) = match store.pop_surface(index) {
                Some(s) => s,
                None => break,
            };
            if self.tree.can_cull(&bound) {
                self.stats.surfaces_deferred += 1;
                store.defer_surface(index, surface, bound);
                continue;
            }
            match surface.dice(ctx) {
                Dice::Split(children) => {
                    log::trace!("split surface {:?} into {}", bound, children.len());
                    self.stats.surfaces_split += 1;
                    for (s, b) in children {
                        store.post_surface(s, ctx.surface_bound(&b));
                    }
                },
                Dice::Grid(mpgs) => {
                    log::trace!("diced surface {:?} into {} micropolygons", bound, mpgs.len());
                    self.stats.surfaces_diced += 1;
                    for m in mpgs {
                        let b = m.bound(ctx.dof());
                        store.add_mpg(Arc::new(m), &b);
                    }
                },
            }
        }
    }

    /// Hit test one micropolygon against the samples it may reach
    pub fn sample_mpg(&mut self, ctx: &RenderContext, mpg: &QueuedMpg) {
        let dof = ctx.dof();
        let bound = mpg.bound(dof);
        if bound.is_malformed() {
            log::warn!("skipping micropolygon with unusable bound {:?}", bound);
            self.stats.mpgs_degenerate += 1;
            return;
        }
        if !self.region.overlaps(bound.min.xy(), bound.max.xy()) {
            return;
        }
        if self.tree.can_cull(&bound) {
            self.stats.mpgs_culled += 1;
            return;
        }
        self.stats.mpgs_sampled += 1;
        let (d0, d1) = mpg.info.detail_range.unwrap_or((f32::NEG_INFINITY, f32::INFINITY));
        let base = TreeQuery::new(bound).with_detail(d0, d1);
        let lenses = self.grid.samples_per_pixel();

        match (&mpg.geometry, dof) {
            (Geometry::Static(_), None) => self.query(mpg, None, &base),
            (Geometry::Static(mp), Some(d)) => {
                for i in 0 .. lenses {
                    let (lo, hi) = self.grid.lens_region(i);
                    let q = TreeQuery { bound: mp.lens_sub_bound(d, lo, hi), ..base }.with_lens(i);
                    self.query(mpg, dof, &q);
                }
            },
            (Geometry::Moving(mp), None) => {
                for r in mp.time_ranges() {
                    let q = TreeQuery { bound: r.bound, ..base }.with_time(r.t0, r.t1);
                    self.query(mpg, None, &q);
                }
            },
            (Geometry::Moving(mp), Some(d)) => {
                for r in mp.time_ranges() {
                    for i in 0 .. lenses {
                        let (lo, hi) = self.grid.lens_region(i);
                        let q = TreeQuery { bound: d.dilate(&r.bound, lo, hi), ..base }
                            .with_time(r.t0, r.t1)
                            .with_lens(i);
                        self.query(mpg, dof, &q);
                    }
                }
            },
        }
    }

    fn query(&mut self, mpg: &QueuedMpg, dof: Option<&DepthOfField>, q: &TreeQuery) {
        if q.bound.is_malformed() {
            log::warn!("skipping sub-bound {:?}", q.bound);
            self.stats.mpgs_degenerate += 1;
            return;
        }
        if self.tree.can_cull(&q.bound) {
            self.stats.sub_bounds_culled += 1;
            return;
        }
        let (points, data) = self.grid.split_mut();
        let stats = &mut self.stats;
        self.tree.sample_mpg(q, &mut |i| {
            stats.sample_tests += 1;
            let entry = mpg.sample(&points[i], dof)?;
            stats.hits += 1;
            insert_entry(&mut data[i], entry)
        });
    }

    /// Combine, filter, expose and apply the imager
    ///
    /// A bucket nothing hit skips straight to the imager. On error the
    /// output buffer holds no usable data.
    pub fn post_process(&mut self, ctx: &RenderContext, imager: Option<&dyn Imager>) -> Result<()> {
        let opts = &ctx.options;
        if self.stats.hits > 0 {
            self.grid.combine(opts.depth_filter, &opts.matte_opacity_threshold)?;
            if ctx.filter.separable {
                self.filter_separable(ctx);
            } else {
                self.filter_direct(ctx);
            }
            expose(&mut self.buffer, opts.exposure.0, opts.exposure.1);
        }
        if let Some(imager) = imager {
            imager.apply(&mut self.buffer, (self.region.display.x1, self.region.display.y1));
        }
        log::debug!("bucket {:?}: {:?}", self.region.index, self.stats);
        Ok(())
    }

    /// Offset from display pixels to sample grid pixels
    fn display_offset(&self) -> (i32, i32) {
        (self.region.display.x1 - self.region.samples.x1,
         self.region.display.y1 - self.region.samples.y1)
    }

    /// Valid count, in-support count and nearest depth around display pixel (`x`,`y`)
    fn coverage_depth(&self, ctx: &RenderContext, x: usize, y: usize) -> (usize, usize, f32) {
        let f = &ctx.filter;
        let (gw, gh) = self.grid.size();
        let (ox, oy) = self.display_offset();
        let spp = self.grid.samples_per_pixel();
        let (mut valid, mut total, mut depth) = (0, 0, f32::INFINITY);
        for dy in -f.margin.1 ..= f.margin.1 {
            let py = y as i32 + oy + dy;
            if py < 0 || py >= gh as i32 {
                continue;
            }
            for dx in -f.margin.0 ..= f.margin.0 {
                let px = x as i32 + ox + dx;
                if px < 0 || px >= gw as i32 {
                    continue;
                }
                let start = self.grid.pixel_start(px as usize, py as usize);
                for i in start .. start + spp {
                    if !f.in_support(dx, dy, self.grid.point(i).sub_cell_index) {
                        continue;
                    }
                    total += 1;
                    let s = &self.grid.data(i).opaque;
                    if s.is_valid() {
                        valid += 1;
                        depth = depth.min(s.depth);
                    }
                }
            }
        }
        (valid, total, depth)
    }

    /// Filter every display pixel straight from the weight table
    fn filter_direct(&mut self, ctx: &RenderContext) {
        let f = &ctx.filter;
        let naov = ctx.aov_floats();
        let (gw, gh) = self.grid.size();
        let (ox, oy) = self.display_offset();
        let spp = self.grid.samples_per_pixel();
        let mut acc = vec![0.0f32; COLOR_VALUES + naov];
        for y in 0 .. self.buffer.height() {
            for x in 0 .. self.buffer.width() {
                acc.iter_mut().for_each(|v| *v = 0.0);
                let mut wsum = 0.0;
                for dy in -f.margin.1 ..= f.margin.1 {
                    let py = y as i32 + oy + dy;
                    if py < 0 || py >= gh as i32 {
                        continue;
                    }
                    for dx in -f.margin.0 ..= f.margin.0 {
                        let px = x as i32 + ox + dx;
                        if px < 0 || px >= gw as i32 {
                            continue;
                        }
                        let start = self.grid.pixel_start(px as usize, py as usize);
                        for i in start .. start + spp {
                            let sub = self.grid.point(i).sub_cell_index;
                            if !f.in_support(dx, dy, sub) {
                                continue;
                            }
                            let w = f.weight(dx, dy, sub);
                            wsum += w;
                            let s = &self.grid.data(i).opaque;
                            if s.is_valid() {
                                accumulate(&mut acc, w, s);
                            }
                        }
                    }
                }
                let (valid, total, depth) = self.coverage_depth(ctx, x, y);
                write_pixel(&mut self.buffer, x, y, &acc, wsum, valid, total, depth);
            }
        }
    }

    /// Filter in two passes, along x into rows of sub-cells then along y
    ///
    /// Gives the same sums as [`filter_direct`] for separable kernels.
    ///
    /// [`filter_direct`]: #method.filter_direct
    fn filter_separable(&mut self, ctx: &RenderContext) {
        let f = &ctx.filter;
        let naov = ctx.aov_floats();
        let nvals = COLOR_VALUES + naov + 1;
        let (gw, gh) = self.grid.size();
        let (ox, oy) = self.display_offset();
        let (xs, ys) = self.grid.pixel_samples();
        let spp = xs * ys;
        let (dw, dh) = (self.buffer.width(), self.buffer.height());

        // Pass 1: per display column, grid row and sub-cell row
        let mut rows = std::mem::take(&mut self.scratch);
        rows.clear();
        rows.resize(dw * gh * ys * nvals, 0.0);
        for gy in 0 .. gh {
            for x in 0 .. dw {
                for dx in -f.margin.0 ..= f.margin.0 {
                    let px = x as i32 + ox + dx;
                    if px < 0 || px >= gw as i32 {
                        continue;
                    }
                    let start = self.grid.pixel_start(px as usize, gy);
                    for i in start .. start + spp {
                        let sub = self.grid.point(i).sub_cell_index;
                        let (sx, sy) = (sub % xs, sub / xs);
                        if !f.in_support_x(dx, sx) {
                            continue;
                        }
                        let w = f.weight_x(dx, sx);
                        let at = ((x * gh + gy) * ys + sy) * nvals;
                        let row = &mut rows[at .. at + nvals];
                        row[nvals - 1] += w;
                        let s = &self.grid.data(i).opaque;
                        if s.is_valid() {
                            accumulate(&mut row[.. nvals - 1], w, s);
                        }
                    }
                }
            }
        }

        // Pass 2: gather rows along y
        let mut acc = vec![0.0f32; nvals];
        for y in 0 .. dh {
            for x in 0 .. dw {
                acc.iter_mut().for_each(|v| *v = 0.0);
                for dy in -f.margin.1 ..= f.margin.1 {
                    let py = y as i32 + oy + dy;
                    if py < 0 || py >= gh as i32 {
                        continue;
                    }
                    for sy in 0 .. ys {
                        if !f.in_support_y(dy, sy) {
                            continue;
                        }
                        let w = f.weight_y(dy, sy);
                        let at = ((x * gh + py as usize) * ys + sy) * nvals;
                        for (a, r) in acc.iter_mut().zip(&rows[at .. at + nvals]) {
                            *a += w * r;
                        }
                    }
                }
                let (valid, total, depth) = self.coverage_depth(ctx, x, y);
                let wsum = acc[nvals - 1];
                write_pixel(&mut self.buffer, x, y, &acc[.. nvals - 1], wsum, valid, total, depth);
            }
        }
        self.scratch = rows;
    }
}

/// Add `w` times the sample's color, opacity and AOVs
fn accumulate(acc: &mut [f32], w: f32, s: &crate::sample::VisibilityEntry) {
    for k in 0 .. 3 {
        acc[k] += w * s.color.get(k);
        acc[3 + k] += w * s.opacity.get(k);
    }
    for (a, v) in acc[COLOR_VALUES ..].iter_mut().zip(&s.aovs) {
        *a += w * v;
    }
}

/// Normalize and store one filtered pixel
#[allow(clippy::too_many_arguments)]
fn write_pixel(buffer: &mut ChannelBuffer, x: usize, y: usize, acc: &[f32], wsum: f32,
               valid: usize, total: usize, depth: f32) {
    let px = buffer.pixel_mut(x, y);
    px.iter_mut().for_each(|v| *v = 0.0);
    px[7] = f32::INFINITY;
    if valid == 0 {
        return;
    }
    let inv = if wsum != 0.0 { 1.0 / wsum } else { 0.0 };
    for k in 0 .. COLOR_VALUES {
        px[k] = acc[k] * inv;
    }
    px[6] = (px[3] + px[4] + px[5]) / 3.0;
    px[7] = depth;
    px[8] = (valid as f32 / total as f32).min(1.0);
    for (k, v) in acc[COLOR_VALUES ..].iter().enumerate() {
        px[9 + k] = v * inv;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::filter::FilterKind;
    use crate::options::Options;
    use crate::sample::{VisibilityEntry, OCCLUDES};

    fn context(kind: FilterKind, width: f32, threshold: f32) -> RenderContext {
        let mut o = Options::default();
        o.resolution = (12, 10);
        o.bucket_size = (6, 5);
        o.pixel_samples = (3, 2);
        o.filter = kind;
        o.filter_width = (width, width);
        o.separable_filter_threshold = threshold;
        RenderContext::new(o, vec![]).unwrap()
    }

    /// Fill a bucket with a deterministic pattern of hits, some samples empty
    fn filled(ctx: &RenderContext) -> BucketProcessor {
        let mut b = BucketProcessor::new(ctx);
        b.pre_process(ctx, BucketRegion::new(&ctx.options, 1, 1));
        for i in 0 .. b.grid.len() {
            if i % 7 == 3 {
                continue;
            }
            let v = (i % 11) as f32 / 10.0;
            let e = VisibilityEntry { depth: 1.0 + v, color: Color::new(v, 1.0 - v, 0.5),
                                      opacity: Color::WHITE, flags: OCCLUDES, ..Default::default() };
            b.grid.insert_hit(i, e);
        }
        b.stats.hits = 1;
        b
    }

    #[test]
    fn separable_matches_direct() {
        let ctx = context(FilterKind::Gaussian, 4.0, 3.0);
        assert!(ctx.filter.separable);
        let mut a = filled(&ctx);
        a.grid.combine(ctx.options.depth_filter, &ctx.options.matte_opacity_threshold).unwrap();
        let mut b = filled(&ctx);
        b.grid.combine(ctx.options.depth_filter, &ctx.options.matte_opacity_threshold).unwrap();
        a.filter_direct(&ctx);
        b.filter_separable(&ctx);
        assert_eq!(a.buffer.len(), b.buffer.len());
        for (x, y) in a.buffer.data.iter().zip(b.buffer.data.iter()) {
            if x.is_infinite() {
                assert_eq!(x, y);
            } else {
                assert!((x - y).abs() < 1e-4, "{} {}", x, y);
            }
        }
    }

    #[test]
    fn empty_bucket_is_transparent() {
        let ctx = context(FilterKind::Box, 1.0, 3.0);
        let mut b = BucketProcessor::new(&ctx);
        b.pre_process(&ctx, BucketRegion::new(&ctx.options, 0, 0));
        b.post_process(&ctx, None).unwrap();
        let buf = b.buffer();
        assert_eq!((buf.width(), buf.height()), (6, 5));
        for y in 0 .. 5 {
            for x in 0 .. 6 {
                assert_eq!(buf.get(x, y, "coverage").unwrap(), 0.0);
                assert_eq!(buf.get(x, y, "a").unwrap(), 0.0);
                assert_eq!(buf.get(x, y, "z").unwrap(), f32::INFINITY);
            }
        }
    }

    #[test]
    fn reuse_keeps_tree_topology() {
        let ctx = context(FilterKind::Box, 1.0, 3.0);
        let mut b = BucketProcessor::new(&ctx);
        b.pre_process(&ctx, BucketRegion::new(&ctx.options, 0, 0));
        let nodes = b.tree().nodes().len();
        b.pre_process(&ctx, BucketRegion::new(&ctx.options, 1, 0));
        assert_eq!(b.tree().nodes().len(), nodes);
        let o = b.grid().origin();
        assert_eq!((o.x, o.y), (6.0, 0.0));
        for p in b.grid().points() {
            assert!(p.position.x >= 6.0 && p.position.x <= 12.0);
        }
    }
}
