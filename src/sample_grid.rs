//! Sample Grid
//!
//! Stochastic sample points of one bucket and the visibility data each of
//! them collects. Samples are stored pixel by pixel: the `spp` samples of
//! pixel (`px`,`py`) start at `(py * width + px) * spp`.
//!
//! Within a pixel the positions follow a multi-jittered pattern: every
//! sample lies in its own sub-cell of an `xs` x `ys` grid and the pattern
//! is also stratified over the finer `spp` x `spp` grid in each axis.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::color::{over, Color};
use crate::dof::{lens_cell, lens_region_bound, square_to_disk};
use crate::error::Result;
use crate::math::Vec2;
use crate::options::DepthFilter;
use crate::sample::{SampleData, SamplePoint, VisibilityEntry, OCCLUDES, VALID};

/// Sample points and per-sample visibility of a bucket
#[derive(Debug,Clone)]
pub struct SampleGrid {
    origin: Vec2,
    width: usize,
    height: usize,
    xs: usize,
    ys: usize,
    points: Vec<SamplePoint>,
    data: Vec<SampleData>,
    rng: Pcg32,
    scratch: Vec<Vec2>,
    perm: Vec<usize>,
}

impl SampleGrid {
    /// Create an empty grid whose pattern is drawn from `seed`
    pub fn new(seed: u64) -> Self {
        Self { origin: Vec2::ZERO, width: 0, height: 0, xs: 0, ys: 0,
               points: vec![], data: vec![],
               rng: Pcg32::seed_from_u64(seed),
               scratch: vec![], perm: vec![] }
    }
    /// Restart the pattern generator from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }
    /// Size the grid for `width` x `height` pixels of `xs` x `ys` samples
    ///
    /// Returns true if the layout changed. Storage is kept, so shrinking and
    /// regrowing does not reallocate.
    pub fn allocate_samples(&mut self, width: usize, height: usize, xs: usize, ys: usize) -> bool {
        let changed = (width, height, xs, ys) != (self.width, self.height, self.xs, self.ys);
        self.width = width;
        self.height = height;
        self.xs = xs;
        self.ys = ys;
        let n = width * height * xs * ys;
        self.points.resize(n, SamplePoint::default());
        self.data.resize_with(n, SampleData::default);
        changed
    }
    /// Generate a fresh pattern and empty visibility for every sample
    ///
    /// Times are mapped into `shutter`. Positions are relative to the grid
    /// origin until [`offset_samples`] is called.
    ///
    /// [`offset_samples`]: #method.offset_samples
    pub fn initialise_samples(&mut self, shutter: (f32, f32)) {
        self.clear();
        self.jitter_samples(shutter);
    }
    /// Redraw positions, times, detail levels and lens offsets
    pub fn jitter_samples(&mut self, shutter: (f32, f32)) {
        let spp = self.samples_per_pixel();
        if spp == 0 {
            return;
        }
        for pixel in 0 .. self.width * self.height {
            self.jitter_pixel(pixel, shutter);
        }
        let origin = self.origin;
        self.offset_samples(origin);
    }
    fn jitter_pixel(&mut self, pixel: usize, shutter: (f32, f32)) {
        let (xs, ys) = (self.xs, self.ys);
        let spp = xs * ys;
        let rng = &mut self.rng;

        // Canonical multi-jitter, then shuffle x within columns and y within rows
        self.scratch.clear();
        for j in 0 .. ys {
            for i in 0 .. xs {
                let x = (i as f32 + (j as f32 + rng.random::<f32>()) / ys as f32) / xs as f32;
                let y = (j as f32 + (i as f32 + rng.random::<f32>()) / xs as f32) / ys as f32;
                self.scratch.push(Vec2::new(x, y));
            }
        }
        for i in 0 .. xs {
            for j in 0 .. ys {
                let k = rng.random_range(j .. ys);
                let (a, b) = (j * xs + i, k * xs + i);
                let t = self.scratch[a].x;
                self.scratch[a].x = self.scratch[b].x;
                self.scratch[b].x = t;
            }
        }
        for j in 0 .. ys {
            for i in 0 .. xs {
                let k = rng.random_range(i .. xs);
                let (a, b) = (j * xs + i, j * xs + k);
                let t = self.scratch[a].y;
                self.scratch[a].y = self.scratch[b].y;
                self.scratch[b].y = t;
            }
        }

        let base = pixel * spp;
        let (open, close) = shutter;
        let pts = &mut self.points[base .. base + spp];
        for (k, p) in pts.iter_mut().enumerate() {
            p.unit_position = self.scratch[k];
            p.sub_cell_index = k;
        }

        // Time: one slot of [0,1) per sample plus one offset per pixel
        self.perm.clear();
        self.perm.extend(0 .. spp);
        self.perm.shuffle(rng);
        let offset: f32 = rng.random();
        for (p, slot) in pts.iter_mut().zip(self.perm.iter()) {
            let t = (*slot as f32 + offset) / spp as f32;
            p.time = open + t * (close - open);
        }

        self.perm.shuffle(rng);
        let offset: f32 = rng.random();
        for (p, slot) in pts.iter_mut().zip(self.perm.iter()) {
            p.detail_level = (*slot as f32 + offset) / spp as f32;
        }

        // Lens: each sample takes one cell of an xs x ys grid over the lens
        self.perm.shuffle(rng);
        for (p, cell) in pts.iter_mut().zip(self.perm.iter()) {
            let (lo, hi) = lens_cell(cell % xs, cell / xs, xs, ys);
            let u = Vec2::new(lo.x + (hi.x - lo.x) * rng.random::<f32>(),
                              lo.y + (hi.y - lo.y) * rng.random::<f32>());
            p.lens_offset = square_to_disk(u);
            p.lens_offset_index = *cell;
        }
    }
    /// Place the grid's top left corner at raster position `origin`
    pub fn offset_samples(&mut self, origin: Vec2) {
        self.origin = origin;
        let spp = self.samples_per_pixel();
        if spp == 0 {
            return;
        }
        let w = self.width;
        for (i, p) in self.points.iter_mut().enumerate() {
            let pixel = i / spp;
            let (px, py) = ((pixel % w) as f32, (pixel / w) as f32);
            p.position = Vec2::new(origin.x + px + p.unit_position.x, origin.y + py + p.unit_position.y);
        }
    }
    /// Empty every visibility list and invalidate every opaque slot
    pub fn clear(&mut self) {
        for d in self.data.iter_mut() {
            d.clear();
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }
    /// Pixels across and down
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
    /// Samples across and down a pixel
    pub fn pixel_samples(&self) -> (usize, usize) {
        (self.xs, self.ys)
    }
    pub fn samples_per_pixel(&self) -> usize {
        self.xs * self.ys
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    /// Index of the first sample of pixel (`px`,`py`)
    pub fn pixel_start(&self, px: usize, py: usize) -> usize {
        (py * self.width + px) * self.samples_per_pixel()
    }
    pub fn point(&self, i: usize) -> &SamplePoint {
        &self.points[i]
    }
    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }
    pub fn data(&self, i: usize) -> &SampleData {
        &self.data[i]
    }
    /// Sample points and visibility data, borrowed together
    pub fn split_mut(&mut self) -> (&[SamplePoint], &mut [SampleData]) {
        (&self.points, &mut self.data)
    }
    /// Conservative box around every lens offset that uses lens cell `index`
    pub fn lens_region(&self, index: usize) -> (Vec2, Vec2) {
        let (lo, hi) = lens_cell(index % self.xs, index / self.xs, self.xs, self.ys);
        lens_region_bound(lo, hi)
    }

    /// Record a hit on sample `i`
    ///
    /// Returns the sample's new occlusion depth if the hit brought it nearer.
    pub fn insert_hit(&mut self, i: usize, entry: VisibilityEntry) -> Option<f32> {
        insert_entry(&mut self.data[i], entry)
    }
    /// Fold every sample's visibility list into its opaque slot
    ///
    /// Fails if a CSG tree is malformed, leaving the grid partially combined.
    pub fn combine(&mut self, depth_filter: DepthFilter, threshold: &Color) -> Result<()> {
        for d in self.data.iter_mut() {
            combine_sample(d, depth_filter, threshold)?;
        }
        Ok(())
    }
}

/// Depth ordered insertion into one sample
pub fn insert_entry(d: &mut SampleData, mut entry: VisibilityEntry) -> Option<f32> {
    let before = d.occlusion_depth();
    if entry.depth > before || entry.depth.is_nan() {
        return None;
    }
    entry.flags |= VALID;
    let depth = entry.depth;
    if entry.is_fast_opaque() {
        if d.opaque.is_valid() && d.opaque.depth == depth {
            // Adjacent grids meeting at a seam hit the same depth
            d.opaque.average_with(&entry);
            return None;
        }
        d.opaque = entry;
        let keep = d.entries.partition_point(|e| e.depth <= depth);
        d.entries.truncate(keep);
    } else {
        let pos = d.entries.partition_point(|e| e.depth <= depth);
        if pos > 0 {
            let prev = &mut d.entries[pos - 1];
            if prev.depth == depth && prev.csg.is_none() && entry.csg.is_none() {
                prev.average_with(&entry);
                return None;
            }
        }
        let occludes = entry.occludes();
        d.entries.insert(pos, entry);
        if occludes {
            d.entries.truncate(pos + 1);
        }
    }
    let after = d.occlusion_depth();
    if after < before { Some(after) } else { None }
}

/// Composite one sample front to back into its opaque slot
pub fn combine_sample(d: &mut SampleData, depth_filter: DepthFilter, threshold: &Color) -> Result<()> {
    if d.entries.is_empty() {
        return Ok(());
    }
    d.entries.sort_by(|a, b| a.depth.partial_cmp(&b.depth).unwrap_or(Ordering::Equal));
    if d.opaque.is_valid() {
        d.entries.push(d.opaque.clone());
    }
    crate::csg::resolve_all(&mut d.entries)?;

    let naov = d.entries.iter().map(|e| e.aovs.len()).max().unwrap_or(0);
    let mut color = Color::BLACK;
    let mut opacity = Color::BLACK;
    let mut aovs = vec![0.0; naov];
    for e in d.entries.iter().rev() {
        let t = e.opacity.inverse();
        if e.is_matte() {
            color = color.mul_elem(t);
            opacity = opacity.mul_elem(t);
            for a in aovs.iter_mut() {
                *a *= t.mean();
            }
        } else {
            let (c, o) = over(e.color, e.opacity, color, opacity);
            color = c;
            opacity = o;
            let os = e.opacity.mean();
            for (k, a) in aovs.iter_mut().enumerate() {
                let v = e.aovs.get(k).copied().unwrap_or(0.0);
                *a = os * v + (1.0 - os) * *a;
            }
        }
    }
    let depth = opaque_depth(&d.entries, depth_filter, threshold);
    let flags = if opacity.is_opaque() { VALID | OCCLUDES } else { VALID };
    d.opaque = VisibilityEntry { depth, color, opacity, flags, csg: None, aovs };
    d.entries.clear();
    Ok(())
}

/// Depth reported for a front to back list of layers
///
/// Layers count once the opacity accumulated through them reaches
/// `threshold` in any channel. Infinite if no layer does.
pub fn opaque_depth(entries: &[VisibilityEntry], mode: DepthFilter, threshold: &Color) -> f32 {
    let mut acc = Color::BLACK;
    let mut first = None;
    for (i, e) in entries.iter().enumerate() {
        acc = acc + e.opacity.mul_elem(acc.inverse());
        if acc.any_ge(threshold) {
            first = Some(i);
            break;
        }
    }
    let qualified = match first {
        Some(i) => &entries[i ..],
        None => return f32::INFINITY,
    };
    match mode {
        DepthFilter::Min => qualified[0].depth,
        DepthFilter::Midpoint => match qualified.get(1) {
            Some(next) => 0.5 * (qualified[0].depth + next.depth),
            None => qualified[0].depth,
        },
        DepthFilter::Max => qualified[qualified.len() - 1].depth,
        DepthFilter::Average => {
            qualified.iter().map(|e| e.depth).sum::<f32>() / qualified.len() as f32
        },
    }
}
