//! Bucket Scheduling
//!
//! Work is queued per bucket. Undiced surfaces wait in the first bucket,
//! in traversal order, that they overlap; micropolygons are queued in every
//! unprocessed bucket they overlap since each bucket samples them
//! independently.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::bound::Bound;
use crate::options::{BucketOrder, Options};
use crate::region::{bucket_counts, crop_rectangle, filter_margin, BucketRegion};
use crate::surface::{QueuedMpg, Surface};

/// Bucket (column, row) pairs in the order they are rendered
pub fn traversal_order(order: BucketOrder, nx: usize, ny: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(nx * ny);
    match order {
        BucketOrder::Horizontal => {
            for y in 0 .. ny {
                for x in 0 .. nx {
                    out.push((x, y));
                }
            }
        },
        BucketOrder::Vertical => {
            for x in 0 .. nx {
                for y in 0 .. ny {
                    out.push((x, y));
                }
            }
        },
        BucketOrder::ZigZag => {
            for y in 0 .. ny {
                if y % 2 == 0 {
                    out.extend((0 .. nx).map(|x| (x, y)));
                } else {
                    out.extend((0 .. nx).rev().map(|x| (x, y)));
                }
            }
        },
        BucketOrder::Circle => {
            out = traversal_order(BucketOrder::Horizontal, nx, ny, seed);
            let (cx, cy) = (nx as f32 * 0.5, ny as f32 * 0.5);
            let d = |b: &(usize, usize)| {
                let dx = b.0 as f32 + 0.5 - cx;
                let dy = b.1 as f32 + 0.5 - cy;
                dx * dx + dy * dy
            };
            out.sort_by(|a, b| d(a).partial_cmp(&d(b)).unwrap_or(std::cmp::Ordering::Equal));
        },
        BucketOrder::Random => {
            out = traversal_order(BucketOrder::Horizontal, nx, ny, seed);
            out.shuffle(&mut Pcg32::seed_from_u64(seed));
        },
    }
    out
}

/// An undiced surface with its cached bound
pub type QueuedSurface = (Arc<dyn Surface>, Bound);

/// Per bucket work queues
#[derive(Debug)]
pub struct BucketStore {
    nx: usize,
    ny: usize,
    order: Vec<(usize, usize)>,
    rank: Vec<usize>,
    processed: Vec<bool>,
    regions: Vec<BucketRegion>,
    surfaces: Vec<Vec<QueuedSurface>>,
    mpgs: Vec<Vec<Arc<QueuedMpg>>>,
    /// Crop origin, bucket size and filter margin, for locating buckets
    origin: (f32, f32),
    size: (f32, f32),
    margin: (f32, f32),
}

impl BucketStore {
    pub fn new(opts: &Options) -> Self {
        let (nx, ny) = bucket_counts(opts);
        let order = traversal_order(opts.bucket_order, nx, ny, opts.seed);
        let mut rank = vec![0; nx * ny];
        for (r, (x, y)) in order.iter().enumerate() {
            rank[y * nx + x] = r;
        }
        let mut regions = Vec::with_capacity(nx * ny);
        for y in 0 .. ny {
            for x in 0 .. nx {
                regions.push(BucketRegion::new(opts, x, y));
            }
        }
        let crop = crop_rectangle(opts);
        Self { nx, ny, order, rank,
               processed: vec![false; nx * ny],
               regions,
               surfaces: (0 .. nx * ny).map(|_| vec![]).collect(),
               mpgs: (0 .. nx * ny).map(|_| vec![]).collect(),
               origin: (crop.x1 as f32, crop.y1 as f32),
               size: (opts.bucket_size.0 as f32, opts.bucket_size.1 as f32),
               margin: (filter_margin(opts.filter_width.0) as f32,
                        filter_margin(opts.filter_width.1) as f32) }
    }
    /// Buckets across and down
    pub fn counts(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }
    pub fn len(&self) -> usize {
        self.regions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
    /// Linear bucket indices in traversal order
    pub fn order(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().map(move |(x, y)| y * self.nx + x)
    }
    pub fn region(&self, index: usize) -> &BucketRegion {
        &self.regions[index]
    }
    /// Unprocessed buckets whose sample regions overlap `bound`
    pub fn overlapping(&self, bound: &Bound) -> Vec<usize> {
        if bound.is_malformed() || self.regions.is_empty() {
            return vec![];
        }
        let span = |lo: f32, hi: f32, o: f32, s: f32, m: f32, n: usize| {
            let a = ((lo - o - m) / s).floor().max(0.0);
            let b = ((hi - o + m) / s).floor().min(n as f32 - 1.0);
            if b < a { None } else { Some((a as usize, b as usize)) }
        };
        let xs = span(bound.min.x, bound.max.x, self.origin.0, self.size.0, self.margin.0, self.nx);
        let ys = span(bound.min.y, bound.max.y, self.origin.1, self.size.1, self.margin.1, self.ny);
        let (xs, ys) = match (xs, ys) {
            (Some(xs), Some(ys)) => (xs, ys),
            _ => return vec![],
        };
        let mut out = vec![];
        for y in ys.0 ..= ys.1 {
            for x in xs.0 ..= xs.1 {
                let i = y * self.nx + x;
                if !self.processed[i] && self.regions[i].overlaps(bound.min.xy(), bound.max.xy()) {
                    out.push(i);
                }
            }
        }
        out
    }
    /// Earliest unprocessed overlapping bucket other than `skip`
    fn first_overlapping(&self, bound: &Bound, skip: Option<usize>) -> Option<usize> {
        self.overlapping(bound).into_iter()
            .filter(|&i| Some(i) != skip)
            .min_by_key(|&i| self.rank[i])
    }
    /// Queue an undiced surface, returns false if it misses every remaining bucket
    pub fn post_surface(&mut self, surface: Arc<dyn Surface>, bound: Bound) -> bool {
        match self.first_overlapping(&bound, None) {
            Some(i) => {
                self.surfaces[i].push((surface, bound));
                true
            },
            None => {
                log::trace!("surface {:?} outside remaining buckets, dropped", bound);
                false
            }
        }
    }
    /// Move a surface hidden in bucket `from` to the next bucket it overlaps
    ///
    /// Returns false if no later bucket overlaps it and it was dropped.
    pub fn defer_surface(&mut self, from: usize, surface: Arc<dyn Surface>, bound: Bound) -> bool {
        match self.first_overlapping(&bound, Some(from)) {
            Some(i) => {
                log::trace!("surface deferred from bucket {} to {}", from, i);
                self.surfaces[i].push((surface, bound));
                true
            },
            None => {
                log::trace!("surface hidden in bucket {}, no later bucket, dropped", from);
                false
            }
        }
    }
    /// Queue a micropolygon in every unprocessed bucket its `bound` overlaps
    ///
    /// Returns the number of buckets it was queued in.
    pub fn add_mpg(&mut self, mpg: Arc<QueuedMpg>, bound: &Bound) -> usize {
        let buckets = self.overlapping(bound);
        for &i in &buckets {
            self.mpgs[i].push(mpg.clone());
        }
        buckets.len()
    }
    pub fn pop_surface(&mut self, index: usize) -> Option<QueuedSurface> {
        self.surfaces[index].pop()
    }
    pub fn take_mpgs(&mut self, index: usize) -> Vec<Arc<QueuedMpg>> {
        std::mem::take(&mut self.mpgs[index])
    }
    /// True if the bucket has nothing queued
    pub fn is_idle(&self, index: usize) -> bool {
        self.surfaces[index].is_empty() && self.mpgs[index].is_empty()
    }
    /// Mark a bucket done, dropping anything still queued in it
    pub fn mark_processed(&mut self, index: usize) {
        self.processed[index] = true;
        self.surfaces[index].clear();
        self.mpgs[index].clear();
    }
}
