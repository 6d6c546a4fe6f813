//! Hider
//!
//! Top level driver. Surfaces and micropolygons are posted up front or
//! while rendering, then every bucket is processed in the configured order
//! and handed to the display.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bound::Bound;
use crate::bucket::{BucketProcessor, BucketStats};
use crate::context::{AovSpec, RenderContext};
use crate::display::Display;
use crate::error::{HiderError, Result};
use crate::imager::Imager;
use crate::options::Options;
use crate::scheduler::BucketStore;
use crate::surface::{QueuedMpg, Surface};

/// Totals over a render
#[derive(Debug,Default,Copy,Clone,PartialEq,Eq)]
pub struct RenderStats {
    /// Buckets processed, including failed ones
    pub buckets: usize,
    /// Buckets discarded after an error
    pub failed_buckets: usize,
    pub totals: BucketStats,
}

/// Visible surface determination for one image
#[derive(Debug)]
pub struct Hider {
    context: RenderContext,
    store: BucketStore,
    cancel: Arc<AtomicBool>,
}

impl Hider {
    /// Validate the options and set up the bucket queues
    pub fn new(options: Options, aovs: Vec<AovSpec>) -> Result<Self> {
        let context = RenderContext::new(options, aovs)?;
        let store = BucketStore::new(&context.options);
        Ok(Self { context, store, cancel: Arc::new(AtomicBool::new(false)) })
    }
    pub fn context(&self) -> &RenderContext {
        &self.context
    }
    /// Flag checked between buckets; set it to stop the render
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }
    /// Queue an undiced surface with its bound
    ///
    /// `bound` is the sharp screen bound, it is widened here when depth of
    /// field is on. Returns false if the surface misses the image.
    pub fn post_surface(&mut self, surface: Arc<dyn Surface>, bound: Bound) -> bool {
        let bound = self.context.surface_bound(&bound);
        self.store.post_surface(surface, bound)
    }
    /// Queue a shaded micropolygon, returns the number of buckets it touches
    pub fn add_mpg(&mut self, mpg: QueuedMpg) -> usize {
        let bound = mpg.bound(self.context.dof());
        if bound.is_malformed() {
            log::warn!("dropping micropolygon with unusable bound {:?}", bound);
            return 0;
        }
        self.store.add_mpg(Arc::new(mpg), &bound)
    }
    /// Render every bucket into `display`
    ///
    /// A bucket that fails is logged, left out of the display and counted.
    /// Cancellation is checked before each bucket.
    pub fn render<D: Display>(&mut self, display: &mut D, imager: Option<&dyn Imager>) -> Result<RenderStats> {
        let ctx = &self.context;
        let (nx, ny) = self.store.counts();
        log::info!("render {}x{} in {}x{} buckets, {}x{} samples per pixel",
                   ctx.options.resolution.0, ctx.options.resolution.1, nx, ny,
                   ctx.options.pixel_samples.0, ctx.options.pixel_samples.1);
        let mut stats = RenderStats::default();
        let mut processor = BucketProcessor::new(ctx);
        let order: Vec<usize> = self.store.order().collect();
        for index in order {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("render cancelled after {} buckets", stats.buckets);
                return Err(HiderError::Cancelled);
            }
            let region = *self.store.region(index);
            processor.pre_process(ctx, region);
            processor.process(ctx, &mut self.store, index);
            self.store.mark_processed(index);
            match processor.post_process(ctx, imager) {
                Ok(()) => display.write_bucket(&region.display, processor.buffer())?,
                Err(e) => {
                    log::error!("bucket {:?} discarded: {}", region.index, e);
                    stats.failed_buckets += 1;
                }
            }
            stats.totals.add(processor.stats());
            stats.buckets += 1;
        }
        log::info!("render done: {:?}", stats);
        Ok(stats)
    }
}
