//! How does this work
//!    hider = Hider::new(options, aovs)
//!    hider.post_surface(surface, bound)   -- queued in the first bucket it overlaps
//!    hider.add_mpg(micropolygon)          -- queued in every bucket it overlaps
//!  Render
//!   render(display, imager)
//!     for each bucket, in bucket order
//!       pre_process
//!         allocate_samples / initialise_samples / offset_samples
//!         construct_tree                  -- or jitter + update_bounds on reuse
//!       process
//!         dice surfaces                   -- 'deferred' when can_cull(bound)
//!         sample_mpg                      -- per time range / lens cell sub-bound
//!           can_cull(sub bound)
//!           tree.sample_mpg()
//!             micropolygon.sample()       -- edge tests, plane depth
//!             insert_entry()              -- opaque slot or depth sorted list
//!             set_max_opaque_z()          -- propagate towards the root
//!       post_process
//!         combine()                       -- csg, over, matte, opaque depth
//!         filter                          -- direct or separable two pass
//!         expose, imager
//!       display.write_bucket()

pub mod math;
pub mod color;
pub mod bound;
pub mod region;
pub mod error;
pub mod options;
pub mod filter;
pub mod dof;
pub mod context;
pub mod csg;
pub mod sample;
pub mod sample_grid;
pub mod occlusion;
pub mod micropolygon;
pub mod motion;
pub mod surface;
pub mod channel_buffer;
pub mod imager;
pub mod scheduler;
pub mod bucket;
pub mod display;
pub mod hider;

pub use math::*;
pub use color::*;
pub use bound::*;
pub use region::*;
pub use error::*;
pub use options::*;
pub use filter::*;
pub use dof::*;
pub use context::*;
pub use csg::*;
pub use sample::*;
pub use sample_grid::*;
pub use occlusion::*;
pub use micropolygon::*;
pub use motion::*;
pub use surface::*;
pub use channel_buffer::*;
pub use imager::*;
pub use scheduler::*;
pub use bucket::*;
pub use display::*;
pub use hider::*;
