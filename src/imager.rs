//! Exposure and Imagers
//!
//! Post-processing applied to each bucket after filtering, before the
//! bucket reaches the display.

use std::fmt::Debug;

use crate::channel_buffer::ChannelBuffer;
use crate::color::Color;

/// Bucket post-process run after exposure
pub trait Imager: Debug + Send + Sync {
    /// Modify `buffer`, whose top left pixel is at raster `origin`
    fn apply(&self, buffer: &mut ChannelBuffer, origin: (i32, i32));
}

/// Composite a constant color under the image
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct BackgroundImager {
    pub color: Color,
}

impl BackgroundImager {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Imager for BackgroundImager {
    fn apply(&self, buffer: &mut ChannelBuffer, _origin: (i32, i32)) {
        let chans = ["r", "g", "b", "or", "og", "ob", "a"];
        let idx: Vec<usize> = chans.iter().filter_map(|c| buffer.channel(c)).collect();
        if idx.len() != chans.len() {
            log::warn!("background imager needs {:?}, buffer has {:?}", chans, buffer.channel_names());
            return;
        }
        let bg = [self.color.r, self.color.g, self.color.b];
        for y in 0 .. buffer.height() {
            for x in 0 .. buffer.width() {
                let px = buffer.pixel_mut(x, y);
                for k in 0 .. 3 {
                    px[idx[k]] += (1.0 - px[idx[k + 3]]) * bg[k];
                    px[idx[k + 3]] = 1.0;
                }
                px[idx[6]] = 1.0;
            }
        }
    }
}

/// Apply gain and gamma to the color channels
///
/// `v = (v * gain) ^ (1 / gamma)`, negative values clamp to zero
///
///     use hider::{expose,ChannelBuffer};
///     let mut b = ChannelBuffer::standard(1, 1, &[]);
///     b[(0,0,0)] = 0.25;
///     expose(&mut b, 1.0, 2.0);
///     assert!((b[(0,0,0)] - 0.5).abs() < 1e-6);
///
pub fn expose(buffer: &mut ChannelBuffer, gain: f32, gamma: f32) {
    if gain == 1.0 && gamma == 1.0 {
        return;
    }
    let inv = 1.0 / gamma;
    let idx: Vec<usize> = ["r", "g", "b"].iter().filter_map(|c| buffer.channel(c)).collect();
    for y in 0 .. buffer.height() {
        for x in 0 .. buffer.width() {
            let px = buffer.pixel_mut(x, y);
            for &c in &idx {
                let v = (px[c] * gain).max(0.0);
                px[c] = if inv == 1.0 { v } else { v.powf(inv) };
            }
        }
    }
}
