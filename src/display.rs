//! Displays
//!
//! Finished buckets are handed to a [`Display`]. The [`FrameBuffer`]
//! display assembles them into one image that can be written out as PNG.
//!
//! [`Display`]: trait.Display.html
//! [`FrameBuffer`]: struct.FrameBuffer.html

use std::path::Path;

use crate::channel_buffer::ChannelBuffer;
use crate::color::Rgba8;
use crate::context::AovSpec;
use crate::error::{HiderError, Result};
use crate::region::Rectangle;

/// Receiver of finished buckets
pub trait Display {
    /// Store `buffer`, which covers the raster rectangle `region`
    fn write_bucket(&mut self, region: &Rectangle<i32>, buffer: &ChannelBuffer) -> Result<()>;
}

/// Whole image assembled from buckets
#[derive(Debug,Clone)]
pub struct FrameBuffer {
    pub image: ChannelBuffer,
    /// Buckets received
    pub buckets: usize,
}

impl FrameBuffer {
    /// Create an image with the standard channels followed by the AOV channels
    pub fn new(width: usize, height: usize, aovs: &[AovSpec]) -> Self {
        Self { image: ChannelBuffer::standard(width, height, aovs), buckets: 0 }
    }
    /// Convert color and alpha to 8 bit RGBA, row-major
    pub fn to_rgba8(&self) -> Result<Vec<u8>> {
        let c: Vec<usize> = ["r", "g", "b", "a"].iter()
            .map(|n| self.image.channel_index(n))
            .collect::<Result<_>>()?;
        let mut out = Vec::with_capacity(self.image.width * self.image.height * 4);
        for y in 0 .. self.image.height {
            for x in 0 .. self.image.width {
                let px = self.image.pixel(x, y);
                let color = crate::color::Color::new(px[c[0]], px[c[1]], px[c[2]]);
                let p = Rgba8::from_color(&color, px[c[3]]);
                out.extend_from_slice(&[p.r, p.g, p.b, p.a]);
            }
        }
        Ok(out)
    }
    /// Write the image as an 8 bit RGBA PNG
    pub fn to_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let buf = self.to_rgba8()?;
        image::save_buffer(filename, &buf, self.image.width as u32, self.image.height as u32,
                           image::ExtendedColorType::Rgba8)?;
        Ok(())
    }
}

impl Display for FrameBuffer {
    fn write_bucket(&mut self, region: &Rectangle<i32>, buffer: &ChannelBuffer) -> Result<()> {
        let outside = region.x1 < 0 || region.y1 < 0
            || region.x2 as usize > self.image.width || region.y2 as usize > self.image.height
            || region.width() as usize != buffer.width || region.height() as usize != buffer.height;
        if outside {
            return Err(HiderError::DisplaySize { x: region.x1, y: region.y1,
                                                 width: region.width(), height: region.height() });
        }
        let map: Vec<(usize, usize)> = buffer.channel_names().iter().enumerate()
            .filter_map(|(i, n)| self.image.channel(n).map(|j| (i, j)))
            .collect();
        for y in 0 .. buffer.height {
            for x in 0 .. buffer.width {
                let src = buffer.pixel(x, y);
                let dst = self.image.pixel_mut(x + region.x1 as usize, y + region.y1 as usize);
                for &(i, j) in &map {
                    dst[j] = src[i];
                }
            }
        }
        self.buckets += 1;
        Ok(())
    }
}
