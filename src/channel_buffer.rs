//! Channel buffer

use std::ops::{Index, IndexMut};

use crate::context::AovSpec;
use crate::error::{HiderError, Result};

/// Channels present in every bucket, in order
pub const STANDARD_CHANNELS: [&str; 9] = ["r", "g", "b", "or", "og", "ob", "a", "z", "coverage"];

/// Named multi-channel image
///
/// Data is stored as row-major order (C-format), all channels of a pixel
/// next to each other
#[derive(Debug,Clone,Default,PartialEq)]
pub struct ChannelBuffer {
    /// Channel values of the image
    pub data: Vec<f32>,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    names: Vec<String>,
}

impl ChannelBuffer {
    /// Create a buffer of `width` x `height` with the named channels
    ///
    /// Every value starts at 0, except `z` which starts at +infinity
    pub fn new(width: usize, height: usize, names: Vec<String>) -> Self {
        let mut b = Self { data: vec![], width, height, names };
        b.resize(width, height);
        b
    }
    /// Buffer with the standard channels followed by the AOV channels
    ///
    ///     use hider::{AovSpec,ChannelBuffer};
    ///     let b = ChannelBuffer::standard(4, 2, &[AovSpec::new("N", 3)]);
    ///     assert_eq!(b.num_channels(), 12);
    ///     assert_eq!(b.channel("N.1"), Some(10));
    ///     assert_eq!(b[(3,1,b.channel("z").unwrap())], f32::INFINITY);
    ///
    pub fn standard(width: usize, height: usize, aovs: &[AovSpec]) -> Self {
        let mut names: Vec<String> = STANDARD_CHANNELS.iter().map(|s| s.to_string()).collect();
        for a in aovs {
            names.extend(a.channel_names());
        }
        Self::new(width, height, names)
    }
    /// Change the size, keeping the allocation, and reset every value
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data.resize(width * height * self.names.len(), 0.0);
        self.clear();
    }
    /// Reset every value to 0, and depth to +infinity
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
        if let Some(z) = self.channel("z") {
            let n = self.names.len();
            self.data.iter_mut().skip(z).step_by(n).for_each(|v| *v = f32::INFINITY);
        }
    }
    /// Number of values
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn num_channels(&self) -> usize {
        self.names.len()
    }
    pub fn channel_names(&self) -> &[String] {
        &self.names
    }
    /// Index of a named channel
    pub fn channel(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
    /// Index of a named channel, or an error naming it
    pub fn channel_index(&self, name: &str) -> Result<usize> {
        self.channel(name).ok_or_else(|| HiderError::UnknownChannel(name.to_string()))
    }
    /// Value of a named channel at (`x`,`y`)
    pub fn get(&self, x: usize, y: usize, name: &str) -> Result<f32> {
        let c = self.channel_index(name)?;
        Ok(self[(x, y, c)])
    }
    /// All channels of pixel (`x`,`y`)
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let n = self.names.len();
        &self[(x, y)][.. n]
    }
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [f32] {
        let n = self.names.len();
        &mut self[(x, y)][.. n]
    }
}

impl Index<(usize,usize)> for ChannelBuffer {
    type Output = [f32];
    fn index(&self, index: (usize, usize)) -> &[f32] {
        assert!(index.0 < self.width, "request {} >= {} width :: index", index.0, self.width);
        assert!(index.1 < self.height, "request {} >= {} height :: index", index.1, self.height);
        let i = ((index.1 * self.width) + index.0) * self.names.len();
        &self.data[i..]
    }
}
impl IndexMut<(usize,usize)> for ChannelBuffer {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut [f32] {
        assert!(index.0 < self.width, "request {} >= {} width :: index_mut", index.0, self.width);
        assert!(index.1 < self.height, "request {} >= {} height :: index_mut", index.1, self.height);
        let i = ((index.1 * self.width) + index.0) * self.names.len();
        &mut self.data[i..]
    }
}
impl Index<(usize,usize,usize)> for ChannelBuffer {
    type Output = f32;
    fn index(&self, index: (usize, usize, usize)) -> &f32 {
        assert!(index.2 < self.names.len(), "request channel {} >= {} :: index", index.2, self.names.len());
        &self[(index.0, index.1)][index.2]
    }
}
impl IndexMut<(usize,usize,usize)> for ChannelBuffer {
    fn index_mut(&mut self, index: (usize, usize, usize)) -> &mut f32 {
        assert!(index.2 < self.names.len(), "request channel {} >= {} :: index_mut", index.2, self.names.len());
        &mut self[(index.0, index.1)][index.2]
    }
}
