//! Shapes of stored observations and actions.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of an image observation in `(C, H, W)` layout.
///
/// For stacked observations, `channels` is the number of stacked frames times
/// the number of channels per frame.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageShape {
    /// Number of channels.
    pub channels: usize,

    /// Height in pixels.
    pub height: usize,

    /// Width in pixels.
    pub width: usize,
}

impl ImageShape {
    /// Creates an image shape.
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// Number of pixels in one image, over all channels.
    pub fn len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Number of pixels in one channel.
    pub fn plane(&self) -> usize {
        self.height * self.width
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_degenerate(&self) -> bool {
        self.channels == 0 || self.height == 0 || self.width == 0
    }

    /// Returns the shape as `[C, H, W]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.channels, self.height, self.width)
    }
}

/// Number of elements of a dense array with the given shape.
pub fn num_elements(shape: &[usize]) -> usize {
    shape.iter().product()
}
