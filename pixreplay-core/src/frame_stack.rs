//! Stacking of consecutive frames into one observation.
use crate::ImageShape;
use anyhow::Result;
use ndarray::{concatenate, Array3, ArrayView3, Axis};
use std::collections::VecDeque;

/// Keeps the last `n_stack` frames of shape `(c, h, w)`.
///
/// The stacked observation has shape `(n_stack * c, h, w)`, the oldest frame
/// first along the channel axis.
#[derive(Debug)]
pub struct FrameStack {
    n_stack: usize,
    frame_shape: ImageShape,
    frames: VecDeque<Array3<u8>>,
}

impl FrameStack {
    /// Creates an empty stack of `n_stack` frames.
    pub fn new(n_stack: usize, frame_shape: ImageShape) -> Self {
        Self {
            n_stack,
            frame_shape,
            frames: VecDeque::with_capacity(n_stack),
        }
    }

    /// Shape of stacked observations.
    pub fn stacked_shape(&self) -> ImageShape {
        ImageShape::new(
            self.n_stack * self.frame_shape.channels,
            self.frame_shape.height,
            self.frame_shape.width,
        )
    }

    fn to_frame(&self, frame: &[u8]) -> Result<Array3<u8>> {
        let [c, h, w] = self.frame_shape.dims();
        Ok(Array3::from_shape_vec((c, h, w), frame.to_vec())?)
    }

    /// Fills every slot with the first frame of an episode.
    pub fn reset(&mut self, frame: &[u8]) -> Result<Array3<u8>> {
        let frame = self.to_frame(frame)?;
        self.frames.clear();
        for _ in 0..self.n_stack {
            self.frames.push_back(frame.clone());
        }
        self.stacked()
    }

    /// Pushes a new frame, dropping the oldest one.
    pub fn push(&mut self, frame: &[u8]) -> Result<Array3<u8>> {
        let frame = self.to_frame(frame)?;
        if self.frames.len() == self.n_stack {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.stacked()
    }

    fn stacked(&self) -> Result<Array3<u8>> {
        let views: Vec<ArrayView3<u8>> = self.frames.iter().map(|f| f.view()).collect();
        Ok(concatenate(Axis(0), &views)?)
    }
}
