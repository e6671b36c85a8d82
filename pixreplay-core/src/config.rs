//! Configuration of [`ImageReplayBuffer`](crate::ImageReplayBuffer).
use crate::{shape::num_elements, ImageShape, PixReplayError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ImageReplayBuffer`](crate::ImageReplayBuffer).
///
/// Shapes, capacity and padding are fixed once the buffer is built.
///
/// ```rust
/// use pixreplay_core::{ImageReplayBufferConfig, ImageShape};
///
/// let config = ImageReplayBufferConfig::default()
///     .obs_shape(ImageShape::new(9, 84, 84))
///     .act_shape(vec![4])
///     .capacity(100_000)
///     .pad(4)
///     .seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ImageReplayBufferConfig {
    /// Shape of observations and next observations.
    pub obs_shape: ImageShape,

    /// Shape of actions. Actions are stored flattened.
    pub act_shape: Vec<usize>,

    /// Maximum number of transitions held in the buffer.
    /// When the buffer is full, new transitions replace the oldest ones.
    pub capacity: usize,

    /// Number of pixels added on each border before random cropping.
    /// Zero disables augmentation.
    pub pad: usize,

    /// Seed of the random source used for sampling and augmentation.
    pub seed: u64,

    /// Inclusive range `[low, high]` every action element must lie in.
    /// No check is done if `None`.
    #[serde(default)]
    pub action_range: Option<[f32; 2]>,
}

impl Default for ImageReplayBufferConfig {
    /// Default values follow the usual settings of pixel-based control with
    /// three stacked RGB frames of 84x84 pixels.
    fn default() -> Self {
        Self {
            obs_shape: ImageShape::new(9, 84, 84),
            act_shape: vec![1],
            capacity: 100_000,
            pad: 4,
            seed: 42,
            action_range: None,
        }
    }
}

impl ImageReplayBufferConfig {
    /// Sets the shape of observations.
    pub fn obs_shape(mut self, obs_shape: ImageShape) -> Self {
        self.obs_shape = obs_shape;
        self
    }

    /// Sets the shape of actions.
    pub fn act_shape(mut self, act_shape: Vec<usize>) -> Self {
        self.act_shape = act_shape;
        self
    }

    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the padding of the random shift augmentation.
    pub fn pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the range of action values.
    pub fn action_range(mut self, action_range: Option<[f32; 2]>) -> Self {
        self.action_range = action_range;
        self
    }

    /// Number of elements of a flattened action.
    pub fn act_len(&self) -> usize {
        num_elements(&self.act_shape)
    }

    /// Total bytes of preallocated storage, or `None` if the size overflows `usize`.
    pub fn storage_bytes(&self) -> Option<usize> {
        let [c, h, w] = self.obs_shape.dims();
        let obs_len = c.checked_mul(h)?.checked_mul(w)?;
        let act_len = self
            .act_shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
        let row_bytes = obs_len
            .checked_mul(2)?
            .checked_add(act_len.checked_add(1)?.checked_mul(std::mem::size_of::<f32>())?)?
            .checked_add(2 * std::mem::size_of::<i8>())?;
        self.capacity.checked_mul(row_bytes)
    }

    /// Checks that the configuration describes a buildable buffer.
    pub fn validate(&self) -> Result<(), PixReplayError> {
        if self.capacity == 0 {
            return Err(PixReplayError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        if self.obs_shape.is_degenerate() {
            return Err(PixReplayError::InvalidConfig(format!(
                "observation shape {} has a zero dimension",
                self.obs_shape
            )));
        }
        if self.act_shape.is_empty() || self.act_shape.iter().any(|&d| d == 0) {
            return Err(PixReplayError::InvalidConfig(format!(
                "action shape {:?} has a zero dimension",
                self.act_shape
            )));
        }
        if self.storage_bytes().is_none() {
            return Err(PixReplayError::InvalidConfig(format!(
                "storage for capacity {} overflows the address space",
                self.capacity
            )));
        }
        if let Some([low, high]) = self.action_range {
            if !low.is_finite() || !high.is_finite() || low > high {
                return Err(PixReplayError::InvalidConfig(format!(
                    "action range [{}, {}] is not a finite interval",
                    low, high
                )));
            }
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
