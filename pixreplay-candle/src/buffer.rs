//! Replay buffer producing batches on a compute device.
use crate::{Device, TensorTransitionBatch};
use anyhow::Result;
use candle_core::Tensor;
use log::info;
use pixreplay_core::{
    ExperienceBufferBase, ImageReplayBuffer, ImageReplayBufferConfig, PixReplayError,
    ReplayBufferBase, Transition,
};
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
    sync::Arc,
};

/// Configuration of [`DeviceReplayBuffer`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DeviceReplayBufferConfig {
    /// Configuration of the underlying host buffer.
    pub replay_buffer: ImageReplayBufferConfig,

    /// Device on which batches are placed.
    pub device: Device,
}

impl DeviceReplayBufferConfig {
    /// Sets the configuration of the host buffer.
    pub fn replay_buffer(mut self, config: ImageReplayBufferConfig) -> Self {
        self.replay_buffer = config;
        self
    }

    /// Sets the device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
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

/// An [`ImageReplayBuffer`] whose batches are tensors on a compute device.
///
/// Storage, sampling and augmentation stay on the host. [`Self::get_batch`]
/// is the only place where data is transferred to the device.
///
/// The host buffer is shared: [`Self::handle`] gives the rollout loop its
/// own reference to the same instance.
pub struct DeviceReplayBuffer<R = StdRng> {
    buffer: Arc<ImageReplayBuffer<R>>,
    device: candle_core::Device,
}

impl DeviceReplayBuffer<StdRng> {
    /// Builds the host buffer and opens the configured device.
    pub fn new(config: &DeviceReplayBufferConfig) -> Result<Self> {
        let buffer = ImageReplayBuffer::new(&config.replay_buffer)?;
        let device = config.device.open()?;
        info!("Replay buffer batches are placed on {:?}", config.device);
        Ok(Self {
            buffer: Arc::new(buffer),
            device,
        })
    }
}

impl<R: Rng> DeviceReplayBuffer<R> {
    /// Wraps an existing host buffer.
    pub fn from_buffer(buffer: Arc<ImageReplayBuffer<R>>, device: candle_core::Device) -> Self {
        Self { buffer, device }
    }

    /// Returns a handle to the host buffer, e.g. for a writer thread.
    pub fn handle(&self) -> Arc<ImageReplayBuffer<R>> {
        self.buffer.clone()
    }

    /// Device on which batches are placed.
    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }

    /// Copies a transition into the buffer.
    pub fn insert(&self, tr: &Transition<'_>) -> Result<(), PixReplayError> {
        self.buffer.insert(tr)
    }

    /// Samples a batch and moves it onto the device.
    pub fn batch(&self, batch_size: usize) -> Result<TensorTransitionBatch> {
        let batch = self.buffer.batch(batch_size)?;
        Ok(TensorTransitionBatch::from_host(batch, &self.device)?)
    }

    /// Samples a batch and returns
    /// `(obs, act, reward, next_obs, done, done_no_max)` on the device.
    pub fn get_batch(
        &self,
        batch_size: usize,
    ) -> Result<(Tensor, Tensor, Tensor, Tensor, Tensor, Tensor)> {
        Ok(self.batch(batch_size)?.unpack())
    }

    /// Number of valid rows.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl<R: Rng> ExperienceBufferBase for DeviceReplayBuffer<R> {
    fn push(&self, tr: &Transition<'_>) -> Result<()> {
        self.insert(tr)?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}

impl ReplayBufferBase for DeviceReplayBuffer<StdRng> {
    type Config = DeviceReplayBufferConfig;
    type Batch = TensorTransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        Self::new(config)
    }

    fn batch(&self, size: usize) -> Result<Self::Batch> {
        DeviceReplayBuffer::batch(self, size)
    }
}
