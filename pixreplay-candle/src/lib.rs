//! Device-resident batches of the image replay buffer, built with
//! [candle](https://crates.io/crates/candle-core).
mod buffer;
mod tensor_batch;
use serde::{Deserialize, Serialize};
pub use buffer::{DeviceReplayBuffer, DeviceReplayBufferConfig};
pub use tensor_batch::TensorTransitionBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device on which batches are materialized.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// A CUDA device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Opens the corresponding candle device.
    ///
    /// Fails if the device is not available, e.g. CUDA support is not compiled in.
    pub fn open(&self) -> candle_core::Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => candle_core::Device::new_cuda(*n),
        }
    }
}

impl std::convert::TryFrom<&candle_core::Device> for Device {
    type Error = anyhow::Error;

    fn try_from(device: &candle_core::Device) -> anyhow::Result<Self> {
        match device.location() {
            candle_core::DeviceLocation::Cpu => Ok(Self::Cpu),
            candle_core::DeviceLocation::Cuda { gpu_id } => Ok(Self::Cuda(gpu_id)),
            location => Err(anyhow::anyhow!("Unsupported device: {:?}", location)),
        }
    }
}
