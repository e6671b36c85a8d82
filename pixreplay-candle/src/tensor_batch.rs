//! Transition batches moved to a candle device.
use candle_core::{error::Result, Device, Tensor};
use pixreplay_core::ImageTransitionBatch;

/// A batch of transitions as [`Tensor`]s on a compute device.
///
/// All tensors are `f32` with the batch size as their leading dimension:
///
/// * `obs`, `next_obs`: `[batch_size, C, H, W]`, values in `[0, 1]`.
/// * `act`: `[batch_size, act_shape...]`.
/// * `reward`, `done`, `done_no_max`: `[batch_size, 1]`.
///
/// [`Tensor`]: https://docs.rs/candle-core/0.8.4/candle_core/struct.Tensor.html
#[derive(Clone, Debug)]
pub struct TensorTransitionBatch {
    /// Observations.
    pub obs: Tensor,

    /// Actions.
    pub act: Tensor,

    /// Rewards.
    pub reward: Tensor,

    /// Next observations.
    pub next_obs: Tensor,

    /// Done flags.
    pub done: Tensor,

    /// Done flags excluding time-limit truncation.
    pub done_no_max: Tensor,

    /// Indices of sampled rows in the replay buffer.
    pub ix_sample: Vec<usize>,
}

impl TensorTransitionBatch {
    /// Moves a host batch onto `device`.
    pub fn from_host(batch: ImageTransitionBatch, device: &Device) -> Result<Self> {
        let batch_size = batch.len();
        let obs_dims = batch.obs_dims();
        let act_dims = batch.act_dims();
        let ix_sample = batch.ix_sample.clone();
        let (obs, act, reward, next_obs, done, done_no_max) = batch.unpack();

        Ok(Self {
            obs: Tensor::from_vec(obs, obs_dims.clone(), device)?,
            act: Tensor::from_vec(act, act_dims, device)?,
            reward: Tensor::from_vec(reward, (batch_size, 1), device)?,
            next_obs: Tensor::from_vec(next_obs, obs_dims, device)?,
            done: Tensor::from_vec(done, (batch_size, 1), device)?,
            done_no_max: Tensor::from_vec(done_no_max, (batch_size, 1), device)?,
            ix_sample,
        })
    }

    /// Number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.ix_sample.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.ix_sample.is_empty()
    }

    /// Decomposes the batch into
    /// `(obs, act, reward, next_obs, done, done_no_max)`.
    pub fn unpack(self) -> (Tensor, Tensor, Tensor, Tensor, Tensor, Tensor) {
        (
            self.obs,
            self.act,
            self.reward,
            self.next_obs,
            self.done,
            self.done_no_max,
        )
    }
}
