//! Host-side batches of augmented transitions.
use crate::{CropOffset, ImageShape};

/// Scale dividing raw `u8` pixels when a batch is assembled.
///
/// Storage keeps raw pixels; batch images lie in `[0, 1]`.
pub const PIXEL_SCALE: f32 = 255.0;

/// A batch of transitions in the numeric layout consumed by learners.
///
/// Every buffer is owned by the batch; nothing aliases the replay buffer.
///
/// * `obs`, `next_obs`: `[batch_size, C, H, W]`, augmented, divided by
///   [`PIXEL_SCALE`].
/// * `act`: `[batch_size, act_shape...]`.
/// * `reward`, `done`, `done_no_max`: `[batch_size, 1]`, flags as `0.0`/`1.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageTransitionBatch {
    /// Shape of a single observation.
    pub obs_shape: ImageShape,

    /// Shape of a single action.
    pub act_shape: Vec<usize>,

    /// Observations.
    pub obs: Vec<f32>,

    /// Actions.
    pub act: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<f32>,

    /// Done flags.
    pub done: Vec<f32>,

    /// Done flags excluding time-limit truncation.
    pub done_no_max: Vec<f32>,

    /// Indices of sampled rows.
    pub ix_sample: Vec<usize>,

    /// Crop offsets applied to each observation.
    pub obs_offsets: Vec<CropOffset>,

    /// Crop offsets applied to each next observation.
    pub next_obs_offsets: Vec<CropOffset>,
}

impl ImageTransitionBatch {
    /// Number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Shape of the observation array, `[batch_size, C, H, W]`.
    pub fn obs_dims(&self) -> Vec<usize> {
        let mut dims = vec![self.len()];
        dims.extend_from_slice(&self.obs_shape.dims());
        dims
    }

    /// Shape of the action array, `[batch_size, act_shape...]`.
    pub fn act_dims(&self) -> Vec<usize> {
        let mut dims = vec![self.len()];
        dims.extend_from_slice(&self.act_shape);
        dims
    }

    /// Decomposes the batch into
    /// `(obs, act, reward, next_obs, done, done_no_max)`.
    pub fn unpack(self) -> (Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>) {
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
