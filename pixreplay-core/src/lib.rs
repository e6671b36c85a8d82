#![warn(missing_docs)]
//! A fixed-capacity replay buffer of image transitions for off-policy
//! reinforcement learning.
//!
//! The buffer holds `(obs, act, reward, next_obs, done, done_no_max)`
//! transitions in preallocated arrays, overwrites the oldest transition when
//! full, samples batches uniformly with replacement and applies an
//! independent random shift to every sampled image.
//!
//! ```rust
//! use pixreplay_core::{ImageReplayBuffer, ImageReplayBufferConfig, ImageShape, Transition};
//!
//! let config = ImageReplayBufferConfig::default()
//!     .obs_shape(ImageShape::new(3, 8, 8))
//!     .act_shape(vec![2])
//!     .capacity(100)
//!     .pad(2);
//! let buffer = ImageReplayBuffer::new(&config).unwrap();
//!
//! let obs = vec![0u8; 3 * 8 * 8];
//! let next_obs = vec![1u8; 3 * 8 * 8];
//! buffer
//!     .insert(&Transition {
//!         obs: &obs,
//!         act: &[0.1, -0.2],
//!         reward: 1.0,
//!         next_obs: &next_obs,
//!         done: false,
//!         done_no_max: false,
//!     })
//!     .unwrap();
//!
//! let batch = buffer.batch(4).unwrap();
//! assert_eq!(batch.obs_dims(), vec![4, 3, 8, 8]);
//! ```
mod augment;
mod base;
mod batch;
mod buffer;
mod config;
pub mod error;
mod frame_stack;
pub mod sampler;
mod shape;
mod step_proc;
mod storage;
mod transition;

pub use augment::{CropOffset, RandomShift};
pub use base::{ExperienceBufferBase, ReplayBufferBase};
pub use batch::{ImageTransitionBatch, PIXEL_SCALE};
pub use buffer::ImageReplayBuffer;
pub use config::ImageReplayBufferConfig;
pub use error::PixReplayError;
pub use frame_stack::FrameStack;
pub use shape::{num_elements, ImageShape};
pub use step_proc::{TimeLimitStepProcessor, TimeLimitStepProcessorConfig};
pub use storage::{StorageArrays, WriteCursor};
pub use transition::{OwnedTransition, Transition};
