//! Replay buffer interfaces.
//!
//! Writers (rollout loops) see a buffer through [`ExperienceBufferBase`],
//! learners through [`ReplayBufferBase`]. Both take `&self` so a single
//! instance can be shared between threads behind an [`Arc`](std::sync::Arc).
use crate::Transition;
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// Pushes a transition into the buffer.
    ///
    /// The transition is copied; the caller keeps ownership of its data.
    fn push(&self, tr: &Transition<'_>) -> Result<()>;

    /// Returns the current number of transitions in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no transition.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Samples a batch of `size` transitions.
    fn batch(&self, size: usize) -> Result<Self::Batch>;
}
