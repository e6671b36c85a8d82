//! Transitions pushed into the replay buffer.

/// A transition borrowed from the caller, e.g. from the output of an
/// environment step.
///
/// Images are raw `u8` pixels in `(C, H, W)` layout. The buffer copies every
/// field on insertion and never keeps a reference to the caller's memory.
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    /// Observation before the step.
    pub obs: &'a [u8],

    /// Action taken, flattened.
    pub act: &'a [f32],

    /// Reward of the step.
    pub reward: f32,

    /// Observation after the step.
    pub next_obs: &'a [u8],

    /// The episode ended at this step, for any reason.
    pub done: bool,

    /// The episode ended at this step for a reason other than the time limit.
    /// Learners suppress bootstrapping only when this flag is set.
    pub done_no_max: bool,
}

/// A transition owning its data.
///
/// Produced by [`TimeLimitStepProcessor`](crate::TimeLimitStepProcessor) and
/// returned by [`ImageReplayBuffer::row`](crate::ImageReplayBuffer::row).
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedTransition {
    /// Observation before the step.
    pub obs: Vec<u8>,

    /// Action taken, flattened.
    pub act: Vec<f32>,

    /// Reward of the step.
    pub reward: f32,

    /// Observation after the step.
    pub next_obs: Vec<u8>,

    /// The episode ended at this step.
    pub done: bool,

    /// The episode ended at this step, not because of the time limit.
    pub done_no_max: bool,
}

impl OwnedTransition {
    /// Borrows the transition for insertion.
    pub fn as_transition(&self) -> Transition<'_> {
        Transition {
            obs: &self.obs,
            act: &self.act,
            reward: self.reward,
            next_obs: &self.next_obs,
            done: self.done,
            done_no_max: self.done_no_max,
        }
    }
}

impl<'a> From<Transition<'a>> for OwnedTransition {
    fn from(tr: Transition<'a>) -> Self {
        Self {
            obs: tr.obs.to_vec(),
            act: tr.act.to_vec(),
            reward: tr.reward,
            next_obs: tr.next_obs.to_vec(),
            done: tr.done,
            done_no_max: tr.done_no_max,
        }
    }
}
