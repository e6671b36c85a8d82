//! Conversion of environment steps into transitions with time-limit aware
//! terminal flags.
use crate::OwnedTransition;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Configuration of [`TimeLimitStepProcessor`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TimeLimitStepProcessorConfig {
    /// Number of steps after which the environment truncates an episode.
    pub max_episode_steps: usize,
}

impl Default for TimeLimitStepProcessorConfig {
    fn default() -> Self {
        Self {
            max_episode_steps: 1000,
        }
    }
}

impl TimeLimitStepProcessorConfig {
    /// Sets the time limit of episodes.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }
}

/// Builds transitions from successive environment steps.
///
/// The processor keeps the previous observation and counts steps in the
/// current episode. A step reaching `max_episode_steps` is a truncation:
/// `done` is kept but `done_no_max` is cleared, so that the learner still
/// bootstraps from the next observation.
pub struct TimeLimitStepProcessor {
    max_episode_steps: usize,
    episode_step: usize,
    prev_obs: Option<Vec<u8>>,
}

impl TimeLimitStepProcessor {
    /// Creates a processor. [`Self::reset`] must be called before processing.
    pub fn build(config: &TimeLimitStepProcessorConfig) -> Self {
        Self {
            max_episode_steps: config.max_episode_steps,
            episode_step: 0,
            prev_obs: None,
        }
    }

    /// Starts a new episode from its initial observation.
    pub fn reset(&mut self, init_obs: &[u8]) {
        self.prev_obs = Some(init_obs.to_vec());
        self.episode_step = 0;
    }

    /// Number of steps processed in the current episode.
    pub fn episode_step(&self) -> usize {
        self.episode_step
    }

    /// Processes one environment step.
    ///
    /// `done` is the terminal flag reported by the environment, which is also
    /// set when the episode is truncated by the time limit.
    pub fn process(
        &mut self,
        next_obs: &[u8],
        act: &[f32],
        reward: f32,
        done: bool,
    ) -> Result<OwnedTransition> {
        let obs = self
            .prev_obs
            .replace(next_obs.to_vec())
            .ok_or_else(|| anyhow!("prev_obs is not set. Forgot to call reset()?"))?;

        let done_no_max = if self.episode_step + 1 == self.max_episode_steps {
            false
        } else {
            done
        };
        self.episode_step += 1;

        Ok(OwnedTransition {
            obs,
            act: act.to_vec(),
            reward,
            next_obs: next_obs.to_vec(),
            done,
            done_no_max,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_process_before_reset() {
        let mut step_proc = TimeLimitStepProcessor::build(&TimeLimitStepProcessorConfig::default());
        assert!(step_proc.process(&[0], &[0.], 0., false).is_err());
    }

    #[test]
    fn test_truncation_keeps_bootstrap() {
        let config = TimeLimitStepProcessorConfig::default().max_episode_steps(3);
        let mut step_proc = TimeLimitStepProcessor::build(&config);
        step_proc.reset(&[0]);

        let tr = step_proc.process(&[1], &[0.1], 1., false).unwrap();
        assert_eq!((tr.obs, tr.next_obs), (vec![0], vec![1]));
        assert!(!tr.done && !tr.done_no_max);

        let tr = step_proc.process(&[2], &[0.2], 1., false).unwrap();
        assert_eq!(tr.obs, vec![1]);

        // The third step hits the time limit.
        let tr = step_proc.process(&[3], &[0.3], 1., true).unwrap();
        assert!(tr.done);
        assert!(!tr.done_no_max);
        assert_eq!(step_proc.episode_step(), 3);
    }

    #[test]
    fn test_true_terminal() {
        let config = TimeLimitStepProcessorConfig::default().max_episode_steps(10);
        let mut step_proc = TimeLimitStepProcessor::build(&config);
        step_proc.reset(&[0]);
        let tr = step_proc.process(&[1], &[0.], -1., true).unwrap();
        assert!(tr.done && tr.done_no_max);

        step_proc.reset(&[5]);
        assert_eq!(step_proc.episode_step(), 0);
        let tr = step_proc.process(&[6], &[0.], 0., false).unwrap();
        assert_eq!(tr.obs, vec![5]);
    }
}
