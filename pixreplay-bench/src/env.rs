//! A tiny pixel environment used to drive the replay buffer.
use pixreplay_core::ImageShape;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Result of one environment step.
pub struct Step {
    /// Rendered RGB frame of shape `(3, size, size)`.
    pub frame: Vec<u8>,
    pub reward: f32,
    /// Set on reaching the target or the time limit.
    pub done: bool,
}

/// A dot moved by the first two action components towards a fixed target.
///
/// Episodes end when the dot reaches the target or after `max_episode_steps`
/// steps, like a time-limit wrapped control task.
pub struct DotEnv {
    size: usize,
    max_episode_steps: usize,
    episode_step: usize,
    pos: (f32, f32),
    target: (f32, f32),
    rng: StdRng,
}

impl DotEnv {
    pub fn new(size: usize, max_episode_steps: usize, seed: u64) -> Self {
        let c = (size / 2) as f32;
        Self {
            size,
            max_episode_steps,
            episode_step: 0,
            pos: (0., 0.),
            target: (c, c),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn frame_shape(&self) -> ImageShape {
        ImageShape::new(3, self.size, self.size)
    }

    /// Draws a uniformly random action in `[-1, 1]`.
    pub fn sample_action(&mut self, dim_act: usize) -> Vec<f32> {
        (0..dim_act).map(|_| self.rng.gen_range(-1.0..=1.0)).collect()
    }

    pub fn reset(&mut self) -> Vec<u8> {
        let max = (self.size - 1) as f32;
        self.pos = (self.rng.gen_range(0.0..=max), self.rng.gen_range(0.0..=max));
        self.episode_step = 0;
        self.render()
    }

    pub fn step(&mut self, act: &[f32]) -> Step {
        let max = (self.size - 1) as f32;
        let dy = act.get(0).copied().unwrap_or(0.);
        let dx = act.get(1).copied().unwrap_or(0.);
        self.pos.0 = (self.pos.0 + 2. * dy).max(0.).min(max);
        self.pos.1 = (self.pos.1 + 2. * dx).max(0.).min(max);
        self.episode_step += 1;

        let dist = ((self.pos.0 - self.target.0).powi(2) + (self.pos.1 - self.target.1).powi(2))
            .sqrt();
        let reached = dist < 1.0;
        let reward = if reached { 1.0 } else { -dist / self.size as f32 };

        Step {
            frame: self.render(),
            reward,
            done: reached || self.episode_step == self.max_episode_steps,
        }
    }

    fn render(&self) -> Vec<u8> {
        let s = self.size;
        let mut frame = vec![32u8; 3 * s * s];
        let paint = |frame: &mut Vec<u8>, (y, x): (f32, f32), rgb: [u8; 3]| {
            let (y, x) = (y.round() as usize, x.round() as usize);
            for (c, v) in rgb.iter().enumerate() {
                frame[c * s * s + y * s + x] = *v;
            }
        };
        paint(&mut frame, self.target, [0, 255, 0]);
        paint(&mut frame, self.pos, [255, 0, 0]);
        frame
    }
}
