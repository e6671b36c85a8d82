use clap::Parser;
use serde::{Deserialize, Serialize};

/// Run a synthetic rollout writer and a learner reader against one replay buffer
#[derive(Clone, Parser, Debug, Serialize, Deserialize)]
#[command(version, about)]
pub struct Args {
    /// Path to a YAML file of `DeviceReplayBufferConfig`.
    /// When given, the buffer options below are ignored.
    #[arg(long)]
    pub config: Option<String>,

    /// Device name, `"cpu"` or `"cuda"`.
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Capacity of the replay buffer
    #[arg(long, default_value_t = 100_000)]
    pub capacity: usize,

    /// Height and width of rendered frames
    #[arg(long, default_value_t = 84)]
    pub image_size: usize,

    /// Number of stacked frames in an observation
    #[arg(long, default_value_t = 3)]
    pub frame_stack: usize,

    /// Padding of the random shift augmentation
    #[arg(long, default_value_t = 4)]
    pub image_pad: usize,

    /// Dimension of actions
    #[arg(long, default_value_t = 4)]
    pub dim_act: usize,

    /// Time limit of episodes
    #[arg(long, default_value_t = 250)]
    pub max_episode_steps: usize,

    /// Number of transitions collected before the learner starts
    #[arg(long, default_value_t = 1000)]
    pub num_seed_steps: usize,

    /// Batch size
    #[arg(long, default_value_t = 512)]
    pub batch_size: usize,

    /// Number of batches drawn by the learner
    #[arg(long, default_value_t = 1000)]
    pub max_opts: usize,

    /// Interval of logging the learner throughput
    #[arg(long, default_value_t = 100)]
    pub record_interval: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
