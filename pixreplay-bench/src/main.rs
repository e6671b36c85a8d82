mod args;
mod env;
use anyhow::Result;
use args::Args;
use clap::Parser;
use crossbeam_channel::{unbounded, Sender};
use env::DotEnv;
use log::info;
use pixreplay_candle::{Device, DeviceReplayBuffer, DeviceReplayBufferConfig};
use pixreplay_core::{
    FrameStack, ImageReplayBuffer, ImageReplayBufferConfig, TimeLimitStepProcessor,
    TimeLimitStepProcessorConfig,
};
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

/// Summary of a finished episode, sent from the writer to the learner.
struct EpisodeStat {
    steps: usize,
    episode_return: f32,
}

fn create_config(args: &Args) -> Result<DeviceReplayBufferConfig> {
    if let Some(path) = &args.config {
        info!("Load replay buffer config from {}", path);
        return DeviceReplayBufferConfig::load(path);
    }

    let device = match args.device.as_str() {
        "cpu" => Device::Cpu,
        "cuda" => Device::Cuda(0),
        name => anyhow::bail!("Unknown device {:?}, expected \"cpu\" or \"cuda\"", name),
    };
    let replay_buffer = ImageReplayBufferConfig::default()
        .obs_shape(pixreplay_core::ImageShape::new(
            3 * args.frame_stack,
            args.image_size,
            args.image_size,
        ))
        .act_shape(vec![args.dim_act])
        .capacity(args.capacity)
        .pad(args.image_pad)
        .seed(args.seed)
        .action_range(Some([-1.0, 1.0]));

    Ok(DeviceReplayBufferConfig::default()
        .replay_buffer(replay_buffer)
        .device(device))
}

/// Collects transitions with random actions until `stop` is set.
fn run_writer(
    args: Args,
    buffer: Arc<ImageReplayBuffer>,
    stop: Arc<Mutex<bool>>,
    sender: Sender<EpisodeStat>,
) -> Result<usize> {
    let mut env = DotEnv::new(args.image_size, args.max_episode_steps, args.seed + 1);
    let mut frame_stack = FrameStack::new(args.frame_stack, env.frame_shape());
    let step_proc_config =
        TimeLimitStepProcessorConfig::default().max_episode_steps(args.max_episode_steps);
    let mut step_proc = TimeLimitStepProcessor::build(&step_proc_config);
    let dim_act: usize = buffer.act_shape().iter().product();

    let mut env_steps = 0;
    let mut episode_return = 0.;
    let obs = frame_stack.reset(&env.reset())?;
    step_proc.reset(&obs.into_raw_vec());

    while !*stop.lock().unwrap() {
        let act = env.sample_action(dim_act);
        let step = env.step(&act);
        let next_obs = frame_stack.push(&step.frame)?.into_raw_vec();
        let tr = step_proc.process(&next_obs, &act, step.reward, step.done)?;
        buffer.insert(&tr.as_transition())?;
        env_steps += 1;
        episode_return += step.reward;

        if step.done {
            let stat = EpisodeStat {
                steps: step_proc.episode_step(),
                episode_return,
            };
            // The learner may have finished already.
            let _ = sender.send(stat);
            episode_return = 0.;
            let obs = frame_stack.reset(&env.reset())?;
            step_proc.reset(&obs.into_raw_vec());
        }
    }

    Ok(env_steps)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("{:?}", args);

    let config = create_config(&args)?;
    let buffer = DeviceReplayBuffer::new(&config)?;
    let stop = Arc::new(Mutex::new(false));
    let (sender, receiver) = unbounded();

    let writer = {
        let args = args.clone();
        let handle = buffer.handle();
        let stop = stop.clone();
        std::thread::spawn(move || run_writer(args, handle, stop, sender))
    };

    while buffer.len() < args.num_seed_steps.min(config.replay_buffer.capacity) {
        if writer.is_finished() {
            let env_steps = writer.join().expect("Writer thread panicked")?;
            anyhow::bail!("Writer stopped after {} steps during warm-up", env_steps);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    info!("Collected {} seed transitions", buffer.len());

    let mut time = SystemTime::now();
    let mut n_episodes = 0;
    for opt_steps in 1..=args.max_opts {
        let (obs, ..) = buffer.get_batch(args.batch_size)?;
        debug_assert_eq!(obs.dims()[0], args.batch_size);

        if opt_steps % args.record_interval == 0 {
            let elapsed = time.elapsed()?.as_secs_f32();
            let stats: Vec<EpisodeStat> = receiver.try_iter().collect();
            n_episodes += stats.len();
            let mean_return = if stats.is_empty() {
                f32::NAN
            } else {
                stats.iter().map(|s| s.episode_return).sum::<f32>() / stats.len() as f32
            };
            let mean_steps = if stats.is_empty() {
                0.
            } else {
                stats.iter().map(|s| s.steps as f32).sum::<f32>() / stats.len() as f32
            };
            info!(
                "opt_steps = {}, batches/sec = {:.1}, buffer = {}, episodes = {}, mean return = {:.3}, mean length = {:.1}",
                opt_steps,
                args.record_interval as f32 / elapsed,
                buffer.len(),
                n_episodes,
                mean_return,
                mean_steps,
            );
            time = SystemTime::now();
        }
    }

    *stop.lock().unwrap() = true;
    let env_steps = writer.join().expect("Writer thread panicked")?;
    info!("Finished: {} environment steps, {} batches", env_steps, args.max_opts);

    Ok(())
}
