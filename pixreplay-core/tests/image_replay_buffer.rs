use anyhow::Result;
use pixreplay_core::{
    CropOffset, ExperienceBufferBase, FrameStack, ImageReplayBuffer, ImageReplayBufferConfig,
    ImageShape, OwnedTransition, PixReplayError, RandomShift, ReplayBufferBase,
    TimeLimitStepProcessor, TimeLimitStepProcessorConfig, Transition, PIXEL_SCALE,
};
use rand::{rngs::StdRng, SeedableRng};
use test_log::test;

const OBS_SHAPE: ImageShape = ImageShape {
    channels: 3,
    height: 6,
    width: 6,
};

fn config() -> ImageReplayBufferConfig {
    ImageReplayBufferConfig::default()
        .obs_shape(OBS_SHAPE)
        .act_shape(vec![3])
        .capacity(32)
        .pad(2)
        .seed(13)
}

/// An image whose pixel values encode their position.
fn gradient(base: u8) -> Vec<u8> {
    (0..OBS_SHAPE.len())
        .map(|i| base.wrapping_add((i % 200) as u8))
        .collect()
}

#[test]
fn round_trip_without_augmentation() -> Result<()> {
    let buffer = ImageReplayBuffer::new(&config().pad(0))?;
    let tr = OwnedTransition {
        obs: gradient(0),
        act: vec![0.25, -1.0, 0.75],
        reward: -0.5,
        next_obs: gradient(17),
        done: true,
        done_no_max: false,
    };
    buffer.insert(&tr.as_transition())?;

    // Storage keeps the inserted values bit for bit.
    assert_eq!(buffer.row(0), Some(tr.clone()));

    // Batches only differ by the pixel scale.
    let batch = buffer.batch(2)?;
    let expected: Vec<f32> = tr.obs.iter().map(|&p| p as f32 / PIXEL_SCALE).collect();
    assert_eq!(&batch.obs[..OBS_SHAPE.len()], &expected[..]);
    assert_eq!(&batch.act[..3], &tr.act[..]);
    Ok(())
}

#[test]
fn bootstrap_flags_are_kept_apart() -> Result<()> {
    let buffer = ImageReplayBuffer::new(&config())?;
    let obs = gradient(0);
    let act = [0.0f32; 3];

    // Truncated by the time limit.
    buffer.insert(&Transition {
        obs: &obs,
        act: &act,
        reward: 0.0,
        next_obs: &obs,
        done: true,
        done_no_max: false,
    })?;

    // True terminal.
    buffer.insert(&Transition {
        obs: &obs,
        act: &act,
        reward: 1.0,
        next_obs: &obs,
        done: true,
        done_no_max: true,
    })?;

    let batch = buffer.batch(256)?;
    let mut seen = [false; 2];
    for b in 0..batch.len() {
        let ix = batch.ix_sample[b];
        seen[ix] = true;
        assert_eq!(batch.reward[b], ix as f32);
        assert_eq!(batch.done[b], 1.0);
        assert_eq!(batch.done_no_max[b], ix as f32);
    }
    assert_eq!(seen, [true, true]);
    assert_eq!(buffer.num_done_flags(), 2);
    assert_eq!(buffer.num_done_no_max_flags(), 1);
    Ok(())
}

#[test]
fn crops_are_drawn_independently() -> Result<()> {
    let buffer = ImageReplayBuffer::new(&config())?;
    let obs = gradient(0);
    buffer.insert(&Transition {
        obs: &obs,
        act: &[0.0; 3],
        reward: 0.0,
        next_obs: &obs,
        done: false,
        done_no_max: false,
    })?;

    let pad = buffer.pad();
    let shift = RandomShift::new(pad);
    let mut n_differ = 0;
    for _ in 0..10 {
        let batch = buffer.batch(8)?;
        for b in 0..batch.len() {
            let (o, no) = (batch.obs_offsets[b], batch.next_obs_offsets[b]);
            for offset in [o, no].iter() {
                assert!(offset.dy <= 2 * pad && offset.dx <= 2 * pad);
            }
            if o != no {
                n_differ += 1;
            }

            // The batch image is the crop at the recorded offset.
            let expected: Vec<f32> = shift
                .crop(&obs, &OBS_SHAPE, o)
                .iter()
                .map(|&p| p as f32 / PIXEL_SCALE)
                .collect();
            let len = OBS_SHAPE.len();
            assert_eq!(&batch.obs[b * len..(b + 1) * len], &expected[..]);
        }
    }

    // Offsets come from 25 combinations; equal pairs in all 80 rows would
    // mean the offset is shared.
    assert!(n_differ > 0);
    Ok(())
}

#[test]
fn augmented_batch_keeps_image_shape() -> Result<()> {
    let buffer = ImageReplayBuffer::new(&config().pad(4))?;
    let obs = gradient(3);
    for _ in 0..5 {
        buffer.insert(&Transition {
            obs: &obs,
            act: &[0.0; 3],
            reward: 0.0,
            next_obs: &obs,
            done: false,
            done_no_max: false,
        })?;
    }
    let batch = buffer.batch(10)?;
    assert_eq!(batch.obs_dims(), vec![10, 3, 6, 6]);
    assert_eq!(batch.obs.len(), 10 * OBS_SHAPE.len());
    assert_eq!(batch.next_obs.len(), 10 * OBS_SHAPE.len());
    assert!(batch.obs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    Ok(())
}

#[test]
fn sampling_through_buffer_is_uniform() -> Result<()> {
    let size = 8;
    let buffer = ImageReplayBuffer::with_rng(&config(), StdRng::seed_from_u64(2024))?;
    let obs = gradient(0);
    for _ in 0..size {
        buffer.insert(&Transition {
            obs: &obs,
            act: &[0.0; 3],
            reward: 0.0,
            next_obs: &obs,
            done: false,
            done_no_max: false,
        })?;
    }

    let n = 80_000;
    let mut counts = vec![0usize; size];
    for _ in 0..n {
        counts[buffer.sample_indices(1)?[0]] += 1;
    }
    let expected = n as f64 / size as f64;
    let chi2: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();

    // Chi-square with 7 degrees of freedom at p = 0.0001.
    assert!(chi2 < 29.88, "chi2 = {}", chi2);
    Ok(())
}

#[test]
fn empty_buffer_through_trait() -> Result<()> {
    let buffer = <ImageReplayBuffer as ReplayBufferBase>::build(&config())?;
    assert!(ExperienceBufferBase::is_empty(&buffer));
    let err = ReplayBufferBase::batch(&buffer, 4).unwrap_err();
    assert_eq!(
        err.downcast_ref::<PixReplayError>(),
        Some(&PixReplayError::EmptyBuffer)
    );
    Ok(())
}

#[test]
fn rollout_with_frame_stack_and_time_limit() -> Result<()> {
    let frame_shape = ImageShape::new(1, 6, 6);
    let mut stack = FrameStack::new(3, frame_shape);
    let mut step_proc = TimeLimitStepProcessor::build(
        &TimeLimitStepProcessorConfig::default().max_episode_steps(4),
    );
    let config = config().obs_shape(stack.stacked_shape()).capacity(8);
    let buffer = ImageReplayBuffer::new(&config)?;

    let frame = |k: u8| vec![k; frame_shape.len()];
    let obs = stack.reset(&frame(0))?;
    step_proc.reset(obs.as_slice().unwrap());

    for step in 1..=4u8 {
        let next_obs = stack.push(&frame(step))?;
        // The environment reports `done` on the time limit.
        let tr = step_proc.process(next_obs.as_slice().unwrap(), &[0.0; 3], 1.0, step == 4)?;
        buffer.push(&tr.as_transition())?;
    }

    assert_eq!(buffer.len(), 4);
    let last = buffer.row(3).unwrap();
    assert!(last.done);
    assert!(!last.done_no_max);
    assert_eq!(last.next_obs[..36], vec![2u8; 36][..]);
    assert_eq!(last.next_obs[72..], vec![4u8; 36][..]);
    assert_eq!(buffer.sum_rewards(), 4.0);
    assert_eq!(buffer.row(0).unwrap().obs, vec![0u8; 3 * 36]);
    assert_eq!(buffer.row(0).unwrap().next_obs[72..], vec![1u8; 36][..]);
    assert_eq!(CropOffset::default(), CropOffset { dy: 0, dx: 0 });
    Ok(())
}
