//! Thread-safe image replay buffer.
use crate::{
    sampler::sample_indices, storage::WriteCursor, CropOffset, ExperienceBufferBase,
    ImageReplayBufferConfig, ImageShape, ImageTransitionBatch, OwnedTransition, PixReplayError,
    RandomShift, ReplayBufferBase, StorageArrays, Transition, PIXEL_SCALE,
};
use anyhow::Result;
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};

/// Everything mutated by insertion and sampling, guarded by one lock.
struct State<R> {
    storage: StorageArrays,
    cursor: WriteCursor,
    rng: R,
}

/// Raw rows copied out of the storage while the lock is held.
struct GatheredRows {
    ixs: Vec<usize>,
    obs: Vec<u8>,
    next_obs: Vec<u8>,
    act: Vec<f32>,
    reward: Vec<f32>,
    done: Vec<f32>,
    done_no_max: Vec<f32>,
    obs_offsets: Vec<CropOffset>,
    next_obs_offsets: Vec<CropOffset>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A fixed-capacity replay buffer of image transitions.
///
/// Transitions are copied into preallocated parallel arrays at the write
/// index, which advances modulo the capacity. Once the buffer is full, every
/// insertion overwrites the oldest row.
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Empty
///     Empty --> Filling: insert
///     Filling --> Filling: insert (size < capacity)
///     Filling --> Full: insert (size == capacity)
///     Full --> Full: insert (overwrites oldest)
/// ```
///
/// Batches are sampled uniformly with replacement from the valid rows. Each
/// sampled observation and next observation gets its own random shift
/// ([`RandomShift`]), and pixels are divided by [`PIXEL_SCALE`].
///
/// All operations take `&self`. The writer and the learner may share one
/// instance through an [`Arc`](std::sync::Arc). A single lock covers the
/// whole row write of an insertion and the index draw and row copy of a
/// batch; augmentation and normalization run after the lock is released.
///
/// The random source `R` drives sampling and augmentation. [`Self::new`]
/// seeds a [`StdRng`] from the configuration; [`Self::with_rng`] accepts any
/// generator.
pub struct ImageReplayBuffer<R = StdRng> {
    obs_shape: ImageShape,
    act_shape: Vec<usize>,
    act_len: usize,
    action_range: Option<[f32; 2]>,
    shift: RandomShift,
    state: Mutex<State<R>>,
}

impl ImageReplayBuffer<StdRng> {
    /// Builds a buffer whose random source is seeded with `config.seed`.
    pub fn new(config: &ImageReplayBufferConfig) -> Result<Self, PixReplayError> {
        Self::with_rng(config, StdRng::seed_from_u64(config.seed))
    }
}

impl<R: Rng> ImageReplayBuffer<R> {
    /// Builds a buffer with the given random source.
    pub fn with_rng(config: &ImageReplayBufferConfig, rng: R) -> Result<Self, PixReplayError> {
        config.validate()?;

        let capacity = config.capacity;
        let act_len = config.act_len();
        let storage_bytes = config.storage_bytes().unwrap_or_default();
        info!(
            "Allocate replay buffer: capacity = {}, obs_shape = {}, act_shape = {:?}, pad = {}, {:.2}MB",
            capacity,
            config.obs_shape,
            config.act_shape,
            config.pad,
            storage_bytes as f32 / (1024. * 1024.)
        );

        let state = State {
            storage: StorageArrays::new(capacity, &config.obs_shape, act_len),
            cursor: WriteCursor::new(capacity),
            rng,
        };

        Ok(Self {
            obs_shape: config.obs_shape,
            act_shape: config.act_shape.clone(),
            act_len,
            action_range: config.action_range,
            shift: RandomShift::new(config.pad),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state
            .lock()
            .expect("Replay buffer lock was poisoned by a panicking thread")
    }

    fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), PixReplayError> {
        if expected != actual {
            return Err(PixReplayError::ShapeMismatch {
                field,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Validates a transition against the configured shapes and range.
    fn check(&self, tr: &Transition<'_>) -> Result<(), PixReplayError> {
        let obs_len = self.obs_shape.len();
        Self::check_len("obs", obs_len, tr.obs.len())?;
        Self::check_len("next_obs", obs_len, tr.next_obs.len())?;
        Self::check_len("act", self.act_len, tr.act.len())?;

        if let Some([low, high]) = self.action_range {
            if let Some(&value) = tr.act.iter().find(|&&a| !(a >= low && a <= high)) {
                return Err(PixReplayError::ActionOutOfRange { value, low, high });
            }
        }
        Ok(())
    }

    /// Copies a transition into the row at the write index and advances it.
    ///
    /// Fails without touching the buffer if the transition does not match the
    /// configured shapes or action range.
    pub fn insert(&self, tr: &Transition<'_>) -> Result<(), PixReplayError> {
        if let Err(e) = self.check(tr) {
            debug!("Reject transition: {}", e);
            return Err(e);
        }

        let became_full = {
            let mut state = self.lock();
            let was_full = state.cursor.is_full();
            let i = state.cursor.index();
            state.storage.write(i, tr);
            state.cursor.advance();
            !was_full && state.cursor.is_full()
        };

        if became_full {
            info!("Replay buffer is full, the oldest transitions will be overwritten");
        }
        Ok(())
    }

    /// Draws `batch_size` row indices uniformly with replacement from the
    /// valid rows.
    pub fn sample_indices(&self, batch_size: usize) -> Result<Vec<usize>, PixReplayError> {
        let mut state = self.lock();
        let State { cursor, rng, .. } = &mut *state;
        sample_indices(rng, cursor.size(), batch_size)
    }

    /// Copies the rows of a freshly drawn batch and draws their crop offsets.
    fn gather(&self, batch_size: usize) -> Result<GatheredRows, PixReplayError> {
        let obs_len = self.obs_shape.len();
        let mut state = self.lock();
        let State {
            storage,
            cursor,
            rng,
        } = &mut *state;

        let mut rows = GatheredRows {
            ixs: sample_indices(rng, cursor.size(), batch_size)?,
            obs: Vec::with_capacity(batch_size * obs_len),
            next_obs: Vec::with_capacity(batch_size * obs_len),
            act: Vec::with_capacity(batch_size * self.act_len),
            reward: Vec::with_capacity(batch_size),
            done: Vec::with_capacity(batch_size),
            done_no_max: Vec::with_capacity(batch_size),
            obs_offsets: Vec::with_capacity(batch_size),
            next_obs_offsets: Vec::with_capacity(batch_size),
        };

        for &i in rows.ixs.iter() {
            rows.obs.extend_from_slice(storage.obs(i));
            rows.next_obs.extend_from_slice(storage.next_obs(i));
            rows.act.extend_from_slice(storage.act(i));
            rows.reward.push(storage.reward(i));
            rows.done.push(storage.done(i) as f32);
            rows.done_no_max.push(storage.done_no_max(i) as f32);
            rows.obs_offsets.push(self.shift.offset(rng));
            rows.next_obs_offsets.push(self.shift.offset(rng));
        }

        Ok(rows)
    }

    /// Augments and normalizes a batch of raw images.
    fn normalize_images(&self, raw: &[u8], offsets: &[CropOffset]) -> Vec<f32> {
        let obs_len = self.obs_shape.len();
        let mut out = vec![0f32; raw.len()];
        for ((src, dst), &offset) in raw
            .chunks_exact(obs_len)
            .zip(out.chunks_exact_mut(obs_len))
            .zip(offsets.iter())
        {
            self.shift
                .crop_map(src, &self.obs_shape, offset, dst, |p| p as f32 / PIXEL_SCALE);
        }
        out
    }

    /// Samples a batch of `batch_size` augmented transitions.
    ///
    /// Fails with [`PixReplayError::EmptyBuffer`] if nothing has been inserted.
    pub fn batch(&self, batch_size: usize) -> Result<ImageTransitionBatch, PixReplayError> {
        let rows = self.gather(batch_size)?;
        let obs = self.normalize_images(&rows.obs, &rows.obs_offsets);
        let next_obs = self.normalize_images(&rows.next_obs, &rows.next_obs_offsets);
        trace!("Sample a batch of {} transitions", batch_size);

        Ok(ImageTransitionBatch {
            obs_shape: self.obs_shape,
            act_shape: self.act_shape.clone(),
            obs,
            act: rows.act,
            reward: rows.reward,
            next_obs,
            done: rows.done,
            done_no_max: rows.done_no_max,
            ix_sample: rows.ixs,
            obs_offsets: rows.obs_offsets,
            next_obs_offsets: rows.next_obs_offsets,
        })
    }

    /// Returns a copy of row `i` as stored, or `None` if the row is not valid.
    pub fn row(&self, i: usize) -> Option<OwnedTransition> {
        let state = self.lock();
        if i < state.cursor.size() {
            Some(state.storage.row(i))
        } else {
            None
        }
    }

    /// Number of valid rows.
    pub fn len(&self) -> usize {
        self.lock().cursor.size()
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if every row holds a transition.
    pub fn is_full(&self) -> bool {
        self.lock().cursor.is_full()
    }

    /// Index of the row written by the next insertion.
    pub fn write_index(&self) -> usize {
        self.lock().cursor.index()
    }

    /// Maximum number of rows.
    pub fn capacity(&self) -> usize {
        self.lock().cursor.capacity()
    }

    /// Shape of observations.
    pub fn obs_shape(&self) -> ImageShape {
        self.obs_shape
    }

    /// Shape of actions.
    pub fn act_shape(&self) -> &[usize] {
        &self.act_shape
    }

    /// Padding of the random shift augmentation.
    pub fn pad(&self) -> usize {
        self.shift.pad()
    }

    /// Returns the number of done flags among valid rows.
    pub fn num_done_flags(&self) -> usize {
        let state = self.lock();
        state.storage.num_done_flags(state.cursor.size())
    }

    /// Returns the number of done-no-max flags among valid rows.
    pub fn num_done_no_max_flags(&self) -> usize {
        let state = self.lock();
        state.storage.num_done_no_max_flags(state.cursor.size())
    }

    /// Returns the sum of rewards of valid rows.
    pub fn sum_rewards(&self) -> f32 {
        let state = self.lock();
        state.storage.sum_rewards(state.cursor.size())
    }
}

impl<R: Rng> ExperienceBufferBase for ImageReplayBuffer<R> {
    fn push(&self, tr: &Transition<'_>) -> Result<()> {
        self.insert(tr)?;
        Ok(())
    }

    fn len(&self) -> usize {
        ImageReplayBuffer::len(self)
    }
}

impl ReplayBufferBase for ImageReplayBuffer<StdRng> {
    type Config = ImageReplayBufferConfig;
    type Batch = ImageTransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self::new(config)?)
    }

    fn batch(&self, size: usize) -> Result<Self::Batch> {
        Ok(ImageReplayBuffer::batch(self, size)?)
    }
}
