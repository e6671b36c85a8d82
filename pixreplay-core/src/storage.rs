//! Preallocated storage of transitions and the write cursor.
use crate::{ImageShape, OwnedTransition, Transition};

/// Position of the next write and the number of valid rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteCursor {
    capacity: usize,
    i: usize,
    size: usize,
}

impl WriteCursor {
    /// Creates a cursor for an empty buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            i: 0,
            size: 0,
        }
    }

    /// Index of the row written by the next insertion.
    pub fn index(&self) -> usize {
        self.i
    }

    /// Number of valid rows.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum number of rows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if every row holds a transition.
    pub fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    /// Moves to the next slot after a row has been written.
    pub fn advance(&mut self) {
        self.i = (self.i + 1) % self.capacity;
        if self.size < self.capacity {
            self.size += 1;
        }
    }
}

/// Parallel fixed-size arrays, one per transition field.
///
/// Row `i` of every array describes the same transition. Images are kept as
/// raw `u8` pixels; nothing is allocated after construction.
pub struct StorageArrays {
    obs_len: usize,
    act_len: usize,
    obs: Vec<u8>,
    act: Vec<f32>,
    next_obs: Vec<u8>,
    reward: Vec<f32>,
    done: Vec<i8>,
    done_no_max: Vec<i8>,
}

impl StorageArrays {
    /// Allocates zeroed storage for `capacity` rows.
    pub fn new(capacity: usize, obs_shape: &ImageShape, act_len: usize) -> Self {
        let obs_len = obs_shape.len();
        Self {
            obs_len,
            act_len,
            obs: vec![0; capacity * obs_len],
            act: vec![0.; capacity * act_len],
            next_obs: vec![0; capacity * obs_len],
            reward: vec![0.; capacity],
            done: vec![0; capacity],
            done_no_max: vec![0; capacity],
        }
    }

    /// Copies a transition into row `i`.
    ///
    /// The lengths of the slices must have been checked by the caller.
    pub fn write(&mut self, i: usize, tr: &Transition) {
        let o = i * self.obs_len;
        let a = i * self.act_len;
        self.obs[o..o + self.obs_len].copy_from_slice(tr.obs);
        self.next_obs[o..o + self.obs_len].copy_from_slice(tr.next_obs);
        self.act[a..a + self.act_len].copy_from_slice(tr.act);
        self.reward[i] = tr.reward;
        self.done[i] = tr.done as i8;
        self.done_no_max[i] = tr.done_no_max as i8;
    }

    /// Raw pixels of the observation in row `i`.
    pub fn obs(&self, i: usize) -> &[u8] {
        &self.obs[i * self.obs_len..(i + 1) * self.obs_len]
    }

    /// Raw pixels of the next observation in row `i`.
    pub fn next_obs(&self, i: usize) -> &[u8] {
        &self.next_obs[i * self.obs_len..(i + 1) * self.obs_len]
    }

    /// Flattened action in row `i`.
    pub fn act(&self, i: usize) -> &[f32] {
        &self.act[i * self.act_len..(i + 1) * self.act_len]
    }

    /// Reward in row `i`.
    pub fn reward(&self, i: usize) -> f32 {
        self.reward[i]
    }

    /// Done flag in row `i`.
    pub fn done(&self, i: usize) -> i8 {
        self.done[i]
    }

    /// Done flag excluding time limits in row `i`.
    pub fn done_no_max(&self, i: usize) -> i8 {
        self.done_no_max[i]
    }

    /// Owned copy of row `i`.
    pub fn row(&self, i: usize) -> OwnedTransition {
        OwnedTransition {
            obs: self.obs(i).to_vec(),
            act: self.act(i).to_vec(),
            reward: self.reward[i],
            next_obs: self.next_obs(i).to_vec(),
            done: self.done[i] != 0,
            done_no_max: self.done_no_max[i] != 0,
        }
    }

    /// Number of set done flags among the first `size` rows.
    pub fn num_done_flags(&self, size: usize) -> usize {
        self.done[..size].iter().map(|&d| d as usize).sum()
    }

    /// Number of set done-no-max flags among the first `size` rows.
    pub fn num_done_no_max_flags(&self, size: usize) -> usize {
        self.done_no_max[..size].iter().map(|&d| d as usize).sum()
    }

    /// Sum of rewards of the first `size` rows.
    pub fn sum_rewards(&self, size: usize) -> f32 {
        self.reward[..size].iter().sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cursor_wraps() {
        let mut cursor = WriteCursor::new(3);
        for n in 1..=7 {
            cursor.advance();
            assert_eq!(cursor.size(), n.min(3));
            assert_eq!(cursor.index(), n % 3);
        }
        assert!(cursor.is_full());
    }

    #[test]
    fn test_rows_are_independent() {
        let shape = ImageShape::new(1, 2, 2);
        let mut storage = StorageArrays::new(2, &shape, 2);
        let obs = [1u8, 2, 3, 4];
        let next_obs = [5u8, 6, 7, 8];
        let act = [0.5f32, -0.5];
        let tr = Transition {
            obs: &obs,
            act: &act,
            reward: 1.5,
            next_obs: &next_obs,
            done: true,
            done_no_max: false,
        };
        storage.write(1, &tr);

        assert_eq!(storage.obs(0), &[0, 0, 0, 0]);
        assert_eq!(storage.obs(1), &obs);
        assert_eq!(storage.next_obs(1), &next_obs);
        assert_eq!(storage.act(1), &act);
        assert_eq!(storage.done(1), 1);
        assert_eq!(storage.done_no_max(1), 0);
        assert_eq!(storage.row(1), OwnedTransition::from(tr));
        assert_eq!(storage.num_done_flags(2), 1);
        assert_eq!(storage.sum_rewards(2), 1.5);
    }
}
