//! Uniform sampling of row indices.
use crate::PixReplayError;
use rand::Rng;

/// Draws `batch_size` indices uniformly from `0..size`, with replacement.
///
/// A batch may contain the same index more than once.
pub fn sample_indices<R: Rng + ?Sized>(
    rng: &mut R,
    size: usize,
    batch_size: usize,
) -> Result<Vec<usize>, PixReplayError> {
    if size == 0 {
        return Err(PixReplayError::EmptyBuffer);
    }
    Ok((0..batch_size).map(|_| rng.gen_range(0..size)).collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            sample_indices(&mut rng, 0, 4),
            Err(PixReplayError::EmptyBuffer)
        );
    }

    #[test]
    fn test_range_and_determinism() {
        let mut rng1 = StdRng::seed_from_u64(3);
        let mut rng2 = StdRng::seed_from_u64(3);
        let ixs1 = sample_indices(&mut rng1, 5, 100).unwrap();
        let ixs2 = sample_indices(&mut rng2, 5, 100).unwrap();
        assert_eq!(ixs1.len(), 100);
        assert!(ixs1.iter().all(|&ix| ix < 5));
        assert_eq!(ixs1, ixs2);
    }

    #[test]
    fn test_chi_square_uniformity() {
        let size = 10;
        let n = 100_000;
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = vec![0usize; size];
        for _ in 0..n {
            let ix = sample_indices(&mut rng, size, 1).unwrap()[0];
            counts[ix] += 1;
        }
        let expected = n as f64 / size as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();

        // Critical value of chi-square with 9 degrees of freedom at p = 0.0001.
        assert!(chi2 < 33.72, "chi2 = {}", chi2);
    }
}
