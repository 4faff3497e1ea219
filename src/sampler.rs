// ---------------------------------------------------------------------------
// Sampler -- pluggable "select k of n" policy
// ---------------------------------------------------------------------------
//
// The popular/similar views currently have no real popularity signal, so
// they sample. Keeping the selection behind a trait means a click-through
// or sales signal can replace it later without touching the Recommender.
// ---------------------------------------------------------------------------

use rand::seq::index::sample;

/// Select `k` distinct positions out of `0..n`, without replacement.
/// Implementations must clamp `k` to `n`.
pub trait Sampler: Send + Sync {
	fn select(&self, n: usize, k: usize) -> Vec<usize>;
}

/// Uniform random sampling without replacement.
#[derive(Debug, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
	fn select(&self, n: usize, k: usize) -> Vec<usize> {
		let k = k.min(n);
		if k == 0 {
			return Vec::new();
		}
		let mut rng = rand::rng();
		sample(&mut rng, n, k).into_vec()
	}
}

/// Deterministic sampler: the first `k` positions in order. Used by tests
/// that assert on exact output.
#[derive(Debug, Default)]
pub struct TakeFirst;

impl Sampler for TakeFirst {
	fn select(&self, n: usize, k: usize) -> Vec<usize> {
		(0..k.min(n)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn random_sampler_yields_distinct_in_range() {
		let picks = RandomSampler.select(10, 4);
		assert_eq!(picks.len(), 4);
		let distinct: HashSet<usize> = picks.iter().copied().collect();
		assert_eq!(distinct.len(), 4);
		assert!(picks.iter().all(|&i| i < 10));
	}

	#[test]
	fn random_sampler_clamps_oversized_k() {
		let picks = RandomSampler.select(3, 10);
		assert_eq!(picks.len(), 3);
	}

	#[test]
	fn random_sampler_empty_population() {
		assert!(RandomSampler.select(0, 5).is_empty());
	}

	#[test]
	fn take_first_is_prefix() {
		assert_eq!(TakeFirst.select(5, 3), vec![0, 1, 2]);
		assert_eq!(TakeFirst.select(2, 3), vec![0, 1]);
	}
}
