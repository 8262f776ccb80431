use rand::Rng;

use crate::error::{ChatError, Result};

/// Picks an index from a discrete probability distribution.
///
/// Walks the distribution in order, accumulating a running sum, and returns
/// the first index whose cumulative weight reaches `draw`. For `draw` in
/// `[0, distribution[0])` this is index 0.
///
/// The distribution is expected to be non-negative and to sum to 1.0; this
/// is not checked. `draw` is expected in `[0, 1)`.
///
/// # Errors
/// `InvalidDistribution` when the cumulative sum never reaches `draw`,
/// which means the distribution under-sums (or holds NaN). This points
/// at corrupted model output and is not recoverable.
pub fn sample_from_distribution(distribution: &[f64], draw: f64) -> Result<usize> {
	let mut sum = 0.0;
	for (i, weight) in distribution.iter().enumerate() {
		sum += weight;
		if draw <= sum {
			return Ok(i);
		}
	}
	Err(ChatError::InvalidDistribution { draw, sum })
}

/// [`sample_from_distribution`] with a uniform draw in `[0, 1)` from `rng`.
pub fn sample_with_rng<R: Rng + ?Sized>(distribution: &[f64], rng: &mut R) -> Result<usize> {
	let draw: f64 = rng.random();
	sample_from_distribution(distribution, draw)
}
