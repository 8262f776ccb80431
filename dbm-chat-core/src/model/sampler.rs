use ndarray::{Array2, Array3, Axis};
use rand::Rng;

use crate::error::{ChatError, Result};
use crate::model::distribution::sample_with_rng;
use crate::model::sequence::SequenceModel;
use crate::text::vocabulary::CharacterVocabulary;

/// Generates `num_samples` strings by sampling characters from `model`.
///
/// # Parameters
/// - `seed`: text the model is primed with. `None` picks one random
///   vocabulary character. Every returned string starts with the seed.
/// - `characters_to_sample`: characters appended after the seed.
/// - `num_samples`: sample slots, advanced in lockstep through one model
///   call per step.
///
/// # Behavior
/// - Clears the model state, then feeds the seed as one-hot input and keeps
///   the prediction at the last seed position.
/// - For every step and every slot, draws an index from the slot's current
///   distribution, appends its character, and feeds it back.
///
/// # Errors
/// - `InvalidInput` for an empty seed
/// - `UnknownCharacter` for a seed character outside the vocabulary
/// - `Topology` when the model and vocabulary widths disagree
/// - `InvalidDistribution` when the model outputs an under-summed distribution
pub fn sample_characters_from_model<M, R>(
	seed: Option<&str>,
	model: &mut M,
	vocabulary: &CharacterVocabulary,
	rng: &mut R,
	characters_to_sample: usize,
	num_samples: usize,
) -> Result<Vec<String>>
where
	M: SequenceModel + ?Sized,
	R: Rng + ?Sized,
{
	let columns = vocabulary.len();
	if model.input_columns() != columns {
		return Err(ChatError::Topology(format!(
			"model expects {} input columns, vocabulary has {}",
			model.input_columns(),
			columns
		)));
	}

	let seed = match seed {
		Some("") => return Err(ChatError::InvalidInput("seed cannot be empty".to_owned())),
		Some(s) => s.to_owned(),
		None => vocabulary.random_character(rng).to_string(),
	};
	let seed_indices = seed
		.chars()
		.map(|c| vocabulary.encode(c))
		.collect::<Result<Vec<usize>>>()?;

	if num_samples == 0 {
		return Ok(Vec::new());
	}

	let mut seed_input = Array3::<f32>::zeros((num_samples, seed_indices.len(), columns));
	for (t, &index) in seed_indices.iter().enumerate() {
		for s in 0..num_samples {
			seed_input[[s, t, index]] = 1.0;
		}
	}

	let mut samples = vec![seed; num_samples];

	model.clear_state();
	let output = model.rnn_time_step(seed_input.view())?;
	let mut current = last_step(output, num_samples, seed_indices.len(), columns)?;

	for _ in 0..characters_to_sample {
		let mut next_input = Array3::<f32>::zeros((num_samples, 1, columns));
		for (s, sample) in samples.iter_mut().enumerate() {
			let distribution = current.row(s).to_vec();
			let index = sample_with_rng(&distribution, rng)?;
			let c = vocabulary
				.char_at(index)
				.ok_or_else(|| ChatError::Topology(format!("sampled index {index} is outside the vocabulary")))?;

			next_input[[s, 0, index]] = 1.0;
			sample.push(c);
		}

		let output = model.rnn_time_step(next_input.view())?;
		current = last_step(output, num_samples, 1, columns)?;
	}

	Ok(samples)
}

/// Checks the output shape and keeps the distributions of the last step.
fn last_step(output: Array3<f64>, samples: usize, steps: usize, columns: usize) -> Result<Array2<f64>> {
	if output.dim() != (samples, steps, columns) {
		return Err(ChatError::Topology(format!(
			"model returned shape {:?}, expected {:?}",
			output.dim(),
			(samples, steps, columns)
		)));
	}
	Ok(output.index_axis(Axis(1), steps - 1).to_owned())
}

#[cfg(test)]
mod tests {
	use super::*;
	use ndarray::ArrayView3;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	/// Always predicts the same distribution and records what it was fed.
	struct FixedModel {
		distribution: Vec<f64>,
		fed: Vec<usize>,
		cleared: usize,
	}

	impl FixedModel {
		fn new(distribution: Vec<f64>) -> Self {
			Self { distribution, fed: Vec::new(), cleared: 0 }
		}
	}

	impl SequenceModel for FixedModel {
		fn input_columns(&self) -> usize {
			self.distribution.len()
		}

		fn clear_state(&mut self) {
			self.cleared += 1;
			self.fed.clear();
		}

		fn rnn_time_step(&mut self, input: ArrayView3<'_, f32>) -> Result<Array3<f64>> {
			let (samples, steps, columns) = input.dim();
			for t in 0..steps {
				self.fed.push((0..columns).position(|c| input[[0, t, c]] > 0.0).unwrap());
			}
			let mut output = Array3::zeros((samples, steps, columns));
			for s in 0..samples {
				for t in 0..steps {
					for (c, p) in self.distribution.iter().enumerate() {
						output[[s, t, c]] = *p;
					}
				}
			}
			Ok(output)
		}
	}

	fn abc() -> CharacterVocabulary {
		CharacterVocabulary::from_chars("ABC".chars()).unwrap()
	}

	#[test]
	fn always_a_model_repeats_the_seed_character() {
		let mut model = FixedModel::new(vec![1.0, 0.0, 0.0]);
		let mut rng = StdRng::seed_from_u64(1);
		let samples = sample_characters_from_model(Some("A"), &mut model, &abc(), &mut rng, 5, 3).unwrap();
		assert_eq!(samples, vec!["AAAAAA"; 3]);
		assert_eq!(model.cleared, 1);
		assert_eq!(model.fed, vec![0; 6]);
	}

	#[test]
	fn zero_characters_returns_the_seeds() {
		let mut model = FixedModel::new(vec![0.0, 0.0, 1.0]);
		let mut rng = StdRng::seed_from_u64(1);
		let samples = sample_characters_from_model(Some("BA"), &mut model, &abc(), &mut rng, 0, 4).unwrap();
		assert_eq!(samples, vec!["BA"; 4]);
	}

	#[test]
	fn missing_seed_uses_one_vocabulary_character() {
		let mut model = FixedModel::new(vec![0.0, 1.0, 0.0]);
		let mut rng = StdRng::seed_from_u64(9);
		let samples = sample_characters_from_model(None, &mut model, &abc(), &mut rng, 2, 2).unwrap();
		for sample in samples {
			assert_eq!(sample.chars().count(), 3);
			assert!(abc().contains(sample.chars().next().unwrap()));
			assert!(sample.ends_with("BB"));
		}
	}

	#[test]
	fn bad_seeds_are_rejected() {
		let mut model = FixedModel::new(vec![1.0, 0.0, 0.0]);
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(
			sample_characters_from_model(Some("AZ"), &mut model, &abc(), &mut rng, 1, 1),
			Err(ChatError::UnknownCharacter('Z'))
		));
		assert!(matches!(
			sample_characters_from_model(Some(""), &mut model, &abc(), &mut rng, 1, 1),
			Err(ChatError::InvalidInput(_))
		));
	}

	#[test]
	fn broken_distribution_aborts_sampling() {
		let mut model = FixedModel::new(vec![0.0, 0.0, 0.0]);
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(
			sample_characters_from_model(Some("A"), &mut model, &abc(), &mut rng, 3, 1),
			Err(ChatError::InvalidDistribution { .. })
		));
	}

	#[test]
	fn width_mismatch_is_a_topology_error() {
		let mut model = FixedModel::new(vec![0.5, 0.5]);
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(
			sample_characters_from_model(Some("A"), &mut model, &abc(), &mut rng, 1, 1),
			Err(ChatError::Topology(_))
		));
	}
}
