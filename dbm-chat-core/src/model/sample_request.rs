use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{ChatError, Result};
use crate::model::sampler::sample_characters_from_model;
use crate::model::sequence::SequenceModel;
use crate::text::vocabulary::CharacterVocabulary;

/// Upper bound on the characters generated per sample.
pub const MAX_CHARACTERS: usize = 10_000;
/// Upper bound on the sample slots generated per request.
pub const MAX_SAMPLES: usize = 256;

/// Strategy used to select the seed the model is primed with.
///
/// # Variants
/// - `Random`: one random vocabulary character.
/// - `Custom(String)`: the provided text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartSeed {
	#[default]
	Random,
	Custom(String),
}

impl StartSeed {
	/// Parses `"random"` or `"custom:<text>"` (prefix case-insensitive).
	pub fn parse(value: &str) -> Result<Self> {
		if value.eq_ignore_ascii_case("random") {
			return Ok(Self::Random);
		}
		let prefix = "custom:";
		if value.get(..prefix.len()).is_some_and(|p| p.eq_ignore_ascii_case(prefix)) {
			let seed = &value[prefix.len()..];
			if seed.is_empty() {
				return Err(ChatError::InvalidInput("custom seed cannot be empty".to_owned()));
			}
			return Ok(Self::Custom(seed.to_owned()));
		}
		Err(ChatError::InvalidInput(
			"seed must be 'random' or start with 'custom:'".to_owned(),
		))
	}
}

/// Parameters of one sampling run.
///
/// # Invariants
/// - `characters <= MAX_CHARACTERS`
/// - `samples <= MAX_SAMPLES`
#[derive(Debug, Clone)]
pub struct SampleRequest {
	/// How the model is primed.
	pub start_seed: StartSeed,

	characters: usize,
	samples: usize,

	/// Fixed RNG seed for reproducible output; fresh entropy when `None`.
	pub rng_seed: Option<u64>,
}

impl Default for SampleRequest {
	fn default() -> Self {
		Self {
			start_seed: StartSeed::Random,
			characters: 100,
			samples: 1,
			rng_seed: None,
		}
	}
}

impl SampleRequest {
	pub fn characters(&self) -> usize {
		self.characters
	}

	pub fn samples(&self) -> usize {
		self.samples
	}

	/// Sets the number of characters sampled after the seed.
	///
	/// # Errors
	/// Returns an error above `MAX_CHARACTERS`.
	pub fn set_characters(&mut self, characters: usize) -> Result<()> {
		if characters > MAX_CHARACTERS {
			return Err(ChatError::InvalidInput(format!(
				"characters must be at most {MAX_CHARACTERS}"
			)));
		}
		self.characters = characters;
		Ok(())
	}

	/// Sets the number of strings generated.
	///
	/// # Errors
	/// Returns an error above `MAX_SAMPLES`.
	pub fn set_samples(&mut self, samples: usize) -> Result<()> {
		if samples > MAX_SAMPLES {
			return Err(ChatError::InvalidInput(format!("samples must be at most {MAX_SAMPLES}")));
		}
		self.samples = samples;
		Ok(())
	}

	/// Runs the request against `model`.
	pub fn run<M: SequenceModel + ?Sized>(&self, model: &mut M, vocabulary: &CharacterVocabulary) -> Result<Vec<String>> {
		let mut rng = match self.rng_seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_rng(&mut rand::rng()),
		};
		let seed = match &self.start_seed {
			StartSeed::Random => None,
			StartSeed::Custom(s) => Some(s.as_str()),
		};

		sample_characters_from_model(seed, model, vocabulary, &mut rng, self.characters, self.samples)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::char_model::CharNGramModel;

	#[test]
	fn seeds_are_parsed() {
		assert_eq!(StartSeed::parse("random").unwrap(), StartSeed::Random);
		assert_eq!(StartSeed::parse("Custom:Hello").unwrap(), StartSeed::Custom("Hello".into()));
		assert!(StartSeed::parse("custom:").is_err());
		assert!(StartSeed::parse("whatever").is_err());
	}

	#[test]
	fn limits_are_enforced() {
		let mut request = SampleRequest::default();
		assert!(request.set_characters(MAX_CHARACTERS + 1).is_err());
		assert!(request.set_samples(MAX_SAMPLES + 1).is_err());
		request.set_characters(3).unwrap();
		request.set_samples(2).unwrap();
		assert_eq!((request.characters(), request.samples()), (3, 2));
	}

	#[test]
	fn fixed_rng_seed_is_reproducible() {
		let vocab = CharacterVocabulary::minimal();
		let mut model = CharNGramModel::new(vocab.clone(), 3).unwrap();
		model.train(&["the quick brown fox jumps over the lazy dog".to_owned()]).unwrap();

		let mut request = SampleRequest {
			start_seed: StartSeed::Custom("th".into()),
			rng_seed: Some(11),
			..SampleRequest::default()
		};
		request.set_characters(20).unwrap();
		request.set_samples(3).unwrap();

		let first = request.run(&mut model, &vocab).unwrap();
		let second = request.run(&mut model, &vocab).unwrap();
		assert_eq!(first, second);
		assert!(first.iter().all(|s| s.starts_with("th") && s.chars().count() == 22));
	}
}
