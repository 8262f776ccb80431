use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{ChatError, Result};
use crate::text::tokenizer::DefaultTokenizer;

/// Dense vectors for every word kept in the embedding vocabulary.
///
/// # Invariants
/// - `vectors` has one row per entry of `words` and `layer_size` columns
/// - `index` is the exact inverse of `words`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WordVectors {
	words: Vec<String>,
	index: HashMap<String, usize>,
	vectors: Array2<f32>,
}

impl WordVectors {
	fn new(words: Vec<String>, vectors: Array2<f32>) -> Self {
		let index = words.iter().enumerate().map(|(i, w)| (w.clone(), i)).collect();
		Self { words, index, vectors }
	}

	/// Number of columns of every vector.
	pub fn layer_size(&self) -> usize {
		self.vectors.ncols()
	}

	pub fn vocab_size(&self) -> usize {
		self.words.len()
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}

	pub fn has_word(&self, word: &str) -> bool {
		self.index.contains_key(word)
	}

	pub fn vector(&self, word: &str) -> Option<ArrayView1<'_, f32>> {
		self.index.get(word).map(|&i| self.vectors.row(i))
	}

	/// Average of the vectors of the known `tokens`; zeros when none is known.
	pub fn mean_vector<S: AsRef<str>>(&self, tokens: &[S]) -> Array1<f32> {
		let mut sum = Array1::<f32>::zeros(self.layer_size());
		let mut known = 0;
		for token in tokens {
			if let Some(vector) = self.vector(token.as_ref()) {
				sum += &vector;
				known += 1;
			}
		}
		if known > 0 {
			sum /= known as f32;
		}
		sum
	}

	/// Cosine similarity of two known words.
	pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
		let (a, b) = (self.vector(a)?, self.vector(b)?);
		let norm = a.dot(&a).sqrt() * b.dot(&b).sqrt();
		(norm > 0.0).then(|| a.dot(&b) / norm)
	}
}

/// Skip-gram Word2Vec trained with negative sampling.
///
/// Training is single threaded and fully determined by `config.seed`.
#[derive(Debug, Clone)]
pub struct Word2Vec {
	config: EmbeddingConfig,
	tokenizer: DefaultTokenizer,
}

impl Word2Vec {
	pub fn new(config: EmbeddingConfig) -> Self {
		Self { config, tokenizer: DefaultTokenizer::common() }
	}

	/// Learns vectors from a stream of raw sentences.
	///
	/// # Behavior
	/// - Tokenizes every sentence with the common pre-processor.
	/// - Keeps words seen at least `min_word_frequency` times, most frequent
	///   first (ties broken alphabetically).
	/// - Runs `iterations` passes, the learning rate decaying linearly from
	///   `learning_rate` to `min_learning_rate`.
	///
	/// # Errors
	/// Returns an error for a zero `layer_size` or `window_size`.
	pub fn fit<S: AsRef<str>>(&self, sentences: &[S]) -> Result<WordVectors> {
		let config = &self.config;
		if config.layer_size == 0 || config.window_size == 0 {
			return Err(ChatError::InvalidInput(
				"layer_size and window_size must be positive".to_owned(),
			));
		}

		let tokenized: Vec<Vec<String>> = sentences
			.iter()
			.map(|s| self.tokenizer.tokenize(s.as_ref()))
			.collect();

		let (words, counts) = self.build_vocabulary(&tokenized);
		log::info!(
			"Word2Vec vocabulary: {} words (min frequency {})",
			words.len(),
			config.min_word_frequency
		);

		let layer_size = config.layer_size;
		if words.is_empty() {
			log::warn!("No word reaches the minimum frequency; all sentence vectors will be zero");
			return Ok(WordVectors::new(words, Array2::zeros((0, layer_size))));
		}

		let index: HashMap<&str, usize> = words.iter().enumerate().map(|(i, w)| (w.as_str(), i)).collect();
		let encoded: Vec<Vec<usize>> = tokenized
			.iter()
			.map(|tokens| tokens.iter().filter_map(|t| index.get(t.as_str()).copied()).collect())
			.collect();

		let mut rng = StdRng::seed_from_u64(config.seed);
		let bound = 0.5 / layer_size as f32;
		let mut syn0 = Array2::from_shape_fn((words.len(), layer_size), |_| rng.random_range(-bound..bound));
		let mut syn1neg = Array2::<f32>::zeros((words.len(), layer_size));

		let noise = WeightedIndex::new(counts.iter().map(|&c| (c as f64).powf(0.75)))
			.map_err(|e| ChatError::InvalidInput(format!("noise distribution: {e}")))?;

		let total = encoded.iter().map(Vec::len).sum::<usize>() * config.iterations;
		let mut processed = 0usize;

		for iteration in 0..config.iterations {
			for sentence in &encoded {
				for (i, &center) in sentence.iter().enumerate() {
					let progress = processed as f32 / (total + 1) as f32;
					let alpha = (config.learning_rate * (1.0 - progress)).max(config.min_learning_rate);
					processed += 1;

					let reduced = rng.random_range(0..config.window_size);
					let span = config.window_size - reduced;
					let start = i.saturating_sub(span);
					let end = (i + span).min(sentence.len() - 1);

					for (j, &context) in sentence.iter().enumerate().take(end + 1).skip(start) {
						if j == i {
							continue;
						}
						self.train_pair(&mut syn0, &mut syn1neg, center, context, alpha, &noise, &mut rng);
					}
				}
			}
			log::debug!("Word2Vec iteration {} done", iteration + 1);
		}

		Ok(WordVectors::new(words, syn0))
	}

	/// Counts tokens and returns the kept words with their counts.
	fn build_vocabulary(&self, tokenized: &[Vec<String>]) -> (Vec<String>, Vec<usize>) {
		let mut counts: HashMap<&str, usize> = HashMap::new();
		for token in tokenized.iter().flatten() {
			*counts.entry(token.as_str()).or_insert(0) += 1;
		}

		let mut kept: Vec<(&str, usize)> = counts
			.into_iter()
			.filter(|(_, count)| *count >= self.config.min_word_frequency)
			.collect();
		kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

		kept.into_iter().map(|(w, c)| (w.to_owned(), c)).unzip()
	}

	/// One skip-gram update: `context` predicts `center` against
	/// `negative` noise words.
	#[allow(clippy::too_many_arguments)]
	fn train_pair(
		&self,
		syn0: &mut Array2<f32>,
		syn1neg: &mut Array2<f32>,
		center: usize,
		context: usize,
		alpha: f32,
		noise: &WeightedIndex<f64>,
		rng: &mut StdRng,
	) {
		let input = syn0.row(context).to_owned();
		let mut error = Array1::<f32>::zeros(input.len());

		for d in 0..=self.config.negative {
			let (target, label) = if d == 0 {
				(center, 1.0)
			} else {
				let target = noise.sample(rng);
				if target == center {
					continue;
				}
				(target, 0.0)
			};

			let f = input.dot(&syn1neg.row(target));
			let g = (label - sigmoid(f)) * alpha;
			error.scaled_add(g, &syn1neg.row(target));
			syn1neg.row_mut(target).scaled_add(g, &input);
		}

		syn0.row_mut(context).scaled_add(1.0, &error);
	}
}

fn sigmoid(x: f32) -> f32 {
	1.0 / (1.0 + (-x.clamp(-6.0, 6.0)).exp())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(min_word_frequency: usize) -> EmbeddingConfig {
		EmbeddingConfig {
			min_word_frequency,
			layer_size: 8,
			iterations: 3,
			..EmbeddingConfig::default()
		}
	}

	fn corpus() -> Vec<String> {
		let mut sentences = Vec::new();
		for _ in 0..20 {
			sentences.push("the cat sat on the mat".to_owned());
			sentences.push("the dog sat on the rug".to_owned());
		}
		sentences.push("rare words appear once".to_owned());
		sentences
	}

	#[test]
	fn rare_words_are_dropped() {
		let vectors = Word2Vec::new(config(5)).fit(&corpus()).unwrap();
		assert!(vectors.has_word("cat"));
		assert!(!vectors.has_word("rare"));
		assert_eq!(vectors.words()[0], "the");
		assert_eq!(vectors.layer_size(), 8);
	}

	#[test]
	fn same_seed_gives_same_vectors() {
		let first = Word2Vec::new(config(1)).fit(&corpus()).unwrap();
		let second = Word2Vec::new(config(1)).fit(&corpus()).unwrap();
		assert_eq!(first.vector("dog"), second.vector("dog"));
	}

	#[test]
	fn mean_vector_ignores_unknown_tokens() {
		let vectors = Word2Vec::new(config(5)).fit(&corpus()).unwrap();
		let cat = vectors.vector("cat").unwrap().to_owned();
		assert_eq!(vectors.mean_vector(&["cat", "unknown"]), cat);
		assert_eq!(vectors.mean_vector(&["unknown"]), Array1::<f32>::zeros(8));
	}

	#[test]
	fn empty_vocabulary_still_has_columns() {
		let vectors = Word2Vec::new(config(1000)).fit(&corpus()).unwrap();
		assert_eq!(vectors.vocab_size(), 0);
		assert_eq!(vectors.mean_vector(&["cat"]).len(), 8);
	}

	#[test]
	fn similarity_is_cosine_of_known_words() {
		let vectors = Word2Vec::new(config(5)).fit(&corpus()).unwrap();
		let same = vectors.similarity("cat", "cat").unwrap();
		assert!((same - 1.0).abs() < 1e-5);

		let other = vectors.similarity("cat", "dog").unwrap();
		assert!(other.abs() <= 1.0 + 1e-5);
		assert_eq!(vectors.similarity("cat", "rare"), None);
	}
}
