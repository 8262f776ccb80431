use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use super::ngram_model::NGramTable;
use super::sequence::SequenceModel;
use crate::error::{ChatError, Result};
use crate::io::{build_output_path, get_filename};
use crate::text::char_corpus::CharacterCorpus;
use crate::text::vocabulary::CharacterVocabulary;

/// Character model built from n-gram counts of every order up to `order`.
///
/// This struct manages:
/// - `ngrams`: a map from n-gram order to its transition table
/// - `vocabulary`: the characters the model reads and predicts
/// - `sources`: names of the corpora merged into this model
/// - `contexts`: the recurrent state, i.e. the last `order - 1` characters
///   fed to each sample slot (never serialized)
///
/// Prediction backs off from the longest order to shorter ones until a
/// prefix with observations is found. An untrained model predicts the
/// uniform distribution.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CharNGramModel {
	vocabulary: CharacterVocabulary,
	order: usize,
	ngrams: HashMap<usize, NGramTable>,
	#[serde(default)]
	sources: Vec<String>,
	#[serde(skip)]
	contexts: Vec<Vec<char>>,
}

impl CharNGramModel {
	/// Creates an empty model.
	///
	/// # Errors
	/// Returns an error if `order < 1`.
	pub fn new(vocabulary: CharacterVocabulary, order: usize) -> Result<Self> {
		let mut ngrams = HashMap::new();
		for n in 1..=order {
			ngrams.insert(n, NGramTable::new(n)?);
		}
		if ngrams.is_empty() {
			return Err(ChatError::InvalidInput("model order must be >= 1".to_owned()));
		}

		Ok(Self {
			vocabulary,
			order,
			ngrams,
			sources: Vec::new(),
			contexts: Vec::new(),
		})
	}

	/// Loads the model cached next to `corpus_path` if it matches the
	/// requested vocabulary and order, otherwise trains it from the corpus
	/// and writes the cache.
	///
	/// - `data/chat.txt` is cached as `data/chat.bin`
	/// - Uses `postcard` for compact serialization/deserialization.
	pub fn load_or_train<P: AsRef<Path>>(
		corpus_path: P,
		encoding: &str,
		vocabulary: &CharacterVocabulary,
		order: usize,
	) -> Result<Self> {
		let corpus_path = corpus_path.as_ref();
		let binary_path = build_output_path(corpus_path, "bin")?;

		let cached = if binary_path.exists() {
			let cached = Self::load(&binary_path)?;
			if cached.order == order && &cached.vocabulary == vocabulary {
				log::info!("Loaded cached model {}", binary_path.display());
				Some(cached)
			} else {
				log::info!("Cached model {} does not match the requested settings", binary_path.display());
				None
			}
		} else {
			None
		};

		let mut model = match cached {
			Some(model) => model,
			None => {
				let corpus = CharacterCorpus::from_file(corpus_path, encoding, vocabulary)?;
				let mut model = Self::new(vocabulary.clone(), order)?;
				model.train(corpus.lines())?;
				model.save(&binary_path)?;
				model
			}
		};

		model.sources = vec![get_filename(corpus_path)?];
		Ok(model)
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = std::fs::read(path).map_err(|e| ChatError::io(path, e))?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes).map_err(|e| ChatError::io(path, e))
	}

	/// Splits the lines into chunks, counts each chunk on its own thread,
	/// and merges the partial models into this one.
	///
	/// # Notes
	/// - Chunk count is based on CPU cores * factor.
	/// - Uses MPSC channels to collect partial models from threads.
	pub fn train(&mut self, lines: &[String]) -> Result<()> {
		if lines.is_empty() {
			return Ok(());
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let mut partial_model = Self::new(self.vocabulary.clone(), self.order)?;

			thread::spawn(move || {
				for sentence in &chunk {
					partial_model.add_sentence(sentence);
				}
				// The receiver outlives every sender.
				let _ = tx.send(partial_model);
			});
		}
		drop(tx);

		let mut merged = 0;
		for partial_model in rx.iter() {
			self.merge(&partial_model)?;
			merged += 1;
		}
		log::debug!("Merged {merged} partial models from {} lines", lines.len());

		Ok(())
	}

	/// Adds one line of text to every order.
	///
	/// Characters outside the vocabulary are dropped, and the line is
	/// terminated by `\n` when the vocabulary has it.
	pub fn add_sentence(&mut self, sentence: &str) {
		let mut chars: Vec<char> = sentence.chars().filter(|c| self.vocabulary.contains(*c)).collect();
		if self.vocabulary.contains('\n') {
			chars.push('\n');
		}

		for table in self.ngrams.values_mut() {
			table.add_sequence(&chars);
		}
	}

	/// Predicts the next-character distribution after `context`.
	///
	/// Tries orders from `order` down to 1 and uses the first one whose
	/// prefix was observed.
	pub fn distribution_after(&self, context: &[char]) -> Vec<f64> {
		for n in (1..=self.order).rev() {
			if let Some(state) = self.ngrams.get(&n).and_then(|t| t.state_after(context)) {
				return state.distribution(&self.vocabulary);
			}
		}

		let uniform = 1.0 / self.vocabulary.len() as f64;
		vec![uniform; self.vocabulary.len()]
	}

	/// Merges another model into this one.
	///
	/// # Errors
	/// Returns an error if the orders or vocabularies differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.order != other.order || self.vocabulary != other.vocabulary {
			return Err(ChatError::InvalidInput(
				"cannot merge character models with different order or vocabulary".to_owned(),
			));
		}

		for (n, table) in &other.ngrams {
			if let Some(existing) = self.ngrams.get_mut(n) {
				existing.merge(table)?;
			} else {
				self.ngrams.insert(*n, table.clone());
			}
		}
		self.sources.extend(other.sources.iter().cloned());

		Ok(())
	}

	pub fn vocabulary(&self) -> &CharacterVocabulary {
		&self.vocabulary
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Names of the corpora this model was built from.
	pub fn sources(&self) -> &[String] {
		&self.sources
	}
}

impl SequenceModel for CharNGramModel {
	fn input_columns(&self) -> usize {
		self.vocabulary.len()
	}

	fn clear_state(&mut self) {
		self.contexts.clear();
	}

	fn rnn_time_step(&mut self, input: ArrayView3<'_, f32>) -> Result<Array3<f64>> {
		let (samples, steps, columns) = input.dim();
		if columns != self.vocabulary.len() {
			return Err(ChatError::Topology(format!(
				"input has {columns} columns, vocabulary has {}",
				self.vocabulary.len()
			)));
		}
		if self.contexts.is_empty() {
			self.contexts = vec![Vec::new(); samples];
		} else if self.contexts.len() != samples {
			return Err(ChatError::Topology(format!(
				"state holds {} samples, input has {samples}",
				self.contexts.len()
			)));
		}

		let keep = self.order - 1;
		let mut output = Array3::<f64>::zeros((samples, steps, columns));
		for s in 0..samples {
			for t in 0..steps {
				let index = (0..columns)
					.find(|&c| input[[s, t, c]] > 0.0)
					.ok_or_else(|| ChatError::InvalidInput(format!("empty one-hot row at sample {s}, step {t}")))?;
				let c = self
					.vocabulary
					.char_at(index)
					.ok_or_else(|| ChatError::InvalidInput(format!("index {index} is outside the vocabulary")))?;

				let context = &mut self.contexts[s];
				context.push(c);
				if context.len() > keep {
					let excess = context.len() - keep;
					context.drain(..excess);
				}

				let distribution = self.distribution_after(&self.contexts[s]);
				for (column, p) in distribution.into_iter().enumerate() {
					output[[s, t, column]] = p;
				}
			}
		}

		Ok(output)
	}
}
