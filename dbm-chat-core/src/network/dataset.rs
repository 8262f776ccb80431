use ndarray::Array2;

use crate::corpus::label_iterator::LabelAwareSentenceIterator;
use crate::error::{ChatError, Result};
use crate::network::embedding::WordVectors;
use crate::text::tokenizer::DefaultTokenizer;

/// A mini-batch: one feature row and one one-hot label row per example.
#[derive(Debug, Clone)]
pub struct DataSet {
	pub features: Array2<f32>,
	pub labels: Array2<f32>,
}

impl DataSet {
	pub fn num_examples(&self) -> usize {
		self.features.nrows()
	}
}

/// Turns labelled sentences into embedded mini-batches.
///
/// A sentence is represented by the mean vector of its known words; its
/// label becomes a one-hot row over `labels`. Sentences whose label is not
/// in `labels` are skipped.
pub struct EmbeddingDataSetIterator<'a> {
	vectors: &'a WordVectors,
	tokenizer: DefaultTokenizer,
	sentences: LabelAwareSentenceIterator,
	labels: Vec<String>,
	batch_size: usize,
}

impl<'a> EmbeddingDataSetIterator<'a> {
	/// # Errors
	/// Returns an error for an empty label list or a zero batch size.
	pub fn new(
		vectors: &'a WordVectors,
		sentences: LabelAwareSentenceIterator,
		labels: Vec<String>,
		batch_size: usize,
	) -> Result<Self> {
		if labels.is_empty() {
			return Err(ChatError::InvalidInput("no label to train on".to_owned()));
		}
		if batch_size == 0 {
			return Err(ChatError::InvalidInput("batch size must be positive".to_owned()));
		}
		Ok(Self {
			vectors,
			tokenizer: DefaultTokenizer::common(),
			sentences,
			labels,
			batch_size,
		})
	}

	/// Width of a feature row (the embedding layer size).
	pub fn input_columns(&self) -> usize {
		self.vectors.layer_size()
	}

	/// Width of a label row (the number of labels).
	pub fn total_outcomes(&self) -> usize {
		self.labels.len()
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	/// Rewinds to the first sentence.
	pub fn reset(&mut self) {
		self.sentences.reset();
	}
}

impl Iterator for EmbeddingDataSetIterator<'_> {
	type Item = DataSet;

	fn next(&mut self) -> Option<DataSet> {
		let mut rows = Vec::with_capacity(self.batch_size);

		while rows.len() < self.batch_size {
			let Some(sentence) = self.sentences.next() else {
				break;
			};
			match self.labels.iter().position(|l| *l == sentence.label) {
				Some(label) => rows.push((self.tokenizer.tokenize(&sentence.text), label)),
				None => log::debug!("Skipping sentence with unlisted label {:?}", sentence.label),
			}
		}

		// The last batch of a pass may be partial.
		(!rows.is_empty()).then(|| self.batch(rows))
	}
}

impl EmbeddingDataSetIterator<'_> {
	fn batch(&self, rows: Vec<(Vec<String>, usize)>) -> DataSet {
		let mut features = Array2::zeros((rows.len(), self.input_columns()));
		let mut labels = Array2::zeros((rows.len(), self.total_outcomes()));

		for (i, (tokens, label)) in rows.iter().enumerate() {
			features.row_mut(i).assign(&self.vectors.mean_vector(tokens));
			labels[[i, *label]] = 1.0;
		}

		DataSet { features, labels }
	}
}
