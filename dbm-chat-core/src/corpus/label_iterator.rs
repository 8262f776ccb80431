use std::path::Path;

use crate::config::LABEL_FILE_NAME;
use crate::error::Result;
use crate::io::{list_dirs, read_file};

/// A sentence together with the label of the folder it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledSentence {
	pub label: String,
	pub text: String,
}

/// Walks a label corpus (`<labels>/<label>/data.txt`) sentence by sentence.
///
/// Label folders are visited in name order and blank lines are skipped.
/// The iterator can be rewound with [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct LabelAwareSentenceIterator {
	labels: Vec<String>,
	sentences: Vec<LabelledSentence>,
	position: usize,
}

impl LabelAwareSentenceIterator {
	pub fn from_dir<P: AsRef<Path>>(labels_dir: P) -> Result<Self> {
		let labels_dir = labels_dir.as_ref();
		let mut labels = Vec::new();
		let mut sentences = Vec::new();

		for label in list_dirs(labels_dir)? {
			let file = labels_dir.join(&label).join(LABEL_FILE_NAME);
			if !file.is_file() {
				log::warn!("Label folder {label:?} has no {LABEL_FILE_NAME}, skipped");
				continue;
			}

			sentences.extend(
				read_file(&file)?
					.into_iter()
					.filter(|line| !line.trim().is_empty())
					.map(|text| LabelledSentence { label: label.clone(), text }),
			);
			labels.push(label);
		}

		Ok(Self { labels, sentences, position: 0 })
	}

	/// Labels found on disk, in visiting order.
	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	pub fn len(&self) -> usize {
		self.sentences.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sentences.is_empty()
	}

	pub fn reset(&mut self) {
		self.position = 0;
	}
}

impl Iterator for LabelAwareSentenceIterator {
	type Item = LabelledSentence;

	fn next(&mut self) -> Option<Self::Item> {
		let sentence = self.sentences.get(self.position)?.clone();
		self.position += 1;
		Some(sentence)
	}
}
