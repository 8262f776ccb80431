use std::path::Path;

use crate::error::Result;
use crate::io::read_encoded;
use crate::text::vocabulary::CharacterVocabulary;

/// Text prepared for a character model: every line holds only
/// vocabulary characters.
#[derive(Debug, Clone)]
pub struct CharacterCorpus {
	lines: Vec<String>,
	removed: usize,
}

impl CharacterCorpus {
	/// Reads `path` with `encoding` and filters it against `vocabulary`.
	pub fn from_file<P: AsRef<Path>>(path: P, encoding: &str, vocabulary: &CharacterVocabulary) -> Result<Self> {
		let path = path.as_ref();
		let corpus = Self::from_text(&read_encoded(path, encoding)?, vocabulary);
		log::info!(
			"Loaded {} lines from {} ({} characters removed)",
			corpus.lines.len(),
			path.display(),
			corpus.removed
		);
		Ok(corpus)
	}

	/// Filters `text` against `vocabulary`, line by line.
	///
	/// Lines left empty after filtering are dropped.
	pub fn from_text(text: &str, vocabulary: &CharacterVocabulary) -> Self {
		let mut removed = 0;
		let lines = text
			.lines()
			.filter_map(|line| {
				let kept = vocabulary.filter(line);
				removed += line.chars().count() - kept.chars().count();
				(!kept.is_empty()).then_some(kept)
			})
			.collect();
		Self { lines, removed }
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	/// Characters dropped because they were not in the vocabulary.
	pub fn removed(&self) -> usize {
		self.removed
	}
}
