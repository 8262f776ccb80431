use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Letters, digits, common punctuation and whitespace.
fn minimal_chars() -> Vec<char> {
	let mut chars: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
	chars.extend(['!', '&', '(', ')', '?', '-', '\'', '"', ',', '.', ':', ';', ' ', '\n', '\t']);
	chars
}

/// The minimal set plus symbols found in informal chat.
fn default_chars() -> Vec<char> {
	let mut chars = minimal_chars();
	chars.extend(['@', '#', '$', '%', '^', '*', '{', '}', '[', ']', '/', '+', '_', '\\', '|', '<', '>']);
	chars
}

/// Fixed, ordered set of characters a character model reads and writes.
///
/// Provides the bijection character ↔ index used for one-hot encoding.
///
/// # Invariants
/// - No character appears twice
/// - `index` is the exact inverse of `chars`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterVocabulary {
	chars: Vec<char>,
	index: HashMap<char, usize>,
}

impl CharacterVocabulary {
	/// Builds a vocabulary from an ordered list of characters.
	///
	/// # Errors
	/// Returns an error if the list is empty or contains duplicates.
	pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Result<Self> {
		let chars: Vec<char> = chars.into_iter().collect();
		if chars.is_empty() {
			return Err(ChatError::InvalidInput("vocabulary cannot be empty".to_owned()));
		}

		let mut index = HashMap::with_capacity(chars.len());
		for (i, c) in chars.iter().enumerate() {
			if index.insert(*c, i).is_some() {
				return Err(ChatError::InvalidInput(format!("duplicate vocabulary character {c:?}")));
			}
		}
		Ok(Self { chars, index })
	}

	pub fn minimal() -> Self {
		Self::from_known(minimal_chars())
	}

	pub fn default_set() -> Self {
		Self::from_known(default_chars())
	}

	/// Resolves `"minimal"` or `"default"`.
	pub fn from_name(name: &str) -> Result<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"minimal" => Ok(Self::minimal()),
			"default" => Ok(Self::default_set()),
			other => Err(ChatError::InvalidInput(format!("unknown vocabulary {other:?}"))),
		}
	}

	// Built-in sets are duplicate free.
	fn from_known(chars: Vec<char>) -> Self {
		let index = chars.iter().enumerate().map(|(i, c)| (*c, i)).collect();
		Self { chars, index }
	}

	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	pub fn contains(&self, c: char) -> bool {
		self.index.contains_key(&c)
	}

	pub fn index_of(&self, c: char) -> Option<usize> {
		self.index.get(&c).copied()
	}

	pub fn char_at(&self, index: usize) -> Option<char> {
		self.chars.get(index).copied()
	}

	/// Like [`index_of`](Self::index_of) but rejects unknown characters.
	pub fn encode(&self, c: char) -> Result<usize> {
		self.index_of(c).ok_or(ChatError::UnknownCharacter(c))
	}

	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	/// Drops every character that is not part of the vocabulary.
	pub fn filter(&self, text: &str) -> String {
		text.chars().filter(|c| self.contains(*c)).collect()
	}

	/// Picks one character uniformly at random.
	pub fn random_character<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
		self.chars[rng.random_range(0..self.chars.len())]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn stock_sets_have_expected_sizes() {
		assert_eq!(CharacterVocabulary::minimal().len(), 26 * 2 + 10 + 15);
		assert_eq!(CharacterVocabulary::default_set().len(), 26 * 2 + 10 + 15 + 17);
	}

	#[test]
	fn index_and_char_are_inverse() {
		let vocab = CharacterVocabulary::default_set();
		for (i, c) in vocab.chars().iter().enumerate() {
			assert_eq!(vocab.index_of(*c), Some(i));
			assert_eq!(vocab.char_at(i), Some(*c));
		}
	}

	#[test]
	fn duplicates_and_empty_are_rejected() {
		assert!(CharacterVocabulary::from_chars("abca".chars()).is_err());
		assert!(CharacterVocabulary::from_chars(std::iter::empty()).is_err());
	}

	#[test]
	fn filter_and_encode_follow_membership() {
		let vocab = CharacterVocabulary::from_chars("ABC".chars()).unwrap();
		assert_eq!(vocab.filter("AxBy C"), "ABC");
		assert_eq!(vocab.encode('C').unwrap(), 2);
		assert!(matches!(vocab.encode('z'), Err(ChatError::UnknownCharacter('z'))));
	}

	#[test]
	fn random_character_is_in_vocabulary() {
		let vocab = CharacterVocabulary::minimal();
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..100 {
			assert!(vocab.contains(vocab.random_character(&mut rng)));
		}
	}
}
