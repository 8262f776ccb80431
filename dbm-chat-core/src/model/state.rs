use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};
use crate::text::vocabulary::CharacterVocabulary;

/// Represents a state in a character n-gram table.
///
/// A `State` corresponds to a fixed (n-1)-character prefix (`key`) and stores
/// all observed transitions from this prefix to the next character.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
/// - `total` is the sum of all occurrence counts
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct State {
	/// Identifier of the state (n-1 character prefix).
	key: String,
	/// Outgoing transitions indexed by the next character.
	/// Example: { 'e' => 42, 'a' => 3 }
	transitions: HashMap<char, usize>,
	total: usize,
}

impl State {
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			transitions: HashMap::new(),
			total: 0,
		}
	}

	/// Records an occurrence of a transition toward `next_char`.
	pub fn add_transition(&mut self, next_char: char) {
		*self.transitions.entry(next_char).or_insert(0) += 1;
		self.total += 1;
	}

	pub fn total(&self) -> usize {
		self.total
	}

	/// Turns the occurrence counts into a probability per vocabulary index.
	///
	/// The probability of a character is proportional to its occurrence
	/// count; characters never seen after this prefix get 0.
	pub fn distribution(&self, vocabulary: &CharacterVocabulary) -> Vec<f64> {
		let mut distribution = vec![0.0; vocabulary.len()];
		if self.total == 0 {
			return distribution;
		}

		let total = self.total as f64;
		for (next_char, occurrence) in &self.transitions {
			if let Some(i) = vocabulary.index_of(*next_char) {
				distribution[i] = *occurrence as f64 / total;
			}
		}
		distribution
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same prefix (`key`).
	/// Transition occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(ChatError::InvalidInput(format!(
				"cannot merge state {:?} into {:?}",
				other.key, self.key
			)));
		}

		for (next_char, occurrence) in &other.transitions {
			*self.transitions.entry(*next_char).or_insert(0) += *occurrence;
		}
		self.total += other.total;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn distribution_is_proportional_to_counts() {
		let vocab = CharacterVocabulary::from_chars("abc".chars()).unwrap();
		let mut state = State::new("x");
		state.add_transition('a');
		state.add_transition('c');
		state.add_transition('c');
		state.add_transition('c');

		let distribution = state.distribution(&vocab);
		assert_eq!(distribution, vec![0.25, 0.0, 0.75]);
	}

	#[test]
	fn merge_sums_counts_and_checks_keys() {
		let mut left = State::new("ab");
		left.add_transition('c');
		let mut right = State::new("ab");
		right.add_transition('c');
		right.add_transition('d');

		left.merge(&right).unwrap();
		assert_eq!(left.total(), 3);
		assert_eq!(left.transitions[&'c'], 2);

		assert!(left.merge(&State::new("zz")).is_err());
	}
}
