use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::{ChatError, Result};

/// Transition counts for one n-gram order.
///
/// Stores one [`State`] per observed prefix of length `n-1`. Order 1 has a
/// single state with the empty prefix, i.e. plain character frequencies.
///
/// # Invariants
/// - `n` is always >= 1
/// - Each state in `states` corresponds to a unique prefix of length `n-1`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NGramTable {
	n: usize,
	states: HashMap<String, State>,
}

impl NGramTable {
	/// Creates a new table of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize) -> Result<Self> {
		if n < 1 {
			return Err(ChatError::InvalidInput("n-gram order must be >= 1".to_owned()));
		}
		Ok(Self { n, states: HashMap::new() })
	}

	/// Counts every `(prefix, next)` window of `chars`.
	///
	/// Sequences shorter than `n` contribute nothing.
	pub fn add_sequence(&mut self, chars: &[char]) {
		if chars.len() < self.n {
			return;
		}

		let context = self.n - 1;
		for i in context..chars.len() {
			let prefix: String = chars[i - context..i].iter().collect();
			self.states
				.entry(prefix)
				.or_insert_with_key(|key| State::new(key))
				.add_transition(chars[i]);
		}
	}

	/// Looks up the state following the last `n-1` characters of `context`.
	///
	/// Returns `None` when the context is too short or the prefix was never
	/// observed.
	pub fn state_after(&self, context: &[char]) -> Option<&State> {
		let needed = self.n - 1;
		if context.len() < needed {
			return None;
		}
		let prefix: String = context[context.len() - needed..].iter().collect();
		self.states.get(&prefix).filter(|state| state.total() > 0)
	}

	/// Merges another table of the same order into this one.
	///
	/// # Errors
	/// Returns an error if the orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(ChatError::InvalidInput(format!(
				"n-gram order mismatch: {} vs {}",
				self.n, other.n
			)));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bigram_windows_are_counted() {
		let mut table = NGramTable::new(2).unwrap();
		table.add_sequence(&['a', 'b', 'a', 'b']);

		assert_eq!(table.state_after(&['a']).map(State::total), Some(2));
		assert_eq!(table.state_after(&['x', 'b']).map(State::total), Some(1));
		assert!(table.state_after(&['c']).is_none());
		assert!(table.state_after(&[]).is_none());
	}

	#[test]
	fn unigram_uses_the_empty_prefix() {
		let mut table = NGramTable::new(1).unwrap();
		table.add_sequence(&['a', 'b', 'c']);
		assert_eq!(table.state_after(&[]).map(State::total), Some(3));
	}

	#[test]
	fn order_zero_and_mismatched_merge_fail() {
		assert!(NGramTable::new(0).is_err());
		let mut two = NGramTable::new(2).unwrap();
		assert!(two.merge(&NGramTable::new(3).unwrap()).is_err());
	}
}
