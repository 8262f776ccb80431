use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the corpus, training and sampling pipelines.
#[derive(Debug, Error)]
pub enum ChatError {
	#[error("I/O error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	/// A CSV row without the `index, text, label` columns.
	#[error("Malformed record at line {line}: expected at least {expected} columns, found {found}")]
	MalformedRecord { line: u64, expected: usize, found: usize },

	#[error("Unknown text encoding: {0}")]
	UnknownEncoding(String),

	#[error("Character {0:?} is not part of the vocabulary")]
	UnknownCharacter(char),

	/// The cumulative sum of the distribution never reached the random draw.
	#[error("Distribution is invalid: draw={draw}, sum={sum}")]
	InvalidDistribution { draw: f64, sum: f64 },

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Network topology mismatch: {0}")]
	Topology(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("Configuration error: {0}")]
	Config(#[from] toml::de::Error),
}

impl ChatError {
	/// Wraps an I/O error with the path it happened on.
	pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}
}

pub type Result<T> = std::result::Result<T, ChatError>;
