//! Pipeline configuration.
//!
//! Every field has a default, so an empty (or partial) TOML file is valid:
//!
//! ```toml
//! [partition]
//! encoding = "euc-kr"
//!
//! [embedding]
//! layer_size = 100
//! min_word_frequency = 5
//!
//! [classifier]
//! encoder_layer_sizes = [256, 128]
//! epochs = 10
//!
//! [sampling]
//! order = 5
//! vocabulary = "default"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Name of the folder created next to the input CSV.
pub const LABELS_DIR_NAME: &str = "labels";
/// File written inside every label folder.
pub const LABEL_FILE_NAME: &str = "data.txt";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
	pub partition: PartitionConfig,
	pub embedding: EmbeddingConfig,
	pub classifier: ClassifierConfig,
	pub sampling: SamplingConfig,
}

impl PipelineConfig {
	/// Loads a configuration from a TOML file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|e| ChatError::io(path, e))?;
		Self::from_toml(&text)
	}

	pub fn from_toml(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}
}

/// Label partitioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
	/// Folder created next to the CSV to hold one sub-folder per label.
	pub labels_dir_name: String,
	/// Encoding of the CSV as read by the partitioner.
	pub encoding: String,
}

impl Default for PartitionConfig {
	fn default() -> Self {
		Self {
			labels_dir_name: LABELS_DIR_NAME.to_owned(),
			encoding: "euc-kr".to_owned(),
		}
	}
}

/// Word2Vec settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
	/// Words seen fewer times than this are left out of the vocabulary.
	pub min_word_frequency: usize,
	/// Passes over the sentence stream.
	pub iterations: usize,
	/// Number of columns of every word vector.
	pub layer_size: usize,
	pub seed: u64,
	/// Context words taken on each side of the center word.
	pub window_size: usize,
	/// Negative samples drawn per positive pair.
	pub negative: usize,
	pub learning_rate: f32,
	pub min_learning_rate: f32,
	/// Encoding of the CSV as read by the embedding trainer.
	pub encoding: String,
}

impl Default for EmbeddingConfig {
	fn default() -> Self {
		Self {
			min_word_frequency: 5,
			iterations: 1,
			layer_size: 100,
			seed: 42,
			window_size: 5,
			negative: 5,
			learning_rate: 0.025,
			min_learning_rate: 1e-4,
			encoding: "utf-8".to_owned(),
		}
	}
}

/// Classifier topology and training loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
	/// Hidden ReLU layers between the input and the latent layer.
	pub encoder_layer_sizes: Vec<usize>,
	pub latent_size: usize,
	pub learning_rate: f32,
	/// Element-wise absolute bound applied to every gradient.
	pub gradient_clip: f32,
	/// Full passes over the dataset iterator.
	pub epochs: usize,
	pub batch_size: usize,
	pub seed: u64,
	/// Fixed label order; discovered from the label folders when absent.
	pub labels: Option<Vec<String>>,
}

impl Default for ClassifierConfig {
	fn default() -> Self {
		Self {
			encoder_layer_sizes: vec![256, 128],
			latent_size: 64,
			learning_rate: 0.05,
			gradient_clip: 1.0,
			epochs: 10,
			batch_size: 10,
			seed: 1337,
			labels: None,
		}
	}
}

/// Character model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
	/// Longest n-gram order used by the character model.
	pub order: usize,
	/// `"minimal"` or `"default"`.
	pub vocabulary: String,
	/// Encoding of the character corpora.
	pub encoding: String,
}

impl Default for SamplingConfig {
	fn default() -> Self {
		Self {
			order: 5,
			vocabulary: "default".to_owned(),
			encoding: "utf-8".to_owned(),
		}
	}
}
