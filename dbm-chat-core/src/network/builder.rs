use std::path::Path;

use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::corpus::label_iterator::LabelAwareSentenceIterator;
use crate::corpus::partitioner::LabelPartitioner;
use crate::corpus::record::read_labeled_records;
use crate::error::{ChatError, Result};
use crate::network::classifier::Classifier;
use crate::network::dataset::EmbeddingDataSetIterator;
use crate::network::embedding::{Word2Vec, WordVectors};
use crate::text::tokenizer::DefaultTokenizer;

/// Best label for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
	pub label: String,
	pub probability: f32,
}

/// Everything needed to classify new text: embeddings, classifier weights
/// and the label order used during training.
///
/// # Invariants
/// - `classifier.input_size() == word_vectors.layer_size()`
/// - `classifier.output_size() == answer_count >= labels.len()`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrainedNetwork {
	word_vectors: WordVectors,
	classifier: Classifier,
	labels: Vec<String>,
	answer_count: usize,
}

impl TrainedNetwork {
	pub fn word_vectors(&self) -> &WordVectors {
		&self.word_vectors
	}

	pub fn classifier(&self) -> &Classifier {
		&self.classifier
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	pub fn answer_count(&self) -> usize {
		self.answer_count
	}

	pub fn input_columns(&self) -> usize {
		self.classifier.input_size()
	}

	pub fn output_size(&self) -> usize {
		self.classifier.output_size()
	}

	/// Picks the most probable known label for `text`.
	///
	/// Output columns past the label list are ignored.
	pub fn classify(&self, text: &str) -> Result<Prediction> {
		let tokens = DefaultTokenizer::common().tokenize(text);
		let features = self.word_vectors.mean_vector(&tokens).insert_axis(Axis(0));
		let output = self.classifier.output(&features)?;

		output
			.row(0)
			.iter()
			.take(self.labels.len())
			.enumerate()
			.max_by(|a, b| a.1.total_cmp(b.1))
			.map(|(i, &probability)| Prediction {
				label: self.labels[i].clone(),
				probability,
			})
			.ok_or_else(|| ChatError::InvalidInput("the network has no label".to_owned()))
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
}

/// Trains a `TrainedNetwork` from a labeled transcript CSV.
///
/// The builder owns its configuration; create one per pipeline run.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
	config: PipelineConfig,
}

impl NetworkBuilder {
	pub fn new(config: PipelineConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &PipelineConfig {
		&self.config
	}

	/// Runs the whole pipeline on `csv`.
	///
	/// # Behavior
	/// 1. Trains word vectors on the text column.
	/// 2. Partitions the CSV into `<csv_dir>/labels/<label>/data.txt`.
	/// 3. Iterates the label corpus as embedded mini-batches.
	/// 4. Builds the classifier (output width = number of CSV data rows).
	/// 5. Runs `epochs` passes over the batches, resetting after each.
	///
	/// # Errors
	/// - CSV read or parse failures
	/// - `Topology` when there are more labels than CSV rows
	///
	/// Partitioning failures are logged and do not stop the run; the label
	/// corpus already on disk is used.
	pub fn initialize<P: AsRef<Path>>(&self, csv: P) -> Result<TrainedNetwork> {
		let csv = csv.as_ref();
		let embedding = &self.config.embedding;
		let classifier_config = &self.config.classifier;

		let records = read_labeled_records(csv, &embedding.encoding)?;
		let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
		log::info!("Training word vectors on {} sentences", texts.len());
		let word_vectors = Word2Vec::new(embedding.clone()).fit(&texts)?;

		let partitioner = LabelPartitioner::new(&self.config.partition);
		let labels_dir = partitioner.labels_dir(csv);
		match partitioner.partition(csv) {
			Ok(report) => {
				for failed in &report.failed {
					log::error!("Label {:?} was not written: {}", failed.label, failed.reason);
				}
			}
			// Whatever corpus is already on disk is used.
			Err(e) => log::error!("Partitioning {} failed: {e}", csv.display()),
		}

		let sentences = LabelAwareSentenceIterator::from_dir(&labels_dir)?;
		if sentences.is_empty() {
			log::warn!("No sentence found below {}", labels_dir.display());
		}
		let labels = match &classifier_config.labels {
			Some(labels) => labels.clone(),
			None => sentences.labels().to_vec(),
		};
		let mut iterator =
			EmbeddingDataSetIterator::new(&word_vectors, sentences, labels, classifier_config.batch_size)?;

		let answer_count = records.len();
		log::info!(
			"{} input columns and {} output columns and {} answer count",
			iterator.input_columns(),
			iterator.total_outcomes(),
			answer_count
		);

		let mut classifier = Classifier::new(
			iterator.input_columns(),
			classifier_config,
			iterator.total_outcomes(),
			answer_count,
		)?;

		let mut iteration = 0usize;
		for epoch in 0..classifier_config.epochs {
			let mut total = 0.0;
			let mut batches = 0usize;
			for batch in iterator.by_ref() {
				let score = classifier.fit(&batch)?;
				log::debug!("Score at iteration {iteration} is {score}");
				iteration += 1;
				total += score;
				batches += 1;
			}
			iterator.reset();
			if batches > 0 {
				log::info!("Epoch {} complete, mean score {}", epoch + 1, total / batches as f32);
			}
		}

		let labels = iterator.labels().to_vec();
		Ok(TrainedNetwork {
			word_vectors,
			classifier,
			labels,
			answer_count,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{ClassifierConfig, EmbeddingConfig, PartitionConfig};

	fn small_config() -> PipelineConfig {
		PipelineConfig {
			partition: PartitionConfig {
				encoding: "utf-8".to_owned(),
				..PartitionConfig::default()
			},
			embedding: EmbeddingConfig {
				min_word_frequency: 1,
				layer_size: 6,
				..EmbeddingConfig::default()
			},
			classifier: ClassifierConfig {
				encoder_layer_sizes: vec![8],
				latent_size: 4,
				epochs: 2,
				batch_size: 2,
				..ClassifierConfig::default()
			},
			..PipelineConfig::default()
		}
	}

	fn write_csv(dir: &Path) -> std::path::PathBuf {
		let csv = dir.join("chat.csv");
		std::fs::write(
			&csv,
			"id,text,label\n1,hello there,0\n2,good morning,0\n3,see you,1\n4,bye now,1\n",
		)
		.unwrap();
		csv
	}

	#[test]
	fn widths_match_embedding_and_answer_count() {
		let dir = tempfile::tempdir().unwrap();
		let csv = write_csv(dir.path());

		let network = NetworkBuilder::new(small_config()).initialize(&csv).unwrap();
		assert_eq!(network.input_columns(), 6);
		assert_eq!(network.output_size(), 4);
		assert_eq!(network.answer_count(), 4);
		assert_eq!(network.labels(), ["0".to_owned(), "1".to_owned()]);
		assert!(dir.path().join("labels/0/data.txt").is_file());

		let prediction = network.classify("hello").unwrap();
		assert!(network.labels().contains(&prediction.label));
		assert!((0.0..=1.0).contains(&prediction.probability));
	}

	#[test]
	fn more_labels_than_rows_is_a_topology_error() {
		let dir = tempfile::tempdir().unwrap();
		let csv = write_csv(dir.path());
		let mut config = small_config();
		config.classifier.labels = Some((0..5).map(|i| i.to_string()).collect());

		let result = NetworkBuilder::new(config).initialize(&csv);
		assert!(matches!(result, Err(ChatError::Topology(_))));
	}

	#[test]
	fn failed_partition_falls_back_to_existing_corpus() {
		let dir = tempfile::tempdir().unwrap();
		let csv = write_csv(dir.path());
		NetworkBuilder::new(small_config()).initialize(&csv).unwrap();

		// The partitioner can no longer decode the CSV; the embeddings still can.
		let mut config = small_config();
		config.partition.encoding = "no-such-encoding".to_owned();
		let network = NetworkBuilder::new(config).initialize(&csv).unwrap();

		assert_eq!(network.labels(), ["0".to_owned(), "1".to_owned()]);
		assert_eq!(network.output_size(), 4);
	}

	#[test]
	fn saved_network_classifies_the_same() {
		let dir = tempfile::tempdir().unwrap();
		let csv = write_csv(dir.path());
		let network = NetworkBuilder::new(small_config()).initialize(&csv).unwrap();

		let path = dir.path().join("chat.network");
		network.save(&path).unwrap();
		let loaded = TrainedNetwork::load(&path).unwrap();
		assert_eq!(loaded.classify("see you").unwrap(), network.classify("see you").unwrap());
	}
}
