use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::error::{ChatError, Result};
use crate::network::dataset::DataSet;

/// Slope of the leaky ReLU for negative inputs.
const LEAKY_SLOPE: f32 = 0.01;
/// Floor applied to probabilities before taking their log.
const MIN_PROBABILITY: f32 = 1e-12;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
	LeakyRelu,
	Softmax,
}

impl Activation {
	fn apply(self, mut z: Array2<f32>) -> Array2<f32> {
		match self {
			Activation::LeakyRelu => z.mapv_inplace(|v| if v > 0.0 { v } else { LEAKY_SLOPE * v }),
			Activation::Softmax => {
				for mut row in z.rows_mut() {
					let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
					row.mapv_inplace(|v| (v - max).exp());
					let sum = row.sum();
					row /= sum;
				}
			}
		}
		z
	}

	/// Derivative with respect to the pre-activation (leaky ReLU only).
	fn derivative(z: &Array2<f32>) -> Array2<f32> {
		z.mapv(|v| if v > 0.0 { 1.0 } else { LEAKY_SLOPE })
	}
}

/// Fully connected layer: `activation(input · weights + bias)`.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct DenseLayer {
	weights: Array2<f32>,
	bias: Array1<f32>,
	activation: Activation,
}

impl DenseLayer {
	fn new(n_in: usize, n_out: usize, activation: Activation, rng: &mut StdRng) -> Result<Self> {
		let normal = Normal::new(0.0, (2.0 / n_in as f32).sqrt())
			.map_err(|e| ChatError::Topology(format!("weight initialisation: {e}")))?;
		Ok(Self {
			weights: Array2::from_shape_fn((n_in, n_out), |_| normal.sample(rng)),
			bias: Array1::zeros(n_out),
			activation,
		})
	}

	fn pre_activation(&self, input: &Array2<f32>) -> Array2<f32> {
		input.dot(&self.weights) + &self.bias
	}
}

/// Feed-forward classifier trained with softmax + negative log-likelihood.
///
/// Layout: leaky ReLU encoder layers, a latent layer, a leaky ReLU layer of
/// width `total_outcomes`, then a softmax layer of width `answer_count`.
/// Label index `i` is the target column `i` of the output.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Classifier {
	layers: Vec<DenseLayer>,
	learning_rate: f32,
	gradient_clip: f32,
}

impl Classifier {
	/// Builds the layer stack with weights drawn from `config.seed`.
	///
	/// # Errors
	/// Returns a topology error when `answer_count < total_outcomes` or any
	/// width is zero.
	pub fn new(n_in: usize, config: &ClassifierConfig, total_outcomes: usize, answer_count: usize) -> Result<Self> {
		if answer_count < total_outcomes {
			return Err(ChatError::Topology(format!(
				"answer count {answer_count} is smaller than the {total_outcomes} labels"
			)));
		}

		let mut widths = vec![n_in];
		widths.extend(&config.encoder_layer_sizes);
		widths.extend([config.latent_size, total_outcomes, answer_count]);
		if widths.contains(&0) {
			return Err(ChatError::Topology(format!("layer widths must be positive, got {widths:?}")));
		}

		let mut rng = StdRng::seed_from_u64(config.seed);
		let last = widths.len() - 2;
		let layers = widths
			.windows(2)
			.enumerate()
			.map(|(i, pair)| {
				let activation = if i == last { Activation::Softmax } else { Activation::LeakyRelu };
				DenseLayer::new(pair[0], pair[1], activation, &mut rng)
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			layers,
			learning_rate: config.learning_rate,
			gradient_clip: config.gradient_clip,
		})
	}

	pub fn input_size(&self) -> usize {
		self.layers.first().map_or(0, |l| l.weights.nrows())
	}

	pub fn output_size(&self) -> usize {
		self.layers.last().map_or(0, |l| l.weights.ncols())
	}

	/// Class probabilities, one row per input row.
	pub fn output(&self, features: &Array2<f32>) -> Result<Array2<f32>> {
		self.check_input(features)?;
		let mut a = features.clone();
		for layer in &self.layers {
			a = layer.activation.apply(layer.pre_activation(&a));
		}
		Ok(a)
	}

	/// Mean negative log-likelihood of `data` under the current weights.
	pub fn score(&self, data: &DataSet) -> Result<f32> {
		let targets = self.targets(data)?;
		Ok(nll(&self.output(&data.features)?, &targets))
	}

	/// One SGD step on `data`; returns the score measured before the step.
	pub fn fit(&mut self, data: &DataSet) -> Result<f32> {
		self.check_input(&data.features)?;
		let targets = self.targets(data)?;
		let n = data.num_examples();
		if n == 0 {
			return Ok(0.0);
		}

		// Forward pass, remembering pre-activations and activations.
		let mut activations = vec![data.features.clone()];
		let mut pre_activations = Vec::with_capacity(self.layers.len());
		for layer in &self.layers {
			let z = layer.pre_activation(&activations[activations.len() - 1]);
			activations.push(layer.activation.apply(z.clone()));
			pre_activations.push(z);
		}
		let probabilities = &activations[activations.len() - 1];
		let score = nll(probabilities, &targets);

		// Softmax + NLL gradient.
		let mut delta = (probabilities - &targets) / n as f32;

		for l in (0..self.layers.len()).rev() {
			let mut grad_w = activations[l].t().dot(&delta);
			let mut grad_b = delta.sum_axis(Axis(0));

			if l > 0 {
				let back = delta.dot(&self.layers[l].weights.t());
				delta = back * Activation::derivative(&pre_activations[l - 1]);
			}

			self.clip(&mut grad_w);
			self.clip(&mut grad_b);
			let layer = &mut self.layers[l];
			layer.weights.scaled_add(-self.learning_rate, &grad_w);
			layer.bias.scaled_add(-self.learning_rate, &grad_b);
		}

		Ok(score)
	}

	fn clip<D: ndarray::Dimension>(&self, grad: &mut ndarray::Array<f32, D>) {
		let bound = self.gradient_clip;
		if bound > 0.0 {
			grad.mapv_inplace(|g| g.clamp(-bound, bound));
		}
	}

	fn check_input(&self, features: &Array2<f32>) -> Result<()> {
		if features.ncols() != self.input_size() {
			return Err(ChatError::Topology(format!(
				"expected {} input columns, got {}",
				self.input_size(),
				features.ncols()
			)));
		}
		Ok(())
	}

	/// Widens one-hot label rows to the output width.
	fn targets(&self, data: &DataSet) -> Result<Array2<f32>> {
		let outcomes = data.labels.ncols();
		if outcomes > self.output_size() || data.labels.nrows() != data.features.nrows() {
			return Err(ChatError::Topology(format!(
				"labels of shape {:?} do not fit {} output columns",
				data.labels.shape(),
				self.output_size()
			)));
		}
		let mut targets = Array2::zeros((data.labels.nrows(), self.output_size()));
		targets.slice_mut(ndarray::s![.., ..outcomes]).assign(&data.labels);
		Ok(targets)
	}
}

fn nll(probabilities: &Array2<f32>, targets: &Array2<f32>) -> f32 {
	let n = probabilities.nrows().max(1) as f32;
	let log_likelihood: f32 = probabilities
		.iter()
		.zip(targets)
		.map(|(&p, &t)| t * p.max(MIN_PROBABILITY).ln())
		.sum();
	-log_likelihood / n
}
