use ndarray::{Array3, ArrayView3};

use crate::error::Result;

/// A model predicting the next character one time step at a time.
///
/// Tensors are laid out as `[samples, time, columns]`: inputs are one-hot
/// rows over the character vocabulary, outputs are the predicted
/// distributions over the same vocabulary, one per sample and step.
///
/// Implementations keep a recurrent state per sample slot. It survives
/// between calls to [`rnn_time_step`](Self::rnn_time_step) and is only
/// dropped by [`clear_state`](Self::clear_state), so callers must not
/// interleave independent generations on the same model.
pub trait SequenceModel {
	/// Width of an input row and of an output distribution.
	fn input_columns(&self) -> usize;

	/// Forgets the recurrent state of every sample slot.
	fn clear_state(&mut self);

	/// Feeds `input` and returns the prediction made after every step.
	fn rnn_time_step(&mut self, input: ArrayView3<'_, f32>) -> Result<Array3<f64>>;
}
