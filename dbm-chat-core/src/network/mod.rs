//! Text classification: word embeddings feeding a feed-forward classifier.

/// Skip-gram Word2Vec and the resulting word vectors.
pub mod embedding;

/// Embedded mini-batches over a label corpus.
pub mod dataset;

/// Dense layers trained with softmax and negative log-likelihood.
pub mod classifier;

/// `NetworkBuilder` pipeline and the `TrainedNetwork` it produces.
pub mod builder;
