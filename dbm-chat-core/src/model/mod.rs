//! Character-level generation.
//!
//! This module provides:
//! - Weighted sampling from a discrete distribution
//! - The `SequenceModel` seam any step-wise character predictor plugs into
//! - The character sampler driving such a model
//! - A built-in n-gram `SequenceModel` (`CharNGramModel`)
//! - Request parameters for sampling (`SampleRequest`)

/// Cumulative-sum sampling over probability distributions.
pub mod distribution;

/// One-step-at-a-time sequence model trait.
pub mod sequence;

/// Autoregressive character sampler.
pub mod sampler;

/// Multi-order character n-gram model implementing `SequenceModel`.
///
/// Supports loading from a cache, parallel construction and merging.
pub mod char_model;

/// Fixed-order transition table (`n >= 1`).
///
/// Not exposed publicly.
mod ngram_model;

/// Internal representation of a single n-gram state (prefix).
///
/// Not exposed publicly.
mod state;

/// Sampling configuration: seed strategy, lengths, RNG seed.
pub mod sample_request;
