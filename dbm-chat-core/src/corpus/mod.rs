//! Chat transcript corpus handling.
//!
//! A transcript is a CSV of `index, text, label` rows. It is split into a
//! label corpus (one folder per label) that the training pipeline walks
//! back sentence by sentence.

/// CSV transcript rows.
pub mod record;

/// Label-partitioned corpus writer.
pub mod partitioner;

/// Sentence iterator over a label corpus.
pub mod label_iterator;
