//! Chat transcript training and character generation library.
//!
//! This crate provides:
//! - Label partitioning of `index, text, label` transcript CSVs
//! - Word2Vec embeddings and a feed-forward classifier trained over them
//! - Character-level n-gram models and an autoregressive sampler
//! - A small event bus and module scaffold for a chat bot
//!
//! Everything is driven by an explicit [`config::PipelineConfig`].

/// Errors shared by every module.
pub mod error;

/// Pipeline configuration (TOML).
pub mod config;

/// I/O utilities (encoded reads, line writes, path helpers).
pub mod io;

/// Transcript CSVs and label corpora.
pub mod corpus;

/// Tokenization and character vocabularies.
pub mod text;

/// Character models and sampling.
pub mod model;

/// Embedding and classifier training.
pub mod network;

/// Chat bot events and modules.
pub mod bot;

pub use error::{ChatError, Result};
