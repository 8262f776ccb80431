//! Text processing shared by the word and character pipelines.

/// Whitespace tokenizer and token pre-processing.
pub mod tokenizer;

/// Character ↔ index vocabulary.
pub mod vocabulary;

/// Corpus filtered against a character vocabulary.
pub mod char_corpus;
