use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during skillner core operations.
#[derive(Debug, Error)]
pub enum SkillnerError {
    /// No model artifact exists at the requested location.
    #[error("model not found at {}", path.display())]
    ModelNotFound {
        /// The directory that was searched.
        path: PathBuf,
    },

    /// A model artifact exists but could not be read back.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// A training example violates the corpus schema.
    #[error("invalid training example #{index}: {source}")]
    TrainingData {
        /// Position of the offending example in the corpus.
        index: usize,
        /// What was wrong with it.
        source: TrainingDataError,
    },

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    /// Filesystem error while reading or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Candle ML framework error.
    #[error("ML framework error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Span-level problems found while validating a training example.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainingDataError {
    /// `start >= end`.
    #[error("span {start}..{end} is empty or inverted")]
    InvalidSpan { start: usize, end: usize },

    /// The span ends past the end of the text.
    #[error("span {start}..{end} exceeds text length {len}")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// Two spans of the same example share characters.
    #[error("span {second:?} overlaps span {first:?}")]
    Overlapping {
        first: (usize, usize),
        second: (usize, usize),
    },

    /// The label is not part of the entity vocabulary.
    #[error("unknown entity label {0:?}")]
    UnknownLabel(String),

    /// The span starts or ends inside a token.
    #[error("span {start}..{end} does not align with token boundaries")]
    Misaligned { start: usize, end: usize },
}

/// Result type alias for skillner operations.
pub type Result<T> = std::result::Result<T, SkillnerError>;
