//! # Skillner Core
//!
//! The engine behind skillner: a trainable CRF tagger for SKILL spans in
//! resume text, the training-corpus schema, and the filter that turns raw
//! tagger output into a clean skill set.
//!
//! ## Quick Start
//!
//! ```rust
//! use skillner_core::{ExtractorConfig, MissingModelPolicy, SkillExtractor};
//!
//! let config = ExtractorConfig::new()
//!     .with_model_path("output/model-best")
//!     .with_missing_model(MissingModelPolicy::Untrained);
//! let extractor = SkillExtractor::new(config).unwrap();
//!
//! let skills = extractor.extract_skills("I have 3 years of experience in Python and Java.");
//! for skill in &skills {
//!     println!("{skill}");
//! }
//! ```
pub mod corpus;
pub mod crf;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod model;
pub mod tagger;

// Re-export primary API
pub use corpus::{SpanAnnotation, TrainingExample, validate_corpus};
pub use crf::{CrfNetwork, CrfParams};
pub use error::{Result, SkillnerError, TrainingDataError};
pub use extractor::{
    DEFAULT_MODEL_PATH, ExtractorConfig, MissingModelPolicy, SkillExtractor, SkillReport,
};
pub use filter::{DEFAULT_IGNORE_WORDS, IgnoreSet, SkillFilter, SkillSet, Verdict};
pub use model::FittedModel;
pub use tagger::{BioTag, Entity, EntityLabel, FeatureVocab, Token, Tokenizer, ViterbiDecoder};
