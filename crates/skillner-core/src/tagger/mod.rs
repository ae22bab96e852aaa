pub mod bio_tags;
pub mod features;
pub mod tokenizer;
pub mod viterbi;

pub use bio_tags::{BioTag, Entity, EntityLabel};
pub use features::{FEATURES_PER_TOKEN, FeatureVocab, token_features};
pub use tokenizer::{Token, Tokenizer};
pub use viterbi::ViterbiDecoder;
