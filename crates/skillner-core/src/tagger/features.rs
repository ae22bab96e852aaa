//! Token feature templates and the feature vocabulary.
//!
//! Each token is described by a fixed number of string features; the
//! vocabulary maps them to emission-table rows. Row 0 is reserved for
//! features never seen during training.

use std::collections::{BTreeSet, HashMap};

use crate::tagger::tokenizer::Token;

/// Number of features emitted per token.
pub const FEATURES_PER_TOKEN: usize = 10;

const BOS: &str = "<s>";
const EOS: &str = "</s>";

/// Extract the feature strings for every token of a sequence.
pub fn token_features(tokens: &[Token]) -> Vec<[String; FEATURES_PER_TOKEN]> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let prev = i.checked_sub(1).map(|p| tokens[p].text.as_str());
            let next = tokens.get(i + 1).map(|n| n.text.as_str());
            features_for(&token.text, prev, next)
        })
        .collect()
}

fn features_for(word: &str, prev: Option<&str>, next: Option<&str>) -> [String; FEATURES_PER_TOKEN] {
    let lower = word.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let prefix: String = chars.iter().take(3).collect();
    let suffix: String = chars[chars.len().saturating_sub(3)..].iter().collect();

    [
        "bias".to_string(),
        format!("w={lower}"),
        format!("shape={}", word_shape(word)),
        format!("pre={prefix}"),
        format!("suf={suffix}"),
        format!("p1={}", prev.map_or_else(|| BOS.to_string(), str::to_lowercase)),
        format!("n1={}", next.map_or_else(|| EOS.to_string(), str::to_lowercase)),
        format!("ps={}", prev.map_or_else(|| BOS.to_string(), word_shape)),
        format!("ns={}", next.map_or_else(|| EOS.to_string(), word_shape)),
        format!("flags={}", orthographic_flags(word)),
    ]
}

/// Collapse a word into its character-class shape, e.g. `React.js` -> `Xxxxx.xx`.
///
/// Runs of the same class are capped at four characters.
pub fn word_shape(word: &str) -> String {
    let mut shape = String::with_capacity(word.len());
    let mut last = None;
    let mut run = 0;

    for c in word.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };

        if Some(class) == last {
            run += 1;
        } else {
            run = 1;
            last = Some(class);
        }
        if run <= 4 {
            shape.push(class);
        }
    }

    shape
}

fn orthographic_flags(word: &str) -> String {
    let title = word.chars().next().is_some_and(char::is_uppercase);
    let upper = word.chars().any(char::is_alphabetic)
        && word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase);
    let digit = word.chars().any(char::is_numeric);
    let punct = word.chars().all(|c| !c.is_alphanumeric());

    format!(
        "t{}u{}d{}p{}",
        u8::from(title),
        u8::from(upper),
        u8::from(digit),
        u8::from(punct)
    )
}

/// Maps feature strings to emission-table rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureVocab {
    feature_to_idx: HashMap<String, u32>,
    features: Vec<String>,
}

impl FeatureVocab {
    /// Build a vocabulary from every feature of the given token sequences.
    ///
    /// Features are sorted so the same corpus always yields the same rows.
    pub fn build<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a [[String; FEATURES_PER_TOKEN]]>,
    {
        let unique: BTreeSet<&String> = sequences
            .into_iter()
            .flat_map(|seq| seq.iter().flat_map(|feats| feats.iter()))
            .collect();
        Self::from_features(unique.into_iter().cloned().collect())
    }

    /// Rebuild a vocabulary from its persisted feature list.
    pub fn from_features(features: Vec<String>) -> Self {
        let feature_to_idx = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), i as u32 + 1))
            .collect();
        Self {
            feature_to_idx,
            features,
        }
    }

    /// Row index of a feature; 0 when unknown.
    pub fn index(&self, feature: &str) -> u32 {
        self.feature_to_idx.get(feature).copied().unwrap_or(0)
    }

    /// Flatten a sequence's features into row indices, `FEATURES_PER_TOKEN` per token.
    pub fn encode(&self, features: &[[String; FEATURES_PER_TOKEN]]) -> Vec<u32> {
        features
            .iter()
            .flat_map(|feats| feats.iter().map(|f| self.index(f)))
            .collect()
    }

    /// Known features in row order (row `i + 1` is `features()[i]`).
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Number of emission rows, including the unknown row.
    pub fn num_rows(&self) -> usize {
        self.features.len() + 1
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
