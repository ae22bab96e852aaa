//! # BIO Tags for Skill Recognition
//!
//! Defines the entity vocabulary and the tag set used for sequence labeling
//! of resume text. Uses the BIO (Begin-Inside-Outside) tagging scheme.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrainingDataError;

/// Entity types the tagger can be trained to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityLabel {
    #[serde(rename = "SKILL")]
    Skill,
}

impl EntityLabel {
    /// Every label in vocabulary order.
    pub fn all() -> &'static [EntityLabel] {
        &[EntityLabel::Skill]
    }

    /// The label's corpus spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Skill => "SKILL",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = TrainingDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SKILL" => Ok(EntityLabel::Skill),
            other => Err(TrainingDataError::UnknownLabel(other.to_string())),
        }
    }
}

/// BIO tags for labeling resume tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BioTag {
    Outside,
    BeginSkill,
    InsideSkill,
}

impl BioTag {
    /// Total number of distinct tags.
    pub const NUM_TAGS: usize = 3;

    /// Get all possible tags in order.
    pub fn all_tags() -> &'static [BioTag] {
        &[BioTag::Outside, BioTag::BeginSkill, BioTag::InsideSkill]
    }

    /// Get the tag index for tensor operations.
    pub fn index(&self) -> usize {
        match self {
            BioTag::Outside => 0,
            BioTag::BeginSkill => 1,
            BioTag::InsideSkill => 2,
        }
    }

    /// Get tag from index.
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(BioTag::Outside),
            1 => Some(BioTag::BeginSkill),
            2 => Some(BioTag::InsideSkill),
            _ => None,
        }
    }

    /// The "Begin" tag for an entity label.
    pub fn begin(label: EntityLabel) -> Self {
        match label {
            EntityLabel::Skill => BioTag::BeginSkill,
        }
    }

    /// The "Inside" tag for an entity label.
    pub fn inside(label: EntityLabel) -> Self {
        match label {
            EntityLabel::Skill => BioTag::InsideSkill,
        }
    }

    /// Check if this is a "Begin" tag.
    pub fn is_begin(&self) -> bool {
        matches!(self, BioTag::BeginSkill)
    }

    /// Check if this is an "Inside" tag.
    pub fn is_inside(&self) -> bool {
        matches!(self, BioTag::InsideSkill)
    }

    /// Get the entity label for this tag.
    pub fn label(&self) -> Option<EntityLabel> {
        match self {
            BioTag::BeginSkill | BioTag::InsideSkill => Some(EntityLabel::Skill),
            BioTag::Outside => None,
        }
    }

    /// Whether a sequence may open with this tag.
    pub fn is_valid_start(tag: BioTag) -> bool {
        !tag.is_inside()
    }

    /// Check if transitioning from `from` tag to `to` tag is valid.
    ///
    /// An Inside tag must continue an entity of the same label.
    pub fn is_valid_transition(from: BioTag, to: BioTag) -> bool {
        if !to.is_inside() {
            return true;
        }
        from.label().is_some() && from.label() == to.label()
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Outside => write!(f, "O"),
            BioTag::BeginSkill => write!(f, "B-SKILL"),
            BioTag::InsideSkill => write!(f, "I-SKILL"),
        }
    }
}

/// A labeled span found by the tagger.
///
/// Offsets count characters, not bytes, and are half-open (`start..end`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}
