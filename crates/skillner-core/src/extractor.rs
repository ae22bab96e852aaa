//! # Skill Extraction Service Core
//!
//! Composes the fitted tagger with the skill filter. A [`SkillExtractor`] is
//! built once at startup from an [`ExtractorConfig`] and then used read-only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillnerError};
use crate::filter::{DEFAULT_IGNORE_WORDS, IgnoreSet, SkillFilter, SkillSet};
use crate::model::FittedModel;
use crate::tagger::bio_tags::{Entity, EntityLabel};

/// Default location of the trained model directory.
pub const DEFAULT_MODEL_PATH: &str = "output/model-best";

/// Number of characters of input echoed back in a [`SkillReport`].
pub const PREVIEW_CHARS: usize = 200;

/// What to do when no readable model artifact exists at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingModelPolicy {
    /// Surface `ModelNotFound` or `ModelLoad` to the caller.
    #[default]
    Fail,
    /// Continue with an untrained model that finds no skills, whether the
    /// artifact is absent or unreadable.
    Untrained,
}

/// Configuration for the skill extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Directory holding the trained model
    pub model_path: PathBuf,
    /// Behavior when `model_path` holds no model
    pub missing_model: MissingModelPolicy,
    /// Words never reported as skills
    pub ignore: IgnoreSet,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            missing_model: MissingModelPolicy::default(),
            ignore: IgnoreSet::new(DEFAULT_IGNORE_WORDS.iter().copied()),
        }
    }
}

impl ExtractorConfig {
    /// Create a new extractor configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model directory.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the missing-model policy.
    pub fn with_missing_model(mut self, policy: MissingModelPolicy) -> Self {
        self.missing_model = policy;
        self
    }

    /// Replace the ignore list.
    pub fn with_ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }
}

/// Analysis summary for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillReport {
    pub found_skills: Vec<String>,
    pub total_skills: usize,
    pub raw_text_preview: String,
}

/// Tagger + filter pipeline.
#[derive(Debug, Clone)]
pub struct SkillExtractor {
    model: FittedModel,
    filter: SkillFilter,
}

impl SkillExtractor {
    /// Load the model named by `config`, applying its missing-model policy.
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let model = load_model(&config.model_path, config.missing_model)?;
        Ok(Self::from_parts(model, SkillFilter::new(config.ignore)))
    }

    /// Build an extractor around an already loaded model.
    pub fn from_parts(model: FittedModel, filter: SkillFilter) -> Self {
        Self { model, filter }
    }

    /// Whether a trained model is loaded (false in degraded mode).
    pub fn has_model(&self) -> bool {
        self.model.is_trained()
    }

    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    pub fn filter(&self) -> &SkillFilter {
        &self.filter
    }

    /// Raw SKILL entities, before filtering.
    pub fn entities(&self, text: &str) -> Vec<Entity> {
        self.model
            .infer(text)
            .into_iter()
            .filter(|entity| entity.label == EntityLabel::Skill)
            .collect()
    }

    /// The filtered skill set of `text`.
    ///
    /// # Examples
    /// ```
    /// use skillner_core::{ExtractorConfig, MissingModelPolicy, SkillExtractor};
    ///
    /// let config = ExtractorConfig::new()
    ///     .with_model_path("does/not/exist")
    ///     .with_missing_model(MissingModelPolicy::Untrained);
    /// let extractor = SkillExtractor::new(config).unwrap();
    ///
    /// assert!(extractor.extract_skills("Python and Java").is_empty());
    /// ```
    pub fn extract_skills(&self, text: &str) -> SkillSet {
        let entities = self.entities(text);
        let skills = self.filter.apply(&entities);
        tracing::debug!(
            candidates = entities.len(),
            skills = skills.len(),
            "extracted skills"
        );
        skills
    }

    /// Skills plus a short preview of the analyzed text.
    pub fn analyze(&self, text: &str) -> SkillReport {
        let found_skills: Vec<String> = self.extract_skills(text).into_iter().collect();
        SkillReport {
            total_skills: found_skills.len(),
            found_skills,
            raw_text_preview: preview(text),
        }
    }
}

fn load_model(path: &Path, policy: MissingModelPolicy) -> Result<FittedModel> {
    match FittedModel::load(path) {
        Err(SkillnerError::ModelNotFound { path }) if policy == MissingModelPolicy::Untrained => {
            tracing::warn!(
                path = %path.display(),
                "model not found, continuing with an untrained model"
            );
            FittedModel::untrained()
        }
        Err(err @ (SkillnerError::ModelLoad(_) | SkillnerError::Io(_)))
            if policy == MissingModelPolicy::Untrained =>
        {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "model unreadable, continuing with an untrained model"
            );
            FittedModel::untrained()
        }
        other => other,
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crf::CrfParams;
    use crate::tagger::features::FeatureVocab;

    /// Tags every title-case word as a skill.
    fn title_case_extractor(ignore: &[&str]) -> SkillExtractor {
        let vocab = FeatureVocab::from_features(vec![
            "bias".to_string(),
            "flags=t1u0d0p0".to_string(),
            "flags=t1u1d0p0".to_string(),
        ]);
        let mut params = CrfParams::zeros(vocab.num_rows());
        params.emission[vocab.index("bias") as usize] = [1.0, 0.0, 0.0];
        params.emission[vocab.index("flags=t1u0d0p0") as usize] = [0.0, 2.0, 0.0];
        params.emission[vocab.index("flags=t1u1d0p0") as usize] = [0.0, 2.0, 0.0];
        let model = FittedModel::from_parts(vocab, params).unwrap();
        SkillExtractor::from_parts(model, SkillFilter::new(IgnoreSet::new(ignore.iter().copied())))
    }

    #[test]
    fn test_config_builder() {
        let config = ExtractorConfig::new()
            .with_model_path("models/skills")
            .with_missing_model(MissingModelPolicy::Untrained)
            .with_ignore(IgnoreSet::new(["Foo"]));

        assert_eq!(config.model_path, PathBuf::from("models/skills"));
        assert_eq!(config.missing_model, MissingModelPolicy::Untrained);
        assert!(config.ignore.contains("Foo"));
    }

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.missing_model, MissingModelPolicy::Fail);
        assert!(config.ignore.contains("Software"));
    }

    #[test]
    fn test_missing_model_fails_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig::new().with_model_path(dir.path().join("missing"));

        let err = SkillExtractor::new(config).unwrap_err();
        assert!(matches!(err, SkillnerError::ModelNotFound { .. }));
    }

    #[test]
    fn test_missing_model_can_degrade() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig::new()
            .with_model_path(dir.path().join("missing"))
            .with_missing_model(MissingModelPolicy::Untrained);

        let extractor = SkillExtractor::new(config).unwrap();
        assert!(!extractor.has_model());
        assert!(extractor.extract_skills("Python and Java").is_empty());
    }

    #[test]
    fn test_corrupt_model_can_degrade() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::model::CONFIG_FILE), "{not json").unwrap();
        std::fs::write(dir.path().join(crate::model::WEIGHTS_FILE), b"garbage").unwrap();

        let strict = ExtractorConfig::new().with_model_path(dir.path());
        let err = SkillExtractor::new(strict).unwrap_err();
        assert!(matches!(err, SkillnerError::ModelLoad(_)));

        let lenient = ExtractorConfig::new()
            .with_model_path(dir.path())
            .with_missing_model(MissingModelPolicy::Untrained);
        let extractor = SkillExtractor::new(lenient).unwrap();
        assert!(!extractor.has_model());
        assert!(extractor.extract_skills("Python and Java").is_empty());
    }

    #[test]
    fn test_extract_applies_filter() {
        let extractor = title_case_extractor(&["Software"]);
        let skills = extractor.extract_skills("we want Software and AWS and PYTHON");

        assert_eq!(
            skills,
            SkillSet::from(["AWS".to_string(), "PYTHON".to_string()])
        );
    }

    #[test]
    fn test_extract_drops_contact_info() {
        let extractor = title_case_extractor(&[]);
        let skills = extractor.extract_skills("mail Jane@example.com about Docker");

        assert_eq!(skills, SkillSet::from(["Docker".to_string()]));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let extractor = title_case_extractor(&[]);
        let text = "using Rust, Go and Kubernetes daily";
        assert_eq!(extractor.extract_skills(text), extractor.extract_skills(text));
    }

    #[test]
    fn test_empty_text() {
        let extractor = title_case_extractor(&[]);
        assert!(extractor.entities("").is_empty());
        assert!(extractor.extract_skills("").is_empty());
    }

    #[test]
    fn test_analyze_report() {
        let extractor = title_case_extractor(&[]);
        let report = extractor.analyze("knows Rust and Rust");

        assert_eq!(report.found_skills, vec!["Rust".to_string()]);
        assert_eq!(report.total_skills, 1);
        assert_eq!(report.raw_text_preview, "knows Rust and Rust...");
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        let text = "é".repeat(PREVIEW_CHARS + 50);
        let report = title_case_extractor(&[]).analyze(&text);
        assert_eq!(report.raw_text_preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_extractor_shared_across_threads() {
        let extractor = std::sync::Arc::new(title_case_extractor(&[]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let extractor = std::sync::Arc::clone(&extractor);
                std::thread::spawn(move || extractor.extract_skills("uses Terraform daily"))
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                SkillSet::from(["Terraform".to_string()])
            );
        }
    }
}
