//! # Fitted Skill Model
//!
//! The frozen, shareable tagger: tokenizer + feature vocabulary + CRF
//! parameters. A model directory holds `config.json` (labels and feature
//! vocabulary) next to `model.safetensors` (parameters).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crf::CrfParams;
use crate::error::{Result, SkillnerError};
use crate::tagger::bio_tags::{BioTag, Entity, EntityLabel};
use crate::tagger::features::{FeatureVocab, token_features};
use crate::tagger::tokenizer::{Token, Tokenizer};
use crate::tagger::viterbi::ViterbiDecoder;

/// Model metadata file inside a model directory.
pub const CONFIG_FILE: &str = "config.json";
/// Parameter file inside a model directory.
pub const WEIGHTS_FILE: &str = "model.safetensors";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ModelConfig {
    format_version: u32,
    labels: Vec<EntityLabel>,
    features: Vec<String>,
}

/// A trained (or deliberately untrained) skill tagger.
///
/// Inference takes `&self`; share one instance across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct FittedModel {
    tokenizer: Tokenizer,
    decoder: ViterbiDecoder,
    weights: Option<TrainedWeights>,
}

#[derive(Debug, Clone)]
struct TrainedWeights {
    vocab: FeatureVocab,
    params: CrfParams,
}

impl FittedModel {
    /// Assemble a model from a feature vocabulary and trained parameters.
    pub fn from_parts(vocab: FeatureVocab, params: CrfParams) -> Result<Self> {
        if params.emission.len() != vocab.num_rows() {
            return Err(SkillnerError::ModelLoad(format!(
                "emission table has {} rows, vocabulary needs {}",
                params.emission.len(),
                vocab.num_rows()
            )));
        }

        Ok(Self {
            tokenizer: Tokenizer::new()?,
            decoder: ViterbiDecoder::new(),
            weights: Some(TrainedWeights { vocab, params }),
        })
    }

    /// A model with no trained tagger; every input yields zero entities.
    pub fn untrained() -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new()?,
            decoder: ViterbiDecoder::new(),
            weights: None,
        })
    }

    /// Whether this model carries trained parameters.
    pub fn is_trained(&self) -> bool {
        self.weights.is_some()
    }

    /// Frozen parameters, if trained.
    pub fn params(&self) -> Option<&CrfParams> {
        self.weights.as_ref().map(|w| &w.params)
    }

    /// Load a model directory written by [`FittedModel::save`].
    ///
    /// # Errors
    ///
    /// `ModelNotFound` if either file is missing, `ModelLoad` if they exist
    /// but do not describe a consistent model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let dir = path.as_ref();
        let config_path = dir.join(CONFIG_FILE);
        let weights_path = dir.join(WEIGHTS_FILE);

        if !config_path.is_file() || !weights_path.is_file() {
            return Err(SkillnerError::ModelNotFound {
                path: dir.to_path_buf(),
            });
        }

        let config: ModelConfig = serde_json::from_str(&fs::read_to_string(&config_path)?)
            .map_err(|e| SkillnerError::ModelLoad(format!("{}: {e}", config_path.display())))?;
        if config.format_version != FORMAT_VERSION {
            return Err(SkillnerError::ModelLoad(format!(
                "unsupported model format version {}",
                config.format_version
            )));
        }
        if config.labels != EntityLabel::all() {
            return Err(SkillnerError::ModelLoad(format!(
                "label set {:?} does not match {:?}",
                config.labels,
                EntityLabel::all()
            )));
        }

        let vocab = FeatureVocab::from_features(config.features);
        let params = CrfParams::from_safetensors(&fs::read(&weights_path)?, vocab.num_rows())?;

        tracing::info!(
            path = %dir.display(),
            features = vocab.len(),
            "loaded skill model"
        );
        Self::from_parts(vocab, params)
    }

    /// Persist the model as a directory loadable by [`FittedModel::load`].
    ///
    /// An untrained model has nothing to persist and is rejected.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let weights = self.weights.as_ref().ok_or_else(|| {
            SkillnerError::ModelLoad("cannot save a model without trained parameters".into())
        })?;

        let dir = path.as_ref();
        fs::create_dir_all(dir)?;

        let config = ModelConfig {
            format_version: FORMAT_VERSION,
            labels: EntityLabel::all().to_vec(),
            features: weights.vocab.features().to_vec(),
        };
        fs::write(dir.join(CONFIG_FILE), serde_json::to_string_pretty(&config)?)?;
        weights.params.save_safetensors(&dir.join(WEIGHTS_FILE))?;

        tracing::info!(path = %dir.display(), "saved skill model");
        Ok(())
    }

    /// Tag `text` and return its entities in document order.
    pub fn infer(&self, text: &str) -> Vec<Entity> {
        let Some(weights) = &self.weights else {
            return Vec::new();
        };

        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let rows = weights.vocab.encode(&token_features(&tokens));
        let emissions = weights.params.emissions(&rows);
        let path = self.decoder.decode(
            &emissions,
            &weights.params.transitions,
            &weights.params.start,
            &weights.params.end,
        );

        let tags: Vec<BioTag> = path
            .into_iter()
            .map(|idx| BioTag::from_index(idx).unwrap_or(BioTag::Outside))
            .collect();
        assemble_entities(text, &tokens, &tags)
    }
}

/// Turn a tag sequence into entities: a Begin tag followed by any Inside
/// tags of the same label.
fn assemble_entities(text: &str, tokens: &[Token], tags: &[BioTag]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut i = 0;

    while i < tags.len() {
        let Some(label) = tags[i].label() else {
            i += 1;
            continue;
        };

        let first = i;
        i += 1;
        while i < tags.len() && tags[i].is_inside() && tags[i].label() == Some(label) {
            i += 1;
        }
        let last = i - 1;

        entities.push(Entity {
            text: text[tokens[first].byte_start..tokens[last].byte_end].to_string(),
            label,
            start: tokens[first].start,
            end: tokens[last].end,
        });
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::features::FEATURES_PER_TOKEN;

    /// A hand-weighted model that tags any title-case word as a skill.
    fn title_case_model() -> FittedModel {
        let vocab = FeatureVocab::from_features(vec![
            "bias".to_string(),
            "flags=t1u0d0p0".to_string(),
        ]);
        let mut params = CrfParams::zeros(vocab.num_rows());
        params.emission[vocab.index("bias") as usize] = [1.0, 0.0, 0.0];
        params.emission[vocab.index("flags=t1u0d0p0") as usize] = [0.0, 2.0, 0.0];
        FittedModel::from_parts(vocab, params).unwrap()
    }

    #[test]
    fn test_untrained_model_yields_nothing() {
        let model = FittedModel::untrained().unwrap();
        assert!(!model.is_trained());
        assert!(model.infer("Python and Java").is_empty());
    }

    #[test]
    fn test_infer_empty_text() {
        let model = title_case_model();
        assert!(model.infer("").is_empty());
        assert!(model.infer("   ").is_empty());
    }

    #[test]
    fn test_infer_reports_char_offsets_in_order() {
        let model = title_case_model();
        let entities = model.infer("we use Python and Java.");

        assert_eq!(
            entities,
            vec![
                Entity {
                    text: "Python".into(),
                    label: EntityLabel::Skill,
                    start: 7,
                    end: 13,
                },
                Entity {
                    text: "Java".into(),
                    label: EntityLabel::Skill,
                    start: 18,
                    end: 22,
                },
            ]
        );
    }

    #[test]
    fn test_assemble_multi_token_entity() {
        let text = "Machine Learning rocks";
        let tokens = Tokenizer::new().unwrap().tokenize(text);
        let tags = [BioTag::BeginSkill, BioTag::InsideSkill, BioTag::Outside];

        let entities = assemble_entities(text, &tokens, &tags);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Machine Learning");
        assert_eq!((entities[0].start, entities[0].end), (0, 16));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model-best");
        let model = title_case_model();

        model.save(&path).unwrap();
        let loaded = FittedModel::load(&path).unwrap();

        let text = "Knowledge of Rust and Go";
        assert_eq!(loaded.infer(text), model.infer(text));
        assert_eq!(loaded.params(), model.params());
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = FittedModel::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SkillnerError::ModelNotFound { .. }));
    }

    #[test]
    fn test_load_corrupt_config() {
        let dir = tempfile::tempdir().unwrap();
        title_case_model().save(dir.path()).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();

        let err = FittedModel::load(dir.path()).unwrap_err();
        assert!(matches!(err, SkillnerError::ModelLoad(_)));
    }

    #[test]
    fn test_untrained_model_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let err = FittedModel::untrained().unwrap().save(dir.path()).unwrap_err();
        assert!(matches!(err, SkillnerError::ModelLoad(_)));
    }

    #[test]
    fn test_from_parts_checks_row_count() {
        let vocab = FeatureVocab::from_features(vec!["bias".to_string()]);
        let err = FittedModel::from_parts(vocab, CrfParams::zeros(FEATURES_PER_TOKEN)).unwrap_err();
        assert!(matches!(err, SkillnerError::ModelLoad(_)));
    }

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FittedModel>();
    }
}
