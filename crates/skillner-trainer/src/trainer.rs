//! Training loop for the skill CRF.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use oorandom::Rand32;
use serde::Serialize;
use skillner_core::tagger::{BioTag, FEATURES_PER_TOKEN, FeatureVocab, Tokenizer, token_features};
use skillner_core::{
    CrfNetwork, FittedModel, Result, SkillExtractor, SkillFilter, SkillnerError, TrainingExample,
    validate_corpus,
};

use crate::data::{load_corpus, seed_corpus};

/// Hyperparameters for a training run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Passes over the corpus
    pub epochs: usize,
    /// Probability of dropping each token feature during an update
    pub dropout: f32,
    /// AdamW step size
    pub learning_rate: f64,
    /// Seed for shuffling and dropout; `None` draws one from the clock
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            dropout: 0.5,
            learning_rate: 0.05,
            seed: None,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the epoch count. Zero epochs fits nothing and yields the blank
    /// (all-zero) model.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the dropout rate, clamped to `[0, 0.95]`.
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout.clamp(0.0, 0.95);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Fix the random source for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Loss summed over one epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f32,
}

/// What a training run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub examples: usize,
    pub features: usize,
    pub epochs: Vec<EpochStats>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f32> {
        self.epochs.last().map(|e| e.loss)
    }
}

/// A corpus example reduced to feature rows and gold tags.
struct EncodedExample {
    rows: Vec<u32>,
    tags: Vec<BioTag>,
}

pub struct Trainer {
    config: TrainerConfig,
    rng: Rand32,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        let seed = config.seed.unwrap_or_else(clock_seed);
        Self {
            config,
            rng: Rand32::new(seed),
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit a blank model to `corpus`.
    ///
    /// Every example is validated and aligned before the first update, so a
    /// bad example aborts the run without partial training.
    pub fn fit(&mut self, corpus: &[TrainingExample]) -> Result<(FittedModel, TrainingReport)> {
        validate_corpus(corpus)?;

        let tokenizer = Tokenizer::new()?;
        let mut features = Vec::with_capacity(corpus.len());
        let mut gold = Vec::with_capacity(corpus.len());
        for (index, example) in corpus.iter().enumerate() {
            let tokens = tokenizer.tokenize(&example.text);
            let tags = example
                .bio_tags(&tokens)
                .map_err(|source| SkillnerError::TrainingData { index, source })?;
            features.push(token_features(&tokens));
            gold.push(tags);
        }

        let vocab = FeatureVocab::build(features.iter().map(Vec::as_slice));
        let encoded: Vec<EncodedExample> = features
            .iter()
            .zip(gold)
            .map(|(feats, tags)| EncodedExample {
                rows: vocab.encode(feats),
                tags,
            })
            .collect();

        tracing::info!(
            examples = encoded.len(),
            features = vocab.len(),
            epochs = self.config.epochs,
            "training started"
        );

        let network = CrfNetwork::new(vocab.num_rows())?;
        let mut optimizer = AdamW::new(
            network.vars(),
            ParamsAdamW {
                lr: self.config.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        let mut report = TrainingReport {
            examples: encoded.len(),
            features: vocab.len(),
            epochs: Vec::with_capacity(self.config.epochs),
        };

        let mut order: Vec<usize> = (0..encoded.len()).collect();
        for epoch in 1..=self.config.epochs {
            self.shuffle(&mut order);

            let mut loss = 0.0f32;
            for &idx in &order {
                let example = &encoded[idx];
                if example.tags.is_empty() {
                    continue;
                }
                loss += self.train_step(&network, &mut optimizer, &example.rows, &example.tags)?;
            }

            tracing::info!(epoch, loss, "epoch complete");
            report.epochs.push(EpochStats { epoch, loss });
        }

        let model = FittedModel::from_parts(vocab, network.snapshot()?)?;
        Ok((model, report))
    }

    /// One gradient update on a single example; returns its loss.
    pub fn train_step(
        &mut self,
        network: &CrfNetwork,
        optimizer: &mut AdamW,
        rows: &[u32],
        tags: &[BioTag],
    ) -> Result<f32> {
        let mask = self.dropout_mask(tags.len() * FEATURES_PER_TOKEN);
        let loss = network.nll(rows, tags, mask.as_deref())?;
        let value = loss.to_scalar::<f32>()?;
        optimizer.backward_step(&loss)?;
        Ok(value)
    }

    /// Fit `corpus` and write the model directory to `output`.
    pub fn train_and_persist(
        &mut self,
        corpus: &[TrainingExample],
        output: impl AsRef<Path>,
    ) -> Result<(FittedModel, TrainingReport)> {
        let (model, report) = self.fit(corpus)?;
        model.save(output)?;
        Ok((model, report))
    }

    /// Inverted dropout: kept features are scaled by `1 / (1 - p)`.
    fn dropout_mask(&mut self, len: usize) -> Option<Vec<f32>> {
        let p = self.config.dropout;
        if p <= 0.0 {
            return None;
        }

        let scale = 1.0 / (1.0 - p);
        Some(
            (0..len)
                .map(|_| if self.rng.rand_float() < p { 0.0 } else { scale })
                .collect(),
        )
    }

    /// Fisher-Yates shuffle driven by the trainer's random source.
    fn shuffle(&mut self, order: &mut [usize]) {
        for i in (1..order.len()).rev() {
            let j = self.rng.rand_range(0..(i as u32 + 1)) as usize;
            order.swap(i, j);
        }
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Train a model for `epochs` with default hyperparameters and persist it.
pub fn train_and_persist(
    corpus: &[TrainingExample],
    epochs: usize,
    output_path: impl AsRef<Path>,
) -> Result<FittedModel> {
    let mut trainer = Trainer::new(TrainerConfig::new().with_epochs(epochs));
    let (model, _) = trainer.train_and_persist(corpus, output_path)?;
    Ok(model)
}

/// Options for [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainingJob {
    /// Corpus file; the built-in seed corpus when `None`
    pub corpus: Option<PathBuf>,
    pub output: PathBuf,
    pub config: TrainerConfig,
    /// Sentence tagged with the reloaded model after saving
    pub probe: Option<String>,
}

/// Train, persist, then reload the saved model and tag the probe sentence.
pub fn run_training(job: &TrainingJob) -> anyhow::Result<TrainingReport> {
    let corpus = match &job.corpus {
        Some(path) => load_corpus(path)?,
        None => seed_corpus(),
    };
    if corpus.is_empty() {
        anyhow::bail!("training corpus is empty");
    }

    let mut trainer = Trainer::new(job.config.clone());
    let (_, report) = trainer.train_and_persist(&corpus, &job.output)?;
    tracing::info!(path = %job.output.display(), "model saved");

    if let Some(probe) = &job.probe {
        let model = FittedModel::load(&job.output)?;
        let extractor = SkillExtractor::from_parts(model, SkillFilter::default());
        for entity in extractor.entities(probe) {
            tracing::info!(text = %entity.text, label = %entity.label, "probe entity");
        }
        let skills = extractor.extract_skills(probe);
        tracing::info!(probe = %probe, ?skills, "probe skills");
    }

    Ok(report)
}
