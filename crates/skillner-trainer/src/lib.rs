//! # Skillner Trainer
//!
//! Offline training for the skill tagger: corpus loading, the built-in seed
//! corpus, and the epoch loop that fits and persists a [`FittedModel`].
//!
//! [`FittedModel`]: skillner_core::FittedModel

pub mod data;
pub mod trainer;

pub use data::{load_corpus, parse_corpus, seed_corpus};
pub use trainer::{
    EpochStats, Trainer, TrainerConfig, TrainingJob, TrainingReport, run_training,
    train_and_persist,
};
