//! # Skillner
//!
//! Trainable skill extraction for free-text resumes.
//!
//! A linear-chain CRF tags `SKILL` spans; a deterministic filter then drops
//! boilerplate words and contact fragments and collects the survivors into a
//! [`SkillSet`].
//!
//! ```no_run
//! use skillner::{ExtractorConfig, SkillExtractor, seed_corpus, train_and_persist};
//!
//! train_and_persist(&seed_corpus(), 20, "output/model-best")?;
//!
//! let extractor = SkillExtractor::new(ExtractorConfig::new())?;
//! let skills = extractor.extract_skills("I have 3 years of experience in Python and Java.");
//! println!("{skills:?}");
//! # Ok::<(), skillner::SkillnerError>(())
//! ```

pub use skillner_core::*;
pub use skillner_trainer::{
    EpochStats, Trainer, TrainerConfig, TrainingJob, TrainingReport, load_corpus, parse_corpus,
    run_training, seed_corpus, train_and_persist,
};

/// Training modules, for callers that want the loop pieces directly.
pub mod training {
    pub use skillner_trainer::{data, trainer};
}
