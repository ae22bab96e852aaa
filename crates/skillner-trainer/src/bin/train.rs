use std::path::PathBuf;

use clap::Parser;
use skillner_trainer::{TrainerConfig, TrainingJob, run_training};

/// Train the skill tagger and save it as a model directory.
#[derive(Parser)]
#[command(name = "train")]
#[command(version)]
struct Cli {
    /// Corpus file (JSON Lines or JSON array); defaults to the built-in seed corpus
    #[arg(short, long)]
    corpus: Option<PathBuf>,

    /// Output model directory
    #[arg(short, long, env = "SKILLNER_MODEL", default_value = "output/model-best")]
    output: PathBuf,

    /// Passes over the corpus
    #[arg(short, long, default_value_t = 20)]
    epochs: usize,

    /// Feature dropout rate
    #[arg(short, long, default_value_t = 0.5)]
    dropout: f32,

    /// Optimizer learning rate
    #[arg(short, long, default_value_t = 0.05)]
    learning_rate: f64,

    /// Seed for shuffling and dropout
    #[arg(short, long, env = "SKILLNER_SEED")]
    seed: Option<u64>,

    /// Sentence to tag with the saved model once training finishes
    #[arg(
        short,
        long,
        default_value = "I am looking for a job in Kubernetes and Golang."
    )]
    probe: String,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = TrainerConfig::new()
        .with_epochs(cli.epochs)
        .with_dropout(cli.dropout)
        .with_learning_rate(cli.learning_rate);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let job = TrainingJob {
        corpus: cli.corpus,
        output: cli.output,
        config,
        probe: Some(cli.probe).filter(|p| !p.trim().is_empty()),
    };

    if let Err(e) = run_training(&job) {
        eprintln!("Training failed: {e:#}");
        std::process::exit(1);
    }
}
