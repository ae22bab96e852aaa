//! Skill Extraction CLI
//!
//! Reads resume text from a file or stdin and prints the skill report as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use skillner_core::{
    DEFAULT_MODEL_PATH, ExtractorConfig, IgnoreSet, MissingModelPolicy, SkillExtractor,
};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;

/// CLI arguments
#[derive(Parser)]
#[command(name = "skill-extract")]
#[command(about = "Extract professional skills from resume text")]
#[command(version)]
struct Cli {
    /// Text file to analyze (reads stdin when omitted)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Model directory
    #[arg(short, long, env = "SKILLNER_MODEL", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Newline-delimited ignore list replacing the built-in one
    #[arg(short, long, env = "SKILLNER_IGNORE_FILE")]
    ignore_file: Option<PathBuf>,

    /// Run with an untrained model (no skills) when the model is missing
    #[arg(long)]
    allow_untrained: bool,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn build_extractor(cli: &Cli) -> Result<SkillExtractor> {
    let policy = if cli.allow_untrained {
        MissingModelPolicy::Untrained
    } else {
        MissingModelPolicy::Fail
    };

    let mut config = ExtractorConfig::new()
        .with_model_path(&cli.model)
        .with_missing_model(policy);
    if let Some(path) = &cli.ignore_file {
        let ignore = IgnoreSet::load(path)
            .with_context(|| format!("Failed to load ignore list {}", path.display()))?;
        info!(words = ignore.len(), "Loaded ignore list");
        config = config.with_ignore(ignore);
    }

    SkillExtractor::new(config)
        .with_context(|| format!("Failed to load model from {}", cli.model.display()))
}

fn run(cli: &Cli) -> Result<()> {
    let extractor = build_extractor(cli)?;
    let text = read_input(cli.file.as_ref())?;

    let report = extractor.analyze(&text);
    info!(total = report.total_skills, "Extraction complete");

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
