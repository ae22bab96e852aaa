//! Corpus loading for span-annotated training data.

use std::fs;
use std::path::Path;

use skillner_core::{SpanAnnotation, TrainingExample};

/// Load a corpus file.
///
/// Accepts either a JSON array of examples or JSON Lines (one example per
/// line, blank lines and `#` comments skipped). Each example looks like
/// `{"text": "...", "entities": [[start, end, "SKILL"], ...]}`.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<TrainingExample>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    parse_corpus(&content).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}

/// Parse corpus text in either supported layout.
pub fn parse_corpus(content: &str) -> anyhow::Result<Vec<TrainingExample>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    let mut examples = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let example: TrainingExample = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("line {}: {e}", lineno + 1))?;
        examples.push(example);
    }

    Ok(examples)
}

/// The built-in seed corpus: short resume sentences with every skill marked.
pub fn seed_corpus() -> Vec<TrainingExample> {
    let skill = |start, end| SpanAnnotation::new(start, end, "SKILL");

    vec![
        TrainingExample::new(
            "I have 3 years of experience in Python and Java.",
            vec![skill(32, 38), skill(43, 47)],
        ),
        TrainingExample::new(
            "Proficient in AWS and Docker containers.",
            vec![skill(14, 17), skill(22, 28)],
        ),
        TrainingExample::new(
            "Developed a REST API using Flask and PostgreSQL.",
            vec![skill(27, 32), skill(37, 47)],
        ),
        TrainingExample::new(
            "Knowledge of React.js for frontend development.",
            vec![skill(13, 21)],
        ),
        TrainingExample::new(
            "Experience with CI/CD pipelines and Jenkins.",
            vec![skill(36, 43)],
        ),
        TrainingExample::new(
            "Skilled in Machine Learning and TensorFlow.",
            vec![skill(11, 27), skill(32, 42)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_corpus_is_valid() {
        let corpus = seed_corpus();
        assert_eq!(corpus.len(), 6);
        skillner_core::validate_corpus(&corpus).unwrap();

        assert_eq!(span_texts(&corpus[0]), ["Python", "Java"]);
    }

    fn span_texts(example: &TrainingExample) -> Vec<String> {
        example
            .entities
            .iter()
            .map(|s| example.text.chars().skip(s.start).take(s.end - s.start).collect())
            .collect()
    }

    #[test]
    fn test_offsets_count_characters() {
        let content = r#"{"text": "Café résumé: Rust", "entities": [[13, 17, "SKILL"]]}"#;
        let corpus = parse_corpus(content).unwrap();

        skillner_core::validate_corpus(&corpus).unwrap();
        assert_eq!(span_texts(&corpus[0]), ["Rust"]);
    }

    #[test]
    fn test_parse_jsonl() {
        let content = r#"
# comment
{"text": "Proficient in AWS", "entities": [[14, 17, "SKILL"]]}

{"text": "Nothing here"}
"#;
        let corpus = parse_corpus(content).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].entities[0], SpanAnnotation::new(14, 17, "SKILL"));
        assert!(corpus[1].entities.is_empty());
    }

    #[test]
    fn test_parse_json_array() {
        let content = r#"[{"text": "Rust", "entities": [[0, 4, "SKILL"]]}]"#;
        let corpus = parse_corpus(content).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_parse_error_names_line() {
        let content = "{\"text\": \"ok\"}\n{broken\n";
        let err = parse_corpus(content).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_load_corpus_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let lines: Vec<String> = seed_corpus()
            .iter()
            .map(|ex| serde_json::to_string(ex).unwrap())
            .collect();
        fs::write(&path, lines.join("\n")).unwrap();

        assert_eq!(load_corpus(&path).unwrap(), seed_corpus());
    }
}
