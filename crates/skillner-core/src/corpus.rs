//! Training-corpus schema: texts with labeled character spans.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillnerError, TrainingDataError};
use crate::tagger::bio_tags::{BioTag, EntityLabel};
use crate::tagger::tokenizer::Token;

/// A labeled character span `[start, end)`.
///
/// Serialized as a `[start, end, "LABEL"]` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct SpanAnnotation {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl SpanAnnotation {
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}

impl From<(usize, usize, String)> for SpanAnnotation {
    fn from((start, end, label): (usize, usize, String)) -> Self {
        Self { start, end, label }
    }
}

impl From<SpanAnnotation> for (usize, usize, String) {
    fn from(span: SpanAnnotation) -> Self {
        (span.start, span.end, span.label)
    }
}

/// One annotated sentence of the training corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<SpanAnnotation>,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, entities: Vec<SpanAnnotation>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }

    /// Check offsets, labels and overlaps; returns the parsed labels in span order.
    pub fn validate(&self) -> std::result::Result<Vec<EntityLabel>, TrainingDataError> {
        let len = self.text.chars().count();
        let mut labels = Vec::with_capacity(self.entities.len());

        for span in &self.entities {
            if span.start >= span.end {
                return Err(TrainingDataError::InvalidSpan {
                    start: span.start,
                    end: span.end,
                });
            }
            if span.end > len {
                return Err(TrainingDataError::OutOfBounds {
                    start: span.start,
                    end: span.end,
                    len,
                });
            }
            labels.push(span.label.parse::<EntityLabel>()?);
        }

        let mut sorted: Vec<&SpanAnnotation> = self.entities.iter().collect();
        sorted.sort_by_key(|span| (span.start, span.end));
        for pair in sorted.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(TrainingDataError::Overlapping {
                    first: (pair[0].start, pair[0].end),
                    second: (pair[1].start, pair[1].end),
                });
            }
        }

        Ok(labels)
    }

    /// Project the spans onto `tokens` as one BIO tag per token.
    ///
    /// Fails when a span starts or ends inside a token.
    pub fn bio_tags(&self, tokens: &[Token]) -> std::result::Result<Vec<BioTag>, TrainingDataError> {
        let labels = self.validate()?;
        let mut tags = vec![BioTag::Outside; tokens.len()];

        for (span, label) in self.entities.iter().zip(labels) {
            let covered: Vec<usize> = tokens
                .iter()
                .filter(|t| t.start >= span.start && t.end <= span.end)
                .map(|t| t.index)
                .collect();

            let aligned = match (covered.first(), covered.last()) {
                (Some(&first), Some(&last)) => {
                    tokens[first].start == span.start && tokens[last].end == span.end
                }
                _ => false,
            };
            if !aligned {
                return Err(TrainingDataError::Misaligned {
                    start: span.start,
                    end: span.end,
                });
            }

            tags[covered[0]] = BioTag::begin(label);
            for &idx in &covered[1..] {
                tags[idx] = BioTag::inside(label);
            }
        }

        Ok(tags)
    }
}

/// Validate every example, failing on the first bad one.
pub fn validate_corpus(corpus: &[TrainingExample]) -> Result<()> {
    for (index, example) in corpus.iter().enumerate() {
        example
            .validate()
            .map_err(|source| SkillnerError::TrainingData { index, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::tokenizer::Tokenizer;

    fn example(text: &str, spans: &[(usize, usize)]) -> TrainingExample {
        TrainingExample::new(
            text,
            spans
                .iter()
                .map(|&(s, e)| SpanAnnotation::new(s, e, "SKILL"))
                .collect(),
        )
    }

    #[test]
    fn test_bio_tags_for_multi_token_span() {
        let ex = example(
            "Skilled in Machine Learning and TensorFlow.",
            &[(11, 27), (32, 42)],
        );
        let tokens = Tokenizer::new().unwrap().tokenize(&ex.text);
        let tags: Vec<String> = ex
            .bio_tags(&tokens)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            tags,
            ["O", "O", "B-SKILL", "I-SKILL", "O", "B-SKILL", "O"]
        );
    }

    #[test]
    fn test_invalid_spans_are_rejected() {
        let ex = example("Python", &[(3, 3)]);
        assert_eq!(
            ex.validate(),
            Err(TrainingDataError::InvalidSpan { start: 3, end: 3 })
        );

        let ex = example("Python", &[(0, 7)]);
        assert_eq!(
            ex.validate(),
            Err(TrainingDataError::OutOfBounds {
                start: 0,
                end: 7,
                len: 6
            })
        );
    }

    #[test]
    fn test_overlapping_spans_are_rejected() {
        let ex = example("Machine Learning", &[(8, 16), (0, 10)]);
        assert_eq!(
            ex.validate(),
            Err(TrainingDataError::Overlapping {
                first: (0, 10),
                second: (8, 16)
            })
        );
    }

    #[test]
    fn test_adjacent_spans_are_allowed() {
        let ex = example("ab", &[(0, 1), (1, 2)]);
        assert!(ex.validate().is_ok());
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let ex = TrainingExample::new("Rust", vec![SpanAnnotation::new(0, 4, "LANG")]);
        assert_eq!(
            ex.validate(),
            Err(TrainingDataError::UnknownLabel("LANG".into()))
        );
    }

    #[test]
    fn test_misaligned_span_is_rejected() {
        let ex = example("Knowledge of React.js here", &[(13, 18)]);
        let tokens = Tokenizer::new().unwrap().tokenize(&ex.text);
        assert_eq!(
            ex.bio_tags(&tokens),
            Err(TrainingDataError::Misaligned { start: 13, end: 18 })
        );
    }

    #[test]
    fn test_offsets_count_characters() {
        let ex = example("Café Rust", &[(5, 9)]);
        assert!(ex.validate().is_ok());
        let tokens = Tokenizer::new().unwrap().tokenize(&ex.text);
        assert_eq!(
            ex.bio_tags(&tokens).unwrap(),
            vec![BioTag::Outside, BioTag::BeginSkill]
        );
    }

    #[test]
    fn test_validate_corpus_reports_index() {
        let corpus = vec![example("Python", &[(0, 6)]), example("Java", &[(2, 1)])];
        let err = validate_corpus(&corpus).unwrap_err();
        assert!(matches!(err, SkillnerError::TrainingData { index: 1, .. }));
    }

    #[test]
    fn test_json_triple_format() {
        let ex: TrainingExample = serde_json::from_str(
            r#"{"text": "Proficient in AWS", "entities": [[14, 17, "SKILL"]]}"#,
        )
        .unwrap();
        assert_eq!(ex.entities, vec![SpanAnnotation::new(14, 17, "SKILL")]);

        let json = serde_json::to_string(&ex).unwrap();
        assert!(json.contains("[14,17,\"SKILL\"]"));
    }
}
