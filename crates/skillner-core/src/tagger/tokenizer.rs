//! # Tokenizer for Skill Tagging
//!
//! Splits resume text into word tokens for sequence labeling. Opening and
//! closing punctuation is peeled off each whitespace chunk so that
//! `"Java."` and `"(AWS)"` yield the bare skill token, while internal
//! punctuation (`React.js`, `CI/CD`, `C++`) stays inside the token.

use regex::Regex;

use crate::error::Result;

/// A token extracted from input text with positional information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text, exactly as it appears in the input
    pub text: String,
    /// Start position in characters
    pub start: usize,
    /// End position in characters (exclusive)
    pub end: usize,
    /// Start position in bytes
    pub byte_start: usize,
    /// End position in bytes (exclusive)
    pub byte_end: usize,
    /// Token index in the sequence
    pub index: usize,
}

/// Characters split off the front of a chunk.
const PREFIXES: &[char] = &['(', '[', '{', '"', '\'', '<'];

/// Characters split off the back of a chunk.
const SUFFIXES: &[char] = &[')', ']', '}', '"', '\'', ',', ';', ':', '!', '?', '.'];

/// Whitespace/punctuation tokenizer for resume text.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    re_chunk: Regex,
}

impl Tokenizer {
    /// Create a new tokenizer instance.
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_chunk: Regex::new(r"\S+")?,
        })
    }

    /// Tokenize text into a sequence of tokens.
    ///
    /// # Examples
    /// ```
    /// use skillner_core::tagger::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new().unwrap();
    /// let tokens = tokenizer.tokenize("Proficient in AWS and Docker.");
    /// let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
    /// assert_eq!(texts, ["Proficient", "in", "AWS", "and", "Docker", "."]);
    /// ```
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut last_byte = 0;
        let mut last_char = 0;

        for chunk in self.re_chunk.find_iter(input) {
            last_char += input[last_byte..chunk.start()].chars().count();
            last_byte = chunk.start();

            let chars: Vec<(usize, char)> = chunk.as_str().char_indices().collect();
            let mut lo = 0;
            let mut hi = chars.len();

            while hi - lo > 1 && PREFIXES.contains(&chars[lo].1) {
                lo += 1;
            }
            let mut suffix_count = 0;
            while hi - lo > 1 && SUFFIXES.contains(&chars[hi - 1].1) {
                hi -= 1;
                suffix_count += 1;
            }

            let byte_at = |i: usize| {
                chunk.start()
                    + chars
                        .get(i)
                        .map(|(b, _)| *b)
                        .unwrap_or(chunk.as_str().len())
            };

            for i in 0..lo {
                self.push(&mut tokens, input, last_char + i, byte_at(i), byte_at(i + 1), 1);
            }
            self.push(&mut tokens, input, last_char + lo, byte_at(lo), byte_at(hi), hi - lo);
            for i in hi..hi + suffix_count {
                self.push(&mut tokens, input, last_char + i, byte_at(i), byte_at(i + 1), 1);
            }

            last_char += chars.len();
            last_byte = chunk.end();
        }

        tokens
    }

    fn push(
        &self,
        tokens: &mut Vec<Token>,
        input: &str,
        start: usize,
        byte_start: usize,
        byte_end: usize,
        char_len: usize,
    ) {
        let index = tokens.len();
        tokens.push(Token {
            text: input[byte_start..byte_end].to_string(),
            start,
            end: start + char_len,
            byte_start,
            byte_end,
            index,
        });
    }
}
