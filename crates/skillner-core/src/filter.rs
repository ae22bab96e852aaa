//! # Skill Filter
//!
//! Precision-oriented post-processing of raw tagger output. Candidates are
//! trimmed, then dropped if they are resume boilerplate (exact, case-sensitive
//! match against an [`IgnoreSet`]) or look like contact details.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::tagger::bio_tags::{Entity, EntityLabel};

/// The final, deduplicated skill names for one document.
pub type SkillSet = BTreeSet<String>;

/// Resume boilerplate that the tagger tends to pick up.
pub const DEFAULT_IGNORE_WORDS: &[&str] = &[
    "John",
    "Doe",
    "Jane",
    "Smith",
    "Email",
    "Phone",
    "Address",
    "Senior",
    "Junior",
    "Software",
    "Engineer",
    "Developer",
    "Manager",
    "Experience",
    "Education",
    "Summary",
    "Skills",
    "University",
    "College",
    "Tech",
    "Corp",
    "Languages",
    "Databases",
    "Cloud",
    "Science",
];

/// Substrings that mark a candidate as an e-mail address or URL.
pub const CONTACT_MARKERS: &[&str] = &["@", ".com"];

/// Words never reported as skills. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    words: HashSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a newline-delimited word list; blank lines and `#` comments are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        ))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Why a candidate was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Ignored,
    ContactInfo,
}

/// Stateless filter turning tagger entities into a [`SkillSet`].
#[derive(Debug, Clone)]
pub struct SkillFilter {
    ignore: IgnoreSet,
}

impl SkillFilter {
    pub fn new(ignore: IgnoreSet) -> Self {
        Self { ignore }
    }

    pub fn ignore_set(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Decide a single candidate. `text` must already be trimmed.
    ///
    /// Rules apply in order and the first match wins.
    pub fn verdict(&self, text: &str) -> Verdict {
        if self.ignore.contains(text) {
            Verdict::Ignored
        } else if CONTACT_MARKERS.iter().any(|marker| text.contains(marker)) {
            Verdict::ContactInfo
        } else {
            Verdict::Keep
        }
    }

    /// Keep the SKILL entities that pass every rule, deduplicated by trimmed text.
    pub fn apply<'a, I>(&self, entities: I) -> SkillSet
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        entities
            .into_iter()
            .filter(|entity| entity.label == EntityLabel::Skill)
            .map(|entity| entity.text.trim())
            .filter(|text| {
                let verdict = self.verdict(text);
                if verdict != Verdict::Keep {
                    tracing::debug!(candidate = %text, ?verdict, "dropped skill candidate");
                }
                verdict == Verdict::Keep
            })
            .map(str::to_string)
            .collect()
    }
}

impl Default for SkillFilter {
    fn default() -> Self {
        Self::new(IgnoreSet::new(DEFAULT_IGNORE_WORDS.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(text: &str) -> Entity {
        Entity {
            text: text.to_string(),
            label: EntityLabel::Skill,
            start: 0,
            end: text.chars().count(),
        }
    }

    fn run(filter: &SkillFilter, texts: &[&str]) -> SkillSet {
        let entities: Vec<Entity> = texts.iter().map(|t| skill(t)).collect();
        filter.apply(&entities)
    }

    #[test]
    fn test_ignore_match_is_case_sensitive() {
        let filter = SkillFilter::new(IgnoreSet::new(["Python"]));
        let skills = run(&filter, &["Python", "PYTHON", "python"]);

        assert!(!skills.contains("Python"));
        assert!(skills.contains("PYTHON"));
        assert!(skills.contains("python"));
    }

    #[test]
    fn test_ignore_is_exact_not_substring() {
        let filter = SkillFilter::new(IgnoreSet::new(["Software"]));
        let skills = run(&filter, &["Software", "Software Engineering"]);

        assert_eq!(skills, SkillSet::from(["Software Engineering".to_string()]));
    }

    #[test]
    fn test_contact_info_is_dropped() {
        let filter = SkillFilter::new(IgnoreSet::default());
        let skills = run(&filter, &["user@example.com", "github.com/me", "@handle", "AWS"]);

        assert_eq!(skills, SkillSet::from(["AWS".to_string()]));
        assert_eq!(filter.verdict("user@example.com"), Verdict::ContactInfo);
    }

    #[test]
    fn test_ignore_rule_wins_over_contact_rule() {
        let filter = SkillFilter::new(IgnoreSet::new(["me@corp.com"]));
        assert_eq!(filter.verdict("me@corp.com"), Verdict::Ignored);
    }

    #[test]
    fn test_candidates_are_trimmed_and_deduplicated() {
        let filter = SkillFilter::new(IgnoreSet::new(["Docker"]));
        let skills = run(&filter, &[" Java ", "Java", "\tJava\n", " Docker "]);

        assert_eq!(skills, SkillSet::from(["Java".to_string()]));
    }

    #[test]
    fn test_no_candidates_yield_empty_set() {
        let filter = SkillFilter::default();
        assert!(filter.apply(&Vec::<Entity>::new()).is_empty());
    }

    #[test]
    fn test_default_ignore_list() {
        let filter = SkillFilter::default();
        assert_eq!(filter.ignore_set().len(), DEFAULT_IGNORE_WORDS.len());
        assert_eq!(filter.verdict("Engineer"), Verdict::Ignored);
        assert_eq!(filter.verdict("Kubernetes"), Verdict::Keep);
    }

    #[test]
    fn test_load_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignore.txt");
        fs::write(&path, "# boilerplate\nSenior\n\n  Intern  \n").unwrap();

        let ignore = IgnoreSet::load(&path).unwrap();
        assert_eq!(ignore.len(), 2);
        assert!(ignore.contains("Intern"));
        assert!(!ignore.contains("# boilerplate"));
    }
}
